//! This module contains the kernel for static Huffman coding of text.
//!
//! A prefix-free code is built per call from the character histogram with the
//! classic greedy min-heap construction, the input is rewritten as a `'0'`/`'1'`
//! bitstream, and the code table travels in the package metadata.
//!
//! ### Metadata Format (`v1`)
//! `v1;<code point>=<code>;<code point>=<code>;...`, where the code point is
//! decimal and the code is a non-empty bit string. Entries are sorted by code
//! point. The format is parsed by hand; it never contains the package separator.

use hashbrown::HashMap;
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};

use crate::bridge::format::{Algorithm, Package};
use crate::error::SqueezeError;
use crate::utils::is_bit_string;

/// Version tag leading every serialized code table.
pub const TABLE_VERSION: &str = "v1";

/// Symbol to code mapping, ordered by symbol.
pub type CodeTable = BTreeMap<char, String>;

//==================================================================================
// 1. Code Construction
//==================================================================================

/// A pending subtree in the construction heap.
struct HeapNode {
    weight: u64,
    /// Insertion order; breaks weight ties so construction is deterministic.
    seq: u64,
    symbols: Vec<char>,
}

impl PartialEq for HeapNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapNode {}

impl PartialOrd for HeapNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapNode {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.weight, self.seq).cmp(&(other.weight, other.seq))
    }
}

/// Builds the prefix-free code table for `text`.
///
/// Leaves enter the heap ordered by `(frequency, symbol)`. On every step the
/// two lightest subtrees are popped; codes in the first get a `0` prefix, codes
/// in the second a `1`. A text with a single distinct symbol maps it to `"0"`.
pub fn build_code_table(text: &str) -> CodeTable {
    let mut frequencies: HashMap<char, u64> = HashMap::new();
    for symbol in text.chars() {
        *frequencies.entry(symbol).or_insert(0) += 1;
    }

    let mut leaves: Vec<(char, u64)> = frequencies.into_iter().collect();
    leaves.sort_by_key(|&(symbol, weight)| (weight, symbol));

    let mut table = CodeTable::new();
    if leaves.len() == 1 {
        table.insert(leaves[0].0, "0".to_string());
        return table;
    }

    let mut heap = BinaryHeap::with_capacity(leaves.len());
    let mut seq = 0u64;
    for (symbol, weight) in leaves {
        table.insert(symbol, String::new());
        heap.push(Reverse(HeapNode {
            weight,
            seq,
            symbols: vec![symbol],
        }));
        seq += 1;
    }

    while heap.len() > 1 {
        let (Some(Reverse(smallest)), Some(Reverse(second))) = (heap.pop(), heap.pop()) else {
            break;
        };
        for symbol in &smallest.symbols {
            if let Some(code) = table.get_mut(symbol) {
                code.insert(0, '0');
            }
        }
        for symbol in &second.symbols {
            if let Some(code) = table.get_mut(symbol) {
                code.insert(0, '1');
            }
        }

        let mut symbols = smallest.symbols;
        symbols.extend(second.symbols);
        heap.push(Reverse(HeapNode {
            weight: smallest.weight + second.weight,
            seq,
            symbols,
        }));
        seq += 1;
    }

    table
}

//==================================================================================
// 2. Table Serialization
//==================================================================================

/// Serializes a code table into the `v1` metadata format.
pub fn serialize_table(table: &CodeTable) -> String {
    let mut out = String::from(TABLE_VERSION);
    for (symbol, code) in table {
        out.push(';');
        out.push_str(&(*symbol as u32).to_string());
        out.push('=');
        out.push_str(code);
    }
    out
}

/// Parses `v1` metadata back into a code table.
pub fn parse_table(metadata: &str) -> Result<CodeTable, SqueezeError> {
    let mut entries = metadata.split(';');
    match entries.next() {
        Some(TABLE_VERSION) => {}
        other => {
            return Err(SqueezeError::HuffmanError(format!(
                "unsupported code table version {:?}",
                other.unwrap_or_default()
            )))
        }
    }

    let mut table = CodeTable::new();
    for entry in entries {
        let (point, code) = entry.split_once('=').ok_or_else(|| {
            SqueezeError::HuffmanError(format!("malformed code table entry {:?}", entry))
        })?;
        let symbol = point
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| {
                SqueezeError::HuffmanError(format!("invalid code point {:?}", point))
            })?;
        if code.is_empty() || !is_bit_string(code) {
            return Err(SqueezeError::HuffmanError(format!(
                "invalid code {:?} for symbol {:?}",
                code, symbol
            )));
        }
        if table.insert(symbol, code.to_string()).is_some() {
            return Err(SqueezeError::HuffmanError(format!(
                "duplicate symbol {:?} in code table",
                symbol
            )));
        }
    }

    if table.is_empty() {
        return Err(SqueezeError::HuffmanError("code table is empty".to_string()));
    }
    Ok(table)
}

//==================================================================================
// 3. Public API
//==================================================================================

/// Encodes `text` into a Huffman package.
pub fn encode(text: &str) -> Result<Package, SqueezeError> {
    if text.is_empty() {
        return Ok(Package::empty(Algorithm::Huffman));
    }

    let table = build_code_table(text);
    let mut body = String::new();
    for symbol in text.chars() {
        let code = table.get(&symbol).ok_or_else(|| {
            SqueezeError::InternalError(format!("no Huffman code for {:?}", symbol))
        })?;
        body.push_str(code);
    }

    log::debug!(
        "Huffman: {} distinct symbols, {} body bits",
        table.len(),
        body.len()
    );
    Package::new(Algorithm::Huffman, serialize_table(&table), body)
}

/// Decodes a Huffman package back into text.
///
/// Bits are accumulated until they match a known code. Trailing bits that never
/// complete a code are dropped with a warning.
///
/// # Errors
/// A code table that is missing, empty, unparseable or assigns one code to two
/// symbols is a `HuffmanError`, as is a body holding anything but `0` and `1`.
/// Decoding never falls back to an empty string.
pub fn decode(package: &Package) -> Result<String, SqueezeError> {
    if package.algorithm() != Algorithm::Huffman {
        return Err(SqueezeError::FormatError(format!(
            "expected a Huffman package, got {}",
            package.algorithm()
        )));
    }
    if package.is_empty() {
        return Ok(String::new());
    }

    let table = parse_table(package.metadata())?;
    let body = package.body();
    if !is_bit_string(body) {
        return Err(SqueezeError::HuffmanError(
            "body contains characters other than '0' and '1'".to_string(),
        ));
    }

    let mut reverse: HashMap<&str, char> = HashMap::with_capacity(table.len());
    for (symbol, code) in &table {
        if reverse.insert(code.as_str(), *symbol).is_some() {
            return Err(SqueezeError::HuffmanError(format!(
                "code {:?} is assigned to more than one symbol",
                code
            )));
        }
    }

    let mut output = String::new();
    let mut start = 0;
    for end in 1..=body.len() {
        if let Some(&symbol) = reverse.get(&body[start..end]) {
            output.push(symbol);
            start = end;
        }
    }
    if start < body.len() {
        log::warn!(
            "Huffman: dropped {} trailing bit(s) that match no code",
            body.len() - start
        );
    }
    Ok(output)
}

//==================================================================================
// 4. Unit Tests
//==================================================================================
