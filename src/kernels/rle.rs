//! This module contains the pure, stateless kernels for Run-Length Encoding
//! (RLE) of text.
//!
//! It is highly effective for text with long runs of an identical character.
//! The package body is a sequence of `<symbol><count>|` pairs, one per maximal
//! run, and the metadata is the bit width of the largest run count. That width
//! is what the size accounting charges per run, on top of 8 bits per symbol.

use crate::bridge::format::{Algorithm, Package};
use crate::error::SqueezeError;
use crate::utils::bit_length;

/// Terminates every `(symbol, count)` pair in the package body.
pub const PAIR_DELIMITER: char = '|';
/// Largest number of characters a package may decode to.
pub const MAX_DECODED_CHARS: u64 = 1 << 30;

/// One maximal run of an identical symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub symbol: char,
    pub count: u64,
}

//==================================================================================
// 1. Core Logic
//==================================================================================

/// Groups `text` into maximal runs, left to right.
pub fn runs(text: &str) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for symbol in text.chars() {
        match runs.last_mut() {
            Some(run) if run.symbol == symbol => run.count += 1,
            _ => runs.push(Run { symbol, count: 1 }),
        }
    }
    runs
}

/// Parses a package body back into runs.
///
/// The first character of every pair is its symbol (so `|` and digits are valid
/// symbols) and the characters up to the next delimiter are its count. Pairs
/// whose count is missing or non-numeric are skipped; the number skipped is
/// returned alongside the runs.
pub(crate) fn parse_runs(body: &str) -> (Vec<Run>, usize) {
    let mut runs = Vec::new();
    let mut skipped = 0;
    let mut chars = body.chars();

    while let Some(symbol) = chars.next() {
        let count_str: String = chars
            .by_ref()
            .take_while(|&c| c != PAIR_DELIMITER)
            .collect();

        let is_numeric = !count_str.is_empty() && count_str.bytes().all(|b| b.is_ascii_digit());
        match count_str.parse::<u64>() {
            Ok(count) if is_numeric => runs.push(Run { symbol, count }),
            _ => skipped += 1,
        }
    }
    (runs, skipped)
}

/// Parses the count bit width stored in an RLE package's metadata.
pub(crate) fn parse_count_bits(metadata: &str) -> Result<u32, SqueezeError> {
    metadata.parse::<u32>().map_err(|_| {
        SqueezeError::FormatError(format!("RLE metadata {:?} is not a bit width", metadata))
    })
}

//==================================================================================
// 2. Public API
//==================================================================================

/// Encodes `text` into an RLE package.
pub fn encode(text: &str) -> Result<Package, SqueezeError> {
    if text.is_empty() {
        return Ok(Package::empty(Algorithm::Rle));
    }

    let runs = runs(text);
    let max_count = runs.iter().map(|run| run.count).max().unwrap_or(0);
    let count_bits = bit_length(max_count).max(1);

    let mut body = String::with_capacity(runs.len() * 3);
    for run in &runs {
        body.push(run.symbol);
        body.push_str(&run.count.to_string());
        body.push(PAIR_DELIMITER);
    }

    log::debug!(
        "RLE: {} chars -> {} runs, count width {} bits",
        text.chars().count(),
        runs.len(),
        count_bits
    );
    Package::new(Algorithm::Rle, count_bits.to_string(), body)
}

/// Decodes an RLE package back into text.
///
/// Malformed pairs are skipped. Runs that together expand past
/// `MAX_DECODED_CHARS` are a `FormatError`.
pub fn decode(package: &Package) -> Result<String, SqueezeError> {
    if package.algorithm() != Algorithm::Rle {
        return Err(SqueezeError::FormatError(format!(
            "expected an RLE package, got {}",
            package.algorithm()
        )));
    }
    if package.is_empty() {
        return Ok(String::new());
    }
    parse_count_bits(package.metadata())?;

    let (runs, skipped) = parse_runs(package.body());
    if skipped > 0 {
        log::warn!("RLE: skipped {} malformed pair(s) while decoding", skipped);
    }

    let total = runs
        .iter()
        .try_fold(0u64, |acc, run| acc.checked_add(run.count))
        .filter(|&total| total <= MAX_DECODED_CHARS)
        .ok_or_else(|| {
            SqueezeError::FormatError(format!(
                "RLE runs expand to more than {} characters",
                MAX_DECODED_CHARS
            ))
        })?;
    let mut output = String::with_capacity(total as usize);
    for run in runs {
        output.extend(std::iter::repeat(run.symbol).take(run.count as usize));
    }
    Ok(output)
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
