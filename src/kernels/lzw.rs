//! This module contains the kernel for LZW dictionary coding.
//!
//! The coder works on the UTF-8 bytes of the input, so any Unicode text
//! roundtrips. The dictionary starts with the 256 single-byte strings and grows
//! by one entry per emitted code; the decoder rebuilds the same dictionary from
//! the code stream alone, so it is never transmitted.
//!
//! The package body is the `|`-separated list of decimal codes and the metadata
//! is the bit width of the final code space (at least 8), which is what the
//! size accounting charges per code.

use hashbrown::HashMap;

use crate::bridge::format::{Algorithm, Package};
use crate::error::SqueezeError;
use crate::utils::bit_length;

/// Separates codes in the package body.
pub const CODE_DELIMITER: char = '|';
/// Number of single-byte entries the dictionary starts with.
pub const INITIAL_DICT_SIZE: u32 = 256;
/// Smallest bit width ever recorded in the metadata.
pub const MIN_BIT_WIDTH: u32 = 8;

//==================================================================================
// 1. Core Logic
//==================================================================================

/// Compresses `input` into LZW codes.
///
/// Returns the emitted codes and the next code that would have been assigned.
pub fn encode_codes(input: &[u8]) -> (Vec<u32>, u32) {
    // (prefix code, next byte) -> code of the extended string.
    let mut dictionary: HashMap<(u32, u8), u32> = HashMap::new();
    let mut next_code = INITIAL_DICT_SIZE;
    let mut codes = Vec::new();
    let mut current: Option<u32> = None;

    for &byte in input {
        current = match current {
            None => Some(byte as u32),
            Some(prefix) => match dictionary.get(&(prefix, byte)) {
                Some(&code) => Some(code),
                None => {
                    codes.push(prefix);
                    dictionary.insert((prefix, byte), next_code);
                    next_code += 1;
                    Some(byte as u32)
                }
            },
        };
    }
    if let Some(prefix) = current {
        codes.push(prefix);
    }
    (codes, next_code)
}

/// Expands LZW codes back into bytes.
///
/// Returns `None` when a code refers to an entry that cannot exist yet.
pub fn decode_codes(codes: &[u32]) -> Option<Vec<u8>> {
    let (&first, rest) = codes.split_first()?;
    let mut dictionary: Vec<Vec<u8>> = (0..INITIAL_DICT_SIZE).map(|b| vec![b as u8]).collect();

    let mut previous = dictionary.get(first as usize)?.clone();
    let mut output = previous.clone();

    for &code in rest {
        let entry = match dictionary.get(code as usize) {
            Some(entry) => entry.clone(),
            // The code being defined by this very step.
            None if code as usize == dictionary.len() => {
                let mut entry = previous.clone();
                entry.push(previous[0]);
                entry
            }
            None => return None,
        };
        output.extend_from_slice(&entry);

        let mut new_entry = previous;
        new_entry.push(entry[0]);
        dictionary.push(new_entry);
        previous = entry;
    }
    Some(output)
}

/// Parses a package body into codes. Returns `None` if any field is not a code.
pub(crate) fn parse_codes(body: &str) -> Option<Vec<u32>> {
    body.split(CODE_DELIMITER)
        .filter(|field| !field.is_empty())
        .map(|field| field.parse::<u32>().ok())
        .collect()
}

/// Parses the code bit width stored in an LZW package's metadata.
pub(crate) fn parse_bit_width(metadata: &str) -> Result<u32, SqueezeError> {
    metadata.parse::<u32>().map_err(|_| {
        SqueezeError::FormatError(format!("LZW metadata {:?} is not a bit width", metadata))
    })
}

//==================================================================================
// 2. Public API
//==================================================================================

/// Encodes `text` into an LZW package.
pub fn encode(text: &str) -> Result<Package, SqueezeError> {
    if text.is_empty() {
        return Ok(Package::empty(Algorithm::Lzw));
    }

    let (codes, next_code) = encode_codes(text.as_bytes());
    let bit_width = bit_length(next_code as u64).max(MIN_BIT_WIDTH);
    let body = codes
        .iter()
        .map(|code| code.to_string())
        .collect::<Vec<_>>()
        .join("|");

    log::debug!(
        "LZW: {} bytes -> {} codes, dictionary size {}, {} bits per code",
        text.len(),
        codes.len(),
        next_code,
        bit_width
    );
    Package::new(Algorithm::Lzw, bit_width.to_string(), body)
}

/// Decodes an LZW package back into text.
///
/// A body that is not a valid code stream, or that expands to invalid UTF-8,
/// decodes to an empty string.
pub fn decode(package: &Package) -> Result<String, SqueezeError> {
    if package.algorithm() != Algorithm::Lzw {
        return Err(SqueezeError::FormatError(format!(
            "expected an LZW package, got {}",
            package.algorithm()
        )));
    }
    if package.is_empty() || package.body().is_empty() {
        return Ok(String::new());
    }
    parse_bit_width(package.metadata())?;

    let Some(codes) = parse_codes(package.body()) else {
        log::warn!("LZW: body contains a field that is not a code");
        return Ok(String::new());
    };
    let Some(bytes) = decode_codes(&codes) else {
        log::warn!("LZW: code stream references an undefined dictionary entry");
        return Ok(String::new());
    };
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            log::warn!("LZW: decoded bytes are not valid UTF-8: {}", e);
            Ok(String::new())
        }
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
