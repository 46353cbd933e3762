// In: src/bridge/sizing.rs

//! Size accounting for packages.
//!
//! A package stores its body one character per bit (or per decimal field), which
//! says nothing about how large the encoding really is. This module computes
//! the size the package would occupy with its body bit-packed: the textual
//! header (`ALGO::::METADATA::::`) counted byte for byte, plus the body bits
//! rounded up to whole bytes.
//!
//! | Algorithm | Body bits                    |
//! |-----------|------------------------------|
//! | RLE       | `(8 + count_bits)` per run   |
//! | LZW       | `bit_width` per code         |
//! | Huffman   | one per body character       |
//! | Golomb    | one per body character       |
//!
//! `pack_body` produces those packed bytes for real, using `bitvec`.

use bitvec::prelude::*;

use crate::bridge::format::{Algorithm, Package, SEPARATOR};
use crate::error::SqueezeError;
use crate::kernels::{lzw, rle};

/// Bits charged for each RLE symbol.
pub const RLE_SYMBOL_BITS: u64 = 8;
/// Widest RLE count field `pack_body` will write.
pub const MAX_RLE_COUNT_BITS: u64 = 64;
/// Widest LZW code field `pack_body` will write.
pub const MAX_LZW_BIT_WIDTH: u64 = 32;

//==================================================================================
// 1. Accounting
//==================================================================================

/// Size in bytes of `ALGO::::METADATA::::` as UTF-8.
pub fn header_size(package: &Package) -> usize {
    package.algorithm().tag().len() + SEPARATOR.len() * 2 + package.metadata().len()
}

/// Number of bits the packed body occupies.
pub fn body_bits(package: &Package) -> Result<u64, SqueezeError> {
    let body = package.body();
    match package.algorithm() {
        Algorithm::Rle => {
            let count_bits = rle::parse_count_bits(package.metadata())? as u64;
            let (runs, _) = rle::parse_runs(body);
            Ok(runs.len() as u64 * (RLE_SYMBOL_BITS + count_bits))
        }
        Algorithm::Lzw => {
            let bit_width = lzw::parse_bit_width(package.metadata())? as u64;
            let codes = body
                .split(lzw::CODE_DELIMITER)
                .filter(|field| !field.is_empty())
                .count();
            Ok(codes as u64 * bit_width)
        }
        Algorithm::Huffman | Algorithm::Golomb => Ok(body.chars().count() as u64),
    }
}

/// The bit-packed size of `package` in bytes, or 0 if it cannot be accounted.
///
/// The package for empty input has size 0.
pub fn theoretical_size(package: &Package) -> usize {
    if package.is_empty() {
        return 0;
    }
    match body_bits(package) {
        Ok(bits) => header_size(package) + bits.div_ceil(8) as usize,
        Err(e) => {
            log::warn!("size accounting failed for {} package: {}", package.algorithm(), e);
            0
        }
    }
}

/// `theoretical_size` of a serialized package; 0 if it does not parse.
pub fn theoretical_size_str(serialized: &str) -> usize {
    if serialized.is_empty() {
        return 0;
    }
    Package::parse(serialized)
        .map(|package| theoretical_size(&package))
        .unwrap_or(0)
}

/// `original_bytes / theoretical_size`, or 0.0 when the size is 0.
pub fn compression_ratio(original_bytes: usize, package: &Package) -> f64 {
    match theoretical_size(package) {
        0 => 0.0,
        size => original_bytes as f64 / size as f64,
    }
}

//==================================================================================
// 2. Packing
//==================================================================================

fn check_width(width: u64, max: u64, algorithm: Algorithm) -> Result<u64, SqueezeError> {
    if width > max {
        return Err(SqueezeError::FormatError(format!(
            "{} field width {} exceeds {} bits",
            algorithm, width, max
        )));
    }
    Ok(width)
}

fn push_field(bits: &mut BitVec<u8, Msb0>, value: u64, width: u64) -> Result<(), SqueezeError> {
    if width < 64 && value >> width != 0 {
        return Err(SqueezeError::InvalidParameter(format!(
            "value {} does not fit in {} bits",
            value, width
        )));
    }
    for shift in (0..width).rev() {
        bits.push(shift < 64 && (value >> shift) & 1 == 1);
    }
    Ok(())
}

/// Packs the body of `package` into bytes, most significant bit first.
///
/// The result is `ceil(body_bits / 8)` bytes long. RLE symbols must fit in a
/// byte and LZW fields must be codes. Count widths above 64 bits and code
/// widths above 32 bits are rejected before anything is packed.
pub fn pack_body(package: &Package) -> Result<Vec<u8>, SqueezeError> {
    let mut bits: BitVec<u8, Msb0> = BitVec::new();
    let body = package.body();

    match package.algorithm() {
        Algorithm::Rle => {
            let count_bits = rle::parse_count_bits(package.metadata())? as u64;
            let count_bits = check_width(count_bits, MAX_RLE_COUNT_BITS, Algorithm::Rle)?;
            let (runs, _) = rle::parse_runs(body);
            for run in runs {
                push_field(&mut bits, run.symbol as u64, RLE_SYMBOL_BITS)?;
                push_field(&mut bits, run.count, count_bits)?;
            }
        }
        Algorithm::Lzw => {
            let bit_width = lzw::parse_bit_width(package.metadata())? as u64;
            let bit_width = check_width(bit_width, MAX_LZW_BIT_WIDTH, Algorithm::Lzw)?;
            let codes = lzw::parse_codes(body).ok_or_else(|| {
                SqueezeError::LzwError("body contains a field that is not a code".to_string())
            })?;
            for code in codes {
                push_field(&mut bits, code as u64, bit_width)?;
            }
        }
        Algorithm::Huffman | Algorithm::Golomb => {
            for c in body.chars() {
                match c {
                    '0' => bits.push(false),
                    '1' => bits.push(true),
                    other => {
                        return Err(SqueezeError::FormatError(format!(
                            "body contains non-bit character {:?}",
                            other
                        )))
                    }
                }
            }
        }
    }
    Ok(bits.into_vec())
}
