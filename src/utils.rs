//! Shared, low-level helpers for the textual bitstreams used by the codecs.
//!
//! Every lossless codec stores its payload one character per bit, so the
//! kernels need the same handful of conversions between integers and
//! `'0'`/`'1'` strings. They live here so the codecs agree on bit order
//! (most significant bit first) and on how invalid characters are reported.

use crate::error::SqueezeError;

/// Number of bits needed to represent `value` (0 for 0).
pub fn bit_length(value: u64) -> u32 {
    u64::BITS - value.leading_zeros()
}

/// `ceil(log2(value))` for `value >= 1`.
pub fn ceil_log2(value: u64) -> u32 {
    if value <= 1 {
        0
    } else {
        bit_length(value - 1)
    }
}

/// Appends the lowest `width` bits of `value` to `out`, most significant bit first.
pub fn push_bits(out: &mut String, value: u64, width: u32) {
    for shift in (0..width).rev() {
        out.push(if (value >> shift) & 1 == 1 { '1' } else { '0' });
    }
}

/// Reads `bits` (a run of `'0'`/`'1'` bytes) as an unsigned integer.
pub fn read_bits(bits: &[u8]) -> Result<u64, SqueezeError> {
    if bits.len() > u64::BITS as usize {
        return Err(SqueezeError::FormatError(format!(
            "bit field of width {} does not fit in 64 bits",
            bits.len()
        )));
    }
    bits.iter().try_fold(0u64, |acc, &bit| match bit {
        b'0' => Ok(acc << 1),
        b'1' => Ok((acc << 1) | 1),
        other => Err(SqueezeError::FormatError(format!(
            "invalid bit character {:?}",
            other as char
        ))),
    })
}

/// Returns `true` if `s` only contains `'0'` and `'1'`.
pub fn is_bit_string(s: &str) -> bool {
    s.bytes().all(|b| b == b'0' || b == b'1')
}
