//! This module contains the kernel for Golomb coding of text and numbers.
//!
//! Every input symbol is first mapped to a non-negative integer, then each
//! integer `n` is written with divisor `m` as a unary quotient (`n / m` ones and
//! a terminating zero) followed by the remainder `n % m` in truncated binary.
//!
//! The divisor is not derived in closed form. Because the truncated-binary
//! length is a step function of `m`, the kernel prices every candidate in
//! `[1, max_divisor]` against the value histogram and keeps the cheapest one
//! (the smallest `m` wins a tie). When `ceil(0.69 * mean)` lies above the range
//! it is priced too. Candidates are scored in parallel with `rayon`; the
//! reduction is a plain minimum over `(cost, m)` so the result does not depend
//! on scheduling.
//!
//! ### Metadata Format
//! `<m>$$$<mode>` where mode is `NUM`, `TXT` or `DIG`. Metadata holding only
//! `<m>` is read as `TXT`.

use hashbrown::HashMap;
use rayon::prelude::*;

use crate::bridge::format::{Algorithm, Package, SUB_SEPARATOR};
use crate::config::{GolombConfig, GolombMapping};
use crate::error::SqueezeError;
use crate::utils::{ceil_log2, push_bits, read_bits};

/// Shown in place of a decoded value that is not a valid character.
pub const PLACEHOLDER: char = char::REPLACEMENT_CHARACTER;
/// Largest body the encoder will emit, in bits.
pub const MAX_BODY_BITS: u64 = 1 << 32;

//==================================================================================
// 1. Symbol Mapping
//==================================================================================

/// How the symbols of a package were turned into integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GolombMode {
    /// Space-separated decimal integers, coded as numbers.
    Numeric,
    /// Characters coded by their code point.
    Text,
    /// Digits coded as `0..=9`, other characters as code point + 10.
    DigitShift,
}

impl GolombMode {
    pub fn tag(&self) -> &'static str {
        match self {
            GolombMode::Numeric => "NUM",
            GolombMode::Text => "TXT",
            GolombMode::DigitShift => "DIG",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, SqueezeError> {
        match tag {
            "NUM" => Ok(GolombMode::Numeric),
            "TXT" => Ok(GolombMode::Text),
            "DIG" => Ok(GolombMode::DigitShift),
            other => Err(SqueezeError::FormatError(format!(
                "unknown Golomb mode {:?}",
                other
            ))),
        }
    }
}

/// Decoding parameters carried in a Golomb package's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GolombParams {
    pub m: u64,
    pub mode: GolombMode,
}

impl GolombParams {
    pub fn to_metadata(&self) -> String {
        format!("{}{}{}", self.m, SUB_SEPARATOR, self.mode.tag())
    }

    /// Parses metadata, rejecting a non-positive divisor.
    pub fn from_metadata(metadata: &str) -> Result<Self, SqueezeError> {
        let (m_str, mode) = match metadata.split_once(SUB_SEPARATOR) {
            Some((m_str, tag)) => (m_str, GolombMode::from_tag(tag)?),
            None => (metadata, GolombMode::Text),
        };
        let m = m_str.trim().parse::<i128>().map_err(|_| {
            SqueezeError::FormatError(format!("Golomb divisor {:?} is not an integer", m_str))
        })?;
        if m <= 0 {
            return Err(SqueezeError::GolombError(format!(
                "divisor must be positive, got {}",
                m
            )));
        }
        let m = u64::try_from(m).map_err(|_| {
            SqueezeError::GolombError(format!("divisor {} is out of range", m))
        })?;
        Ok(Self { m, mode })
    }
}

/// Parses `text` as canonical numeric input: decimal tokens without leading
/// zeros joined by single spaces. Anything else returns `None` so the text is
/// coded character by character and still roundtrips exactly.
fn parse_numeric(text: &str) -> Option<Vec<u64>> {
    text.split(' ')
        .map(|token| {
            let canonical = !token.is_empty()
                && token.bytes().all(|b| b.is_ascii_digit())
                && (token == "0" || !token.starts_with('0'));
            if canonical {
                token.parse::<u64>().ok()
            } else {
                None
            }
        })
        .collect()
}

/// Maps `text` to the integers that will be coded.
pub fn map_symbols(text: &str, mapping: GolombMapping) -> (GolombMode, Vec<u64>) {
    match mapping {
        GolombMapping::Auto => match parse_numeric(text) {
            Some(values) => (GolombMode::Numeric, values),
            None => (
                GolombMode::Text,
                text.chars().map(|c| c as u64).collect(),
            ),
        },
        GolombMapping::DigitShift => (
            GolombMode::DigitShift,
            text.chars()
                .map(|c| match c.to_digit(10) {
                    Some(d) if c.is_ascii_digit() => d as u64,
                    _ => c as u64 + 10,
                })
                .collect(),
        ),
    }
}

/// Inverts `map_symbols`. Values with no character become `PLACEHOLDER`.
fn unmap_values(values: &[u64], mode: GolombMode) -> String {
    let mut unmappable = 0usize;
    let mut to_char = |point: Option<u64>| {
        point
            .and_then(|p| u32::try_from(p).ok())
            .and_then(char::from_u32)
            .unwrap_or_else(|| {
                unmappable += 1;
                PLACEHOLDER
            })
    };

    let output = match mode {
        GolombMode::Numeric => values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" "),
        GolombMode::Text => values.iter().map(|&v| to_char(Some(v))).collect(),
        GolombMode::DigitShift => values
            .iter()
            .map(|&v| match v {
                0..=9 => char::from(b'0' + v as u8),
                _ => to_char(v.checked_sub(10)),
            })
            .collect(),
    };

    if unmappable > 0 {
        log::warn!(
            "Golomb: {} decoded value(s) have no character and were replaced by {:?}",
            unmappable,
            PLACEHOLDER
        );
    }
    output
}

//==================================================================================
// 2. Code Construction & Cost Model
//==================================================================================

/// Truncated-binary parameters of divisor `m`: `b = ceil(log2 m)` and
/// `T = 2^b - m`. Worked out in `u128` since `b` reaches 64 for `m > 2^63`.
fn truncation(m: u64) -> (u32, u64) {
    let b = ceil_log2(m);
    let threshold = ((1u128 << b) - m as u128) as u64;
    (b, threshold)
}

/// Length of the truncated-binary remainder `r` for divisor `m`.
fn remainder_len(r: u64, m: u64) -> u64 {
    let (b, threshold) = truncation(m);
    if b == 0 {
        0
    } else if r < threshold {
        (b - 1) as u64
    } else {
        b as u64
    }
}

/// Total length in bits of the Golomb code of `n` with divisor `m`.
///
/// Saturates at `u64::MAX` for codes too long to represent.
pub fn code_length(n: u64, m: u64) -> u64 {
    let q = n / m;
    q.saturating_add(1).saturating_add(remainder_len(n % m, m))
}

/// Appends the Golomb code of `n` with divisor `m` to `out`.
pub fn encode_value(n: u64, m: u64, out: &mut String) {
    let q = n / m;
    let r = n % m;
    out.extend(std::iter::repeat('1').take(q as usize));
    out.push('0');

    let (b, threshold) = truncation(m);
    if b == 0 {
        return;
    }
    if r < threshold {
        push_bits(out, r, b - 1);
    } else {
        push_bits(out, r + threshold, b);
    }
}

/// Total encoded size of a value histogram under divisor `m`.
pub fn total_cost(histogram: &[(u64, u64)], m: u64) -> u64 {
    histogram.iter().fold(0u64, |acc, &(value, count)| {
        acc.saturating_add(code_length(value, m).saturating_mul(count))
    })
}

/// The divisors considered by the search for `values`.
pub fn candidate_divisors(values: &[u64], config: &GolombConfig) -> Vec<u64> {
    let mut candidates: Vec<u64> = (1..=config.max_divisor).collect();
    if !values.is_empty() {
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64;
        let heuristic = (config.heuristic_factor * mean).ceil();
        if heuristic > config.max_divisor as f64 && heuristic < u64::MAX as f64 {
            candidates.push(heuristic as u64);
        }
    }
    candidates
}

/// Builds the `(value, count)` histogram of `values`, sorted by value.
fn histogram(values: &[u64]) -> Vec<(u64, u64)> {
    let mut counts: HashMap<u64, u64> = HashMap::new();
    for &value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut histogram: Vec<(u64, u64)> = counts.into_iter().collect();
    histogram.sort_unstable();
    histogram
}

/// Finds the divisor minimizing the total encoded length of `values`.
///
/// Returns `(m, total_bits)`.
pub fn find_best_divisor(values: &[u64], config: &GolombConfig) -> (u64, u64) {
    let histogram = histogram(values);
    let candidates = candidate_divisors(values, config);

    let (cost, m) = candidates
        .par_iter()
        .map(|&m| (total_cost(&histogram, m), m))
        .min()
        .unwrap_or((0, 1));

    crate::log_metric!(
        "event" = "golomb_divisor_search",
        "distinct_values" = histogram.len(),
        "candidates" = candidates.len(),
        "best_m" = m,
        "total_bits" = cost,
    );
    (m, cost)
}

//==================================================================================
// 3. Decoding Engine
//==================================================================================

/// Reads Golomb codes with divisor `m` from a bit string.
///
/// A code cut short inside its remainder ends decoding; the values read so far
/// are returned.
pub fn decode_values(body: &str, m: u64) -> Result<Vec<u64>, SqueezeError> {
    if m == 0 {
        return Err(SqueezeError::GolombError("divisor must be positive".to_string()));
    }
    let bits = body.as_bytes();
    if let Some(bad) = bits.iter().find(|&&b| b != b'0' && b != b'1') {
        return Err(SqueezeError::GolombError(format!(
            "body contains non-bit character {:?}",
            *bad as char
        )));
    }

    let (b, threshold) = truncation(m);
    let len = bits.len();
    let mut values = Vec::new();
    let mut i = 0;

    while i < len {
        let mut q = 0u64;
        while i < len && bits[i] == b'1' {
            q += 1;
            i += 1;
        }
        if i < len {
            i += 1; // terminating zero
        } else {
            log::warn!("Golomb: body ends inside a unary quotient");
            break;
        }

        let mut r = 0u64;
        if b > 0 {
            let short = (b - 1) as usize;
            if i + short > len {
                log::warn!("Golomb: body ends inside a remainder");
                break;
            }
            let candidate = read_bits(&bits[i..i + short])?;
            i += short;
            if candidate < threshold {
                r = candidate;
            } else if i < len {
                let next_bit = (bits[i] - b'0') as u64;
                i += 1;
                r = ((candidate << 1) | next_bit) - threshold;
            } else {
                log::warn!("Golomb: body ends inside a remainder");
                break;
            }
        }

        values.push(q.saturating_mul(m).saturating_add(r));
    }
    Ok(values)
}

//==================================================================================
// 4. Public API
//==================================================================================

/// Encodes `text` with the default configuration.
pub fn encode(text: &str) -> Result<Package, SqueezeError> {
    encode_with_config(text, &GolombConfig::default())
}

/// Encodes `text` into a Golomb package.
pub fn encode_with_config(text: &str, config: &GolombConfig) -> Result<Package, SqueezeError> {
    if text.is_empty() {
        return Ok(Package::empty(Algorithm::Golomb));
    }
    if config.max_divisor == 0 {
        return Err(SqueezeError::InvalidParameter(
            "max_divisor must be at least 1".to_string(),
        ));
    }

    let (mode, values) = map_symbols(text, config.mapping);
    let (m, total_bits) = find_best_divisor(&values, config);
    if total_bits > MAX_BODY_BITS {
        return Err(SqueezeError::InvalidParameter(format!(
            "cheapest Golomb code (m = {}) needs {} bits, more than the {} allowed",
            m, total_bits, MAX_BODY_BITS
        )));
    }

    let mut body = String::with_capacity(total_bits.min(1 << 24) as usize);
    for &value in &values {
        encode_value(value, m, &mut body);
    }

    log::debug!(
        "Golomb: {} values in {} mode, m = {}, {} body bits",
        values.len(),
        mode.tag(),
        m,
        body.len()
    );
    Package::new(Algorithm::Golomb, GolombParams { m, mode }.to_metadata(), body)
}

/// Decodes a Golomb package back into text.
pub fn decode(package: &Package) -> Result<String, SqueezeError> {
    if package.algorithm() != Algorithm::Golomb {
        return Err(SqueezeError::FormatError(format!(
            "expected a Golomb package, got {}",
            package.algorithm()
        )));
    }
    if package.is_empty() {
        return Ok(String::new());
    }

    let params = GolombParams::from_metadata(package.metadata())?;
    let values = decode_values(package.body(), params.m)?;
    Ok(unmap_values(&values, params.mode))
}

//==================================================================================
// 5. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn code_of(n: u64, m: u64) -> String {
        let mut s = String::new();
        encode_value(n, m, &mut s);
        s
    }

    #[test]
    fn test_truncated_binary_codes() {
        // m = 3: b = 2, T = 1 -> r=0 "0", r=1 "10", r=2 "11".
        assert_eq!(code_of(0, 3), "00");
        assert_eq!(code_of(1, 3), "010");
        assert_eq!(code_of(2, 3), "011");
        assert_eq!(code_of(4, 3), "1010");
        // m = 4 is plain binary in 2 bits.
        assert_eq!(code_of(5, 4), "1001");
        // m = 1 is pure unary.
        assert_eq!(code_of(3, 1), "1110");
        for n in 0..50 {
            for m in 1..20 {
                assert_eq!(code_of(n, m).len() as u64, code_length(n, m));
            }
        }
    }

    #[test]
    fn test_decode_values_inverts_encode() {
        for m in 1..=40u64 {
            let values: Vec<u64> = (0..120).collect();
            let mut body = String::new();
            for &v in &values {
                encode_value(v, m, &mut body);
            }
            assert_eq!(decode_values(&body, m).unwrap(), values, "m = {m}");
        }
    }

    #[test]
    fn test_chosen_divisor_is_cost_minimal() {
        let config = GolombConfig::default();
        let values: Vec<u64> = "golomb coding favours small numbers".chars().map(|c| c as u64).collect();
        let (best_m, best_cost) = find_best_divisor(&values, &config);
        let histogram = histogram(&values);
        assert_eq!(total_cost(&histogram, best_m), best_cost);
        for m in candidate_divisors(&values, &config) {
            assert!(total_cost(&histogram, m) >= best_cost, "m = {m} beats {best_m}");
        }
    }

    #[test]
    fn test_heuristic_candidate_for_large_values() {
        let config = GolombConfig::default();
        let values = vec![100_000u64; 3];
        let expected = (0.69f64 * 100_000.0).ceil() as u64;
        let candidates = candidate_divisors(&values, &config);
        assert_eq!(candidates.len(), 257);
        assert_eq!(*candidates.last().unwrap(), expected);
        let (m, _) = find_best_divisor(&values, &config);
        assert_eq!(m, expected);
    }

    #[test]
    fn test_divisors_above_two_to_the_63() {
        let m = (1u64 << 63) + 5;
        let values = vec![0, m - 1, m, u64::MAX];
        let mut body = String::new();
        for &v in &values {
            encode_value(v, m, &mut body);
        }
        assert_eq!(decode_values(&body, m).unwrap(), values);
        assert_eq!(code_length(m - 1, m), 65);
        assert_eq!(code_length(u64::MAX, 1), u64::MAX);
    }

    #[test]
    fn test_numbers_near_u64_max_roundtrip() {
        for text in [
            "18446744073709551615",
            "13500000000000000000 13500000000000000000",
            "0 18446744073709551615 7",
        ] {
            let package = encode(text).unwrap();
            assert!(package.metadata().ends_with("$$$NUM"), "{text:?}");
            assert_eq!(decode(&package).unwrap(), text);
        }
    }

    #[test]
    fn test_oversized_body_is_rejected() {
        let config = GolombConfig {
            max_divisor: 1,
            heuristic_factor: 1e-30,
            ..GolombConfig::default()
        };
        let err = encode_with_config("18446744073709551615", &config).unwrap_err();
        assert!(matches!(err, SqueezeError::InvalidParameter(_)));
    }

    #[test]
    fn test_text_mode_roundtrip() {
        let text = "Hello, Golomb! 123 mixed with text.\n";
        let package = encode(text).unwrap();
        assert!(package.metadata().ends_with("$$$TXT"));
        assert_eq!(decode(&package).unwrap(), text);
    }

    #[test]
    fn test_numeric_mode_roundtrip() {
        let text = "11 12 0 7 300";
        let package = encode(text).unwrap();
        assert!(package.metadata().ends_with("$$$NUM"));
        assert_eq!(decode(&package).unwrap(), text);
    }

    #[test]
    fn test_non_canonical_numbers_fall_back_to_text() {
        for text in ["007 1", "1  2", "1\n2", "12 "] {
            let (mode, _) = map_symbols(text, GolombMapping::Auto);
            assert_eq!(mode, GolombMode::Text, "{text:?}");
            assert_eq!(decode(&encode(text).unwrap()).unwrap(), text);
        }
    }

    #[test]
    fn test_digit_shift_mapping_roundtrip() {
        let config = GolombConfig {
            mapping: GolombMapping::DigitShift,
            ..GolombConfig::default()
        };
        let text = "room 101, floor 7";
        let (mode, values) = map_symbols(text, GolombMapping::DigitShift);
        assert_eq!(mode, GolombMode::DigitShift);
        assert_eq!(values[5], 1);
        assert_eq!(values[0], 'r' as u64 + 10);

        let package = encode_with_config(text, &config).unwrap();
        assert!(package.metadata().ends_with("$$$DIG"));
        assert_eq!(decode(&package).unwrap(), text);
    }

    #[test]
    fn test_legacy_metadata_is_text_mode() {
        let mut body = String::new();
        for c in "Hi".chars() {
            encode_value(c as u64, 64, &mut body);
        }
        let package = Package::new(Algorithm::Golomb, "64", body).unwrap();
        assert_eq!(decode(&package).unwrap(), "Hi");
    }

    #[test]
    fn test_non_positive_divisor_rejected() {
        for meta in ["0$$$TXT", "-4$$$TXT", "0"] {
            let package = Package::new(Algorithm::Golomb, meta, "0101").unwrap();
            assert!(matches!(decode(&package), Err(SqueezeError::GolombError(_))), "{meta:?}");
        }
        let package = Package::new(Algorithm::Golomb, "x$$$TXT", "0101").unwrap();
        assert!(matches!(decode(&package), Err(SqueezeError::FormatError(_))));
    }

    #[test]
    fn test_truncated_body_decodes_partially() {
        let package = encode("abc").unwrap();
        let body = package.body();
        let truncated = Package::new(
            Algorithm::Golomb,
            package.metadata(),
            &body[..body.len() - 2],
        )
        .unwrap();
        let decoded = decode(&truncated).unwrap();
        assert!("abc".starts_with(&decoded));
        assert!(decoded.len() < 3);
    }

    #[test]
    fn test_invalid_code_point_becomes_placeholder() {
        // 0xD800 is a surrogate and has no char.
        let mut body = String::new();
        encode_value('A' as u64, 256, &mut body);
        encode_value(0xD800, 256, &mut body);
        let package = Package::new(Algorithm::Golomb, "256$$$TXT", body).unwrap();
        assert_eq!(decode(&package).unwrap(), format!("A{}", PLACEHOLDER));
    }

    #[test]
    fn test_empty_input() {
        let package = encode("").unwrap();
        assert!(package.is_empty());
        assert_eq!(decode(&package).unwrap(), "");
    }
}
