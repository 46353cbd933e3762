// In: src/config.rs

//! The single source of truth for all squeeze codec configuration.
//!
//! `SqueezeConfig` is created once at the application boundary (e.g. from a
//! JSON file handed over by the UI layer) and passed by reference into the
//! stateful parts of the API. The stateless API uses `SqueezeConfig::default()`,
//! which reproduces the canonical codec behavior exactly.

use serde::{Deserialize, Serialize};

use crate::bridge::format::Algorithm;
use crate::error::SqueezeError;

//==================================================================================
// I. Lossless Configuration
//==================================================================================

/// Selects how Golomb maps input characters to non-negative integers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GolombMapping {
    /// **Default:** Detects numeric input (every whitespace-separated token is
    /// a decimal integer) and codes the numbers themselves; any other input is
    /// coded character by character using raw code points.
    #[default]
    Auto,

    /// Digits `0`-`9` map to `0..=9`, every other character maps to its code
    /// point plus 10. Packages produced this way are tagged `DIG` and are not
    /// interchangeable with `Auto` packages.
    DigitShift,
}

/// Parameters for the Golomb divisor search.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GolombConfig {
    /// Upper bound of the exhaustive divisor search `[1, max_divisor]`.
    #[serde(default = "default_max_divisor")]
    pub max_divisor: u64,

    /// Factor applied to the mean value for the out-of-range heuristic candidate.
    #[serde(default = "default_heuristic_factor")]
    pub heuristic_factor: f64,

    #[serde(default)]
    pub mapping: GolombMapping,
}

impl Default for GolombConfig {
    fn default() -> Self {
        Self {
            max_divisor: default_max_divisor(),
            heuristic_factor: default_heuristic_factor(),
            mapping: GolombMapping::default(),
        }
    }
}

fn default_max_divisor() -> u64 {
    256
}

fn default_heuristic_factor() -> f64 {
    0.69
}

//==================================================================================
// II. Lossy Configuration
//==================================================================================

/// Compression effort used when sizing the reconstructed image as a PNG.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PngEffort {
    Fast,
    Balanced,
    /// **Default:** Matches an "optimize" save of the reconstructed image.
    #[default]
    Best,
}

impl PngEffort {
    pub(crate) fn to_png(self) -> png::Compression {
        match self {
            PngEffort::Fast => png::Compression::Fast,
            PngEffort::Balanced => png::Compression::Default,
            PngEffort::Best => png::Compression::Best,
        }
    }
}

/// Defines the lossy (quantization) settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LossyConfig {
    /// Perturbation applied to every centroid when it is split in two.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Exclusive ceiling of the intensity range (256 for 8-bit grayscale).
    #[serde(default = "default_full_scale")]
    pub full_scale: u16,

    #[serde(default)]
    pub png_effort: PngEffort,
}

impl Default for LossyConfig {
    fn default() -> Self {
        Self {
            epsilon: default_epsilon(),
            full_scale: default_full_scale(),
            png_effort: PngEffort::default(),
        }
    }
}

fn default_epsilon() -> f64 {
    1.0
}

fn default_full_scale() -> u16 {
    256
}

//==================================================================================
// III. The Unified SqueezeConfig
//==================================================================================

/// The single, unified configuration for every codec in the toolkit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct SqueezeConfig {
    /// Codecs run by `encode_all` when the caller does not name any.
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<Algorithm>,

    #[serde(default)]
    pub golomb: GolombConfig,

    #[serde(default)]
    pub lossy: LossyConfig,
}

impl Default for SqueezeConfig {
    fn default() -> Self {
        Self {
            algorithms: default_algorithms(),
            golomb: GolombConfig::default(),
            lossy: LossyConfig::default(),
        }
    }
}

impl SqueezeConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SqueezeError> {
        let config: SqueezeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the codecs cannot honor.
    pub fn validate(&self) -> Result<(), SqueezeError> {
        if self.golomb.max_divisor == 0 {
            return Err(SqueezeError::InvalidParameter(
                "golomb.max_divisor must be at least 1".to_string(),
            ));
        }
        if !(self.golomb.heuristic_factor > 0.0) {
            return Err(SqueezeError::InvalidParameter(format!(
                "golomb.heuristic_factor must be positive, got {}",
                self.golomb.heuristic_factor
            )));
        }
        if !(self.lossy.epsilon > 0.0) {
            return Err(SqueezeError::InvalidParameter(format!(
                "lossy.epsilon must be positive, got {}",
                self.lossy.epsilon
            )));
        }
        if self.lossy.full_scale == 0 || self.lossy.full_scale > 256 {
            return Err(SqueezeError::InvalidParameter(format!(
                "lossy.full_scale must be in 1..=256, got {}",
                self.lossy.full_scale
            )));
        }
        Ok(())
    }
}

fn default_algorithms() -> Vec<Algorithm> {
    Algorithm::ALL.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_yields_defaults() {
        let config = SqueezeConfig::from_json("{}").unwrap();
        assert_eq!(config, SqueezeConfig::default());
        assert_eq!(config.golomb.max_divisor, 256);
        assert_eq!(config.lossy.epsilon, 1.0);
        assert_eq!(config.algorithms.len(), 4);
    }

    #[test]
    fn test_partial_json_overrides() {
        let json = r#"{
            "algorithms": ["Huffman", "LZW"],
            "golomb": { "mapping": "digit_shift" },
            "lossy": { "png_effort": "fast" }
        }"#;
        let config = SqueezeConfig::from_json(json).unwrap();
        assert_eq!(config.algorithms, vec![Algorithm::Huffman, Algorithm::Lzw]);
        assert_eq!(config.golomb.mapping, GolombMapping::DigitShift);
        assert_eq!(config.golomb.max_divisor, 256);
        assert_eq!(config.lossy.png_effort, PngEffort::Fast);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = SqueezeConfig::from_json(r#"{ "golomb": { "max_divisor": 0 } }"#).unwrap_err();
        assert!(matches!(err, SqueezeError::InvalidParameter(_)));

        let err = SqueezeConfig::from_json(r#"{ "lossy": { "epsilon": -1.0 } }"#).unwrap_err();
        assert!(matches!(err, SqueezeError::InvalidParameter(_)));

        let err = SqueezeConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, SqueezeError::SerdeJson(_)));
    }
}
