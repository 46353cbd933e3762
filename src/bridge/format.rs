// In: src/bridge/format.rs

//! Defines the textual package format shared by every lossless codec.
//!
//! A package is the self-describing unit handed back to the caller:
//!
//! ```text
//! ALGO::::METADATA::::BODY
//! ```
//!
//! `ALGO` names the decoder, `METADATA` carries the decoder's parameters (its
//! sub-fields, where there are several, are joined by `$$$`), and `BODY` is the
//! payload stored one character per bit or field. The format is meant to be
//! human-inspectable and re-parseable without any out-of-band state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SqueezeError;

//==================================================================================
// I. Constants
//==================================================================================

/// Separates the three top-level package fields.
pub const SEPARATOR: &str = "::::";
/// Separates sub-fields inside a package's metadata.
pub const SUB_SEPARATOR: &str = "$$$";

//==================================================================================
// II. Algorithm Tag
//==================================================================================

/// Identifies which lossless codec produced (and must decode) a package.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Algorithm {
    #[serde(rename = "RLE")]
    Rle,
    Huffman,
    Golomb,
    #[serde(rename = "LZW")]
    Lzw,
}

impl Algorithm {
    /// Every lossless codec, in the order the toolkit presents them.
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Rle,
        Algorithm::Huffman,
        Algorithm::Golomb,
        Algorithm::Lzw,
    ];

    /// The tag written in the first package field. Part of the on-disk contract.
    pub fn tag(&self) -> &'static str {
        match self {
            Algorithm::Rle => "RLE",
            Algorithm::Huffman => "Huffman",
            Algorithm::Golomb => "Golomb",
            Algorithm::Lzw => "LZW",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Algorithm {
    type Err = SqueezeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .iter()
            .copied()
            .find(|algo| algo.tag() == s)
            .ok_or_else(|| SqueezeError::UnknownAlgorithm(s.to_string()))
    }
}

//==================================================================================
// III. Package
//==================================================================================

/// An encoded payload plus everything needed to decode it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Package {
    algorithm: Algorithm,
    metadata: String,
    body: String,
}

impl Package {
    /// Builds a package, rejecting metadata that would break the framing.
    pub fn new(
        algorithm: Algorithm,
        metadata: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, SqueezeError> {
        let metadata = metadata.into();
        if metadata.contains(SEPARATOR) {
            return Err(SqueezeError::FormatError(format!(
                "metadata may not contain the package separator {:?}",
                SEPARATOR
            )));
        }
        Ok(Self {
            algorithm,
            metadata,
            body: body.into(),
        })
    }

    /// The package produced for empty input: no metadata and no body.
    pub fn empty(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            metadata: String::new(),
            body: String::new(),
        }
    }

    /// Splits a serialized package into its three fields.
    ///
    /// The string is split at most twice, so a body is never cut short; fewer
    /// than three fields or an unknown algorithm tag is a `FormatError`.
    pub fn parse(serialized: &str) -> Result<Self, SqueezeError> {
        let mut fields = serialized.splitn(3, SEPARATOR);
        let (algo, metadata, body) = match (fields.next(), fields.next(), fields.next()) {
            (Some(algo), Some(metadata), Some(body)) => (algo, metadata, body),
            _ => {
                return Err(SqueezeError::FormatError(format!(
                    "expected three {:?}-separated fields",
                    SEPARATOR
                )))
            }
        };
        let algorithm = algo
            .parse::<Algorithm>()
            .map_err(|e| SqueezeError::FormatError(e.to_string()))?;
        Ok(Self {
            algorithm,
            metadata: metadata.to_string(),
            body: body.to_string(),
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn metadata(&self) -> &str {
        &self.metadata
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Metadata split on `SUB_SEPARATOR`.
    pub fn metadata_fields(&self) -> impl Iterator<Item = &str> {
        self.metadata.split(SUB_SEPARATOR)
    }

    /// `true` for the package produced by empty input.
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty() && self.body.is_empty()
    }

    pub fn into_parts(self) -> (Algorithm, String, String) {
        (self.algorithm, self.metadata, self.body)
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            self.algorithm, SEPARATOR, self.metadata, SEPARATOR, self.body
        )
    }
}

impl FromStr for Package {
    type Err = SqueezeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Package::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_then_parse_is_identity() {
        let package = Package::new(Algorithm::Golomb, "4$$$TXT", "1100101").unwrap();
        let serialized = package.to_string();
        assert_eq!(serialized, "Golomb::::4$$$TXT::::1100101");

        let reparsed = Package::parse(&serialized).unwrap();
        assert_eq!(reparsed, package);
        assert_eq!(reparsed.to_string(), serialized);
        assert_eq!(reparsed.metadata_fields().collect::<Vec<_>>(), vec!["4", "TXT"]);
    }

    #[test]
    fn test_body_may_contain_separator() {
        let package = Package::parse("RLE::::3::::a::::|").unwrap();
        assert_eq!(package.algorithm(), Algorithm::Rle);
        assert_eq!(package.metadata(), "3");
        assert_eq!(package.body(), "a::::|");
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        for bad in ["", "RLE", "RLE::::3", "3|a|"] {
            let err = Package::parse(bad).unwrap_err();
            assert!(matches!(err, SqueezeError::FormatError(_)), "{bad:?}");
        }
    }

    #[test]
    fn test_parse_rejects_unknown_algorithm() {
        let err = Package::parse("Zip::::1::::0101").unwrap_err();
        assert!(err.to_string().contains("Zip"));
    }

    #[test]
    fn test_metadata_cannot_contain_separator() {
        assert!(Package::new(Algorithm::Rle, "1::::2", "a1|").is_err());
    }

    #[test]
    fn test_empty_package() {
        let package = Package::empty(Algorithm::Lzw);
        assert!(package.is_empty());
        assert_eq!(package.to_string(), "LZW::::::::");
        assert_eq!(Package::parse("LZW::::::::").unwrap(), package);
    }

    #[test]
    fn test_algorithm_tags_roundtrip() {
        for algo in Algorithm::ALL {
            assert_eq!(algo.tag().parse::<Algorithm>().unwrap(), algo);
        }
        assert!("rle".parse::<Algorithm>().is_err());
    }
}
