//! This module serves as the public API and dispatcher for the collection of
//! pure, stateless lossless codecs.
//!
//! Each codec turns text into a `Package` and back. The dispatchers below route
//! on the `Algorithm` tag so callers (and the bridge layer) never need to match
//! on codecs themselves.

use crate::bridge::format::{Algorithm, Package};
use crate::config::SqueezeConfig;
use crate::error::SqueezeError;

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// Run-length coding of repeated characters.
pub mod rle;

/// Static prefix coding.
pub mod huffman;

/// Parametric unary / truncated-binary coding.
pub mod golomb;

/// Adaptive dictionary coding.
pub mod lzw;

//==================================================================================
// 2. Public API (Unified Dispatchers)
//==================================================================================

/// The single, unified dispatcher for all ENCODE operations.
pub fn dispatch_encode(
    algorithm: Algorithm,
    text: &str,
    config: &SqueezeConfig,
) -> Result<Package, SqueezeError> {
    match algorithm {
        Algorithm::Rle => rle::encode(text),
        Algorithm::Huffman => huffman::encode(text),
        Algorithm::Golomb => golomb::encode_with_config(text, &config.golomb),
        Algorithm::Lzw => lzw::encode(text),
    }
}

/// The single, unified dispatcher for all DECODE operations.
pub fn dispatch_decode(package: &Package) -> Result<String, SqueezeError> {
    match package.algorithm() {
        Algorithm::Rle => rle::decode(package),
        Algorithm::Huffman => huffman::decode(package),
        Algorithm::Golomb => golomb::decode(package),
        Algorithm::Lzw => lzw::decode(package),
    }
}
