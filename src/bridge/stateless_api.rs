// In: src/bridge/stateless_api.rs

use std::io::{Read, Write};

use crate::bridge::format::{Algorithm, Package};
use crate::bridge::sizing;
use crate::config::SqueezeConfig;
use crate::error::SqueezeError;
use crate::kernels;

/// The outcome of running one codec over a text.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionReport {
    pub package: Package,
    /// Size of the input as UTF-8.
    pub original_size: usize,
    /// Bit-packed size of the package, see `sizing::theoretical_size`.
    pub theoretical_size: usize,
    pub ratio: f64,
}

/// Encodes `text` with `algorithm` using the default configuration.
pub fn encode(algorithm: Algorithm, text: &str) -> Result<Package, SqueezeError> {
    kernels::dispatch_encode(algorithm, text, &SqueezeConfig::default())
}

/// Encodes `text` with `algorithm` using a caller-supplied configuration.
pub fn encode_with_config(
    algorithm: Algorithm,
    text: &str,
    config: &SqueezeConfig,
) -> Result<Package, SqueezeError> {
    kernels::dispatch_encode(algorithm, text, config)
}

/// Decodes a package with the decoder its algorithm tag names.
pub fn decode(package: &Package) -> Result<String, SqueezeError> {
    kernels::dispatch_decode(package)
}

/// Parses and decodes a serialized package. An empty string decodes to an
/// empty string.
pub fn decode_str(serialized: &str) -> Result<String, SqueezeError> {
    if serialized.is_empty() {
        return Ok(String::new());
    }
    let package = Package::parse(serialized)?;
    decode(&package)
}

/// Runs every codec in `algorithms` independently over `text`.
///
/// An empty `algorithms` slice falls back to `config.algorithms`.
pub fn encode_all(
    algorithms: &[Algorithm],
    text: &str,
    config: &SqueezeConfig,
) -> Result<Vec<CompressionReport>, SqueezeError> {
    let selected = if algorithms.is_empty() {
        config.algorithms.as_slice()
    } else {
        algorithms
    };

    let original_size = text.len();
    selected
        .iter()
        .map(|&algorithm| {
            let package = kernels::dispatch_encode(algorithm, text, config)?;
            let theoretical_size = sizing::theoretical_size(&package);
            let ratio = sizing::compression_ratio(original_size, &package);
            log::info!(
                "  - {:<8} | Original: {:>8} B | Packed: {:>8} B | CR: {:.3}",
                algorithm.tag(),
                original_size,
                theoretical_size,
                ratio
            );
            Ok(CompressionReport {
                package,
                original_size,
                theoretical_size,
                ratio,
            })
        })
        .collect()
}

/// Writes the serialized package to `writer` as UTF-8.
pub fn write_package<W: Write>(package: &Package, mut writer: W) -> Result<(), SqueezeError> {
    writer.write_all(package.to_string().as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Reads a serialized package from `reader`.
pub fn read_package<R: Read>(mut reader: R) -> Result<Package, SqueezeError> {
    let mut serialized = String::new();
    reader.read_to_string(&mut serialized)?;
    Package::parse(&serialized)
}
