// In: src/lossy/mod.rs

//! Lossy compression of grayscale images by non-uniform scalar quantization.
//!
//! `table` builds the quantization table by centroid splitting; `quantizer`
//! applies it to an image and reports the distortion (MSE) and the compression
//! ratio against the reconstructed image's PNG size.

pub mod quantizer;
pub mod table;

pub use quantizer::{encode_png, mean_squared_error, quantize, quantize_with_config, QuantizationResult};
pub use table::{Interval, QuantizationTable, MAX_BIT_SIZE};
