// In: src/error.rs

//! This module defines the single, unified error type for the entire squeeze library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqueezeError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to our library's logic)
    // =========================================================================
    /// A package string could not be split into algorithm, metadata and body,
    /// or one of its fields failed to parse into the expected shape.
    #[error("Package format error: {0}")]
    FormatError(String),

    #[error("Unknown algorithm tag: {0}")]
    UnknownAlgorithm(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the underlying I/O subsystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically while loading a config.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An error from the PNG encoder used for lossy size accounting.
    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),

    // =========================================================================
    // === Low-Level Kernel Errors
    // =========================================================================
    #[error("Huffman decoding error: {0}")]
    HuffmanError(String),

    #[error("Golomb coding error: {0}")]
    GolombError(String),

    #[error("LZW coding error: {0}")]
    LzwError(String),

    #[error("Quantization failed: {0}")]
    QuantizationError(String),
}
