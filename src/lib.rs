//! This file is the root of the `squeeze` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`bridge`, `kernels`,
//!     `lossy`, etc.) so the Rust compiler knows they exist.
//! 2.  Re-exporting the small surface most callers need: the lossless
//!     encode/decode entry points, the quantizer and the unified error type.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

pub mod bridge;
pub mod config;
pub mod kernels;
pub mod lossy;

mod error;
mod utils;

//==================================================================================
// 2. Public Re-exports
//==================================================================================
pub use bridge::{
    decode, decode_str, encode, encode_all, theoretical_size, theoretical_size_str, Algorithm,
    CompressionReport, Package,
};
pub use config::SqueezeConfig;
pub use error::SqueezeError;
pub use lossy::{quantize, QuantizationResult, QuantizationTable};
pub use observability::enable_verbose_logging;
