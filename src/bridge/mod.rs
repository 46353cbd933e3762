// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the public-facing API for the lossless side of squeeze. It owns
// the package format and the size accounting, and routes every call into the pure
// `kernels`.
//
// Data Flow (Compression):
//
//   1. [Stateless API (encode / encode_all)] -> Receives `&str`
//         |
//         `-> calls `kernels::dispatch_encode` for each selected algorithm
//
//   2. [Kernel (rle / huffman / golomb / lzw)] -> Returns a `Package`
//         |
//         `-> `sizing::theoretical_size` prices the package for the report
//
// Data Flow (Decompression):
//
//   1. [Stateless API (decode_str)] -> Receives a serialized package
//         |
//         `-> `Package::parse` splits it into (algorithm, metadata, body)
//
//   2. [kernels::dispatch_decode] -> Routes on the algorithm tag, returns `String`
//
// ====================================================================================
pub mod format;
pub mod sizing;
pub mod stateless_api;

pub use format::{Algorithm, Package, SEPARATOR, SUB_SEPARATOR};
pub use sizing::{compression_ratio, theoretical_size, theoretical_size_str};
pub use stateless_api::{
    decode, decode_str, encode, encode_all, encode_with_config, read_package, write_package,
    CompressionReport,
};
