//! Core byte-level primitives
//!
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Attributes: lightweight opening-tag attribute scan
//! - Entities: XML entity decoding with Cow (zero-copy when possible)
//! - Encoding: BOM and XML declaration sniffing
//! - ChunkScanner: ScanHandler-based markup scanner fed in chunks

pub mod attributes;
pub mod chunk_scanner;
pub mod encoding;
pub mod entities;
pub mod scanner;
