//! Utility functions and supporting infrastructure.
//!
//! Provides bitstream I/O and the error types shared across parsing,
//! extraction and writing.

pub mod bitstream_io;
pub mod errors;
