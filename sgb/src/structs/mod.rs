//! Data structures representing container and bitstream components.
//!
//! Contains structured representations of the `.sgb` header, the stream
//! directory and AC-3 sync frame fields used throughout extraction.

pub mod ac3;
pub mod header;
