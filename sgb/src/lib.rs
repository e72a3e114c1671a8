#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Parser and extractor for Puppeteer `.sgb` sound banks: big endian
//! containers holding raw AC-3 elementary streams behind a small offset
//! directory.
//!
//! ### Container Organization
//!
//! **Header**: `SGB\0` magic and a stream count.
//! **Directory**: one offset/length pair per stream, length zero meaning
//! "infer from the next offset or the container end".
//! **Payloads**: concatenated AC-3 elementary streams, each opening with
//! the 0x0B77 sync word.
//!
//! ### Stream Roles
//!
//! Banks group streams by cue, three per group: music, ambient bed, demo
//! voice track. Roles follow from directory position alone and unusual
//! layouts degrade to `unknown` instead of failing.
//!
//! ## Quick Start
//!
//! 1. Open a container with [`process::read::Container`]
//! 2. Extract payloads with [`process::extract::extract_all`]
//! 3. Persist them with [`process::write::Writer`]
//!
//! ```rust
//! use sgb::process::{EXAMPLE_DATA, classify::RoleTable, extract::extract_all, read::Container};
//!
//! let container = Container::from_bytes("demo", EXAMPLE_DATA.to_vec())?;
//! let table = RoleTable::default();
//!
//! for result in extract_all(&container, &table) {
//!     match result {
//!         Ok(stream) => {
//!             println!("stream {} ({}): {} bytes", stream.index, stream.role, stream.len());
//!         }
//!         Err(extract_error) => {
//!             // Streams fail independently - keep going
//!             eprintln!("{extract_error}");
//!         }
//!     }
//! }
//! # Ok::<(), sgb::utils::errors::FormatError>(())
//! ```

/// Processing functionality for `.sgb` containers.
///
/// 1. **Reading** ([`process::read`]): Container loading and directory
///    validation.
///
/// 2. **Extraction** ([`process::extract`]): Payload resolution and AC-3
///    sync validation, stream by stream.
///
/// 3. **Classification** ([`process::classify`]): Positional role lookup.
///
/// 4. **Writing** ([`process::write`]): Deterministic naming and atomic
///    persistence.
pub mod process;

/// Data structures representing container and bitstream components.
///
/// - **Container Header** ([`structs::header`]): Magic, stream count and
///   directory entries
/// - **AC-3 Sync Frames** ([`structs::ac3`]): Sync info fields, frame
///   sizes and stream statistics
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
