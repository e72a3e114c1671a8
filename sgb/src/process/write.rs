//! Output naming and atomic file writing.
//!
//! Extracted streams land under deterministic names so repeated runs over
//! the same container produce byte-identical results. Writes go through a
//! temporary file in the output directory followed by a rename, leaving
//! no partial output behind when a write fails mid-payload.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::NamedTempFile;

use crate::process::classify::AudioType;
use crate::process::extract::ExtractedStream;
use crate::utils::errors::WriteError;

/// Output name for a stream: `{source}_{index:02}_{role}.ac3`.
///
/// Indices are zero padded to two digits so listings sort in directory
/// order; wider indices keep all their digits.
pub fn output_name(source: &str, index: usize, role: AudioType) -> String {
    format!("{source}_{index:02}_{role}.ac3")
}

/// Format of a produced output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Raw AC-3 elementary stream, written by the [`Writer`].
    Ac3,
    /// PCM WAV, produced by an external transcoder from an `.ac3` file.
    Wav,
}

/// A file produced by [`Writer::write`] or a downstream transcoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub format: OutputFormat,
    pub bytes: u64,
}

/// Writes extracted streams into one output directory.
#[derive(Debug, Clone)]
pub struct Writer {
    output_dir: PathBuf,
}

impl Writer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Persists one stream, replacing any previous file of the same name.
    pub fn write(&self, stream: &ExtractedStream<'_>) -> Result<OutputFile, WriteError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| WriteError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self
            .output_dir
            .join(output_name(stream.source, stream.index, stream.role));

        // Staged in the output directory so the final rename never
        // crosses a filesystem boundary.
        let mut staged =
            NamedTempFile::new_in(&self.output_dir).map_err(|source| WriteError::Stage {
                path: self.output_dir.clone(),
                source,
            })?;

        staged
            .write_all(stream.payload)
            .map_err(|source| WriteError::Write {
                path: path.clone(),
                source,
            })?;

        staged.persist(&path).map_err(|error| WriteError::Persist {
            path: path.clone(),
            source: error.error,
        })?;

        debug!("wrote {} ({} bytes)", path.display(), stream.payload.len());

        Ok(OutputFile {
            path,
            format: OutputFormat::Ac3,
            bytes: stream.payload.len() as u64,
        })
    }
}

#[cfg(test)]
fn sample_stream<'a>(payload: &'a [u8], index: usize, role: AudioType) -> ExtractedStream<'a> {
    use crate::structs::ac3::SyncInfo;

    ExtractedStream {
        index,
        role,
        sync: SyncInfo::read(payload).unwrap(),
        payload,
        source: "demo",
    }
}

#[test]
fn output_names_follow_directory_order() {
    assert_eq!(output_name("demo", 0, AudioType::Music), "demo_00_music.ac3");
    assert_eq!(
        output_name("demo", 1, AudioType::Ambient),
        "demo_01_ambient.ac3"
    );
    assert_eq!(output_name("demo", 2, AudioType::Demo), "demo_02_demo.ac3");
    assert_eq!(
        output_name("bank", 11, AudioType::Unknown),
        "bank_11_unknown.ac3"
    );
    assert_eq!(
        output_name("bank", 123, AudioType::Music),
        "bank_123_music.ac3"
    );
}

#[test]
fn writes_payload_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let payload = crate::process::sync_payload(64);
    let writer = Writer::new(dir.path());

    let output = writer
        .write(&sample_stream(&payload, 0, AudioType::Music))
        .unwrap();

    assert_eq!(output.path, dir.path().join("demo_00_music.ac3"));
    assert_eq!(output.format, OutputFormat::Ac3);
    assert_eq!(output.bytes, 64);
    assert_eq!(std::fs::read(&output.path).unwrap(), payload);
}

#[test]
fn rewrite_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let payload = crate::process::sync_payload(32);
    let writer = Writer::new(dir.path());
    let stream = sample_stream(&payload, 1, AudioType::Ambient);

    let first = writer.write(&stream).unwrap();
    let second = writer.write(&stream).unwrap();

    assert_eq!(first, second);
    assert_eq!(std::fs::read(&second.path).unwrap(), payload);

    // No staged temporaries left behind.
    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries, ["demo_01_ambient.ac3"]);
}

#[test]
fn writes_three_stream_bank_end_to_end() {
    use crate::process::classify::RoleTable;
    use crate::process::extract::extract_all;
    use crate::process::read::Container;
    use crate::process::{build_container, sync_payload};

    let payloads = [sync_payload(1000), sync_payload(1200), sync_payload(800)];
    let data = build_container(&[&payloads[0], &payloads[1], &payloads[2]]);
    let container = Container::from_bytes("demo", data).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let writer = Writer::new(dir.path());

    for result in extract_all(&container, &RoleTable::default()) {
        writer.write(&result.unwrap()).unwrap();
    }

    for (name, payload) in [
        ("demo_00_music.ac3", &payloads[0]),
        ("demo_01_ambient.ac3", &payloads[1]),
        ("demo_02_demo.ac3", &payloads[2]),
    ] {
        assert_eq!(&std::fs::read(dir.path().join(name)).unwrap(), payload);
    }
}

#[test]
fn creates_missing_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("out").join("ac3");
    let payload = crate::process::sync_payload(16);

    let output = Writer::new(&nested)
        .write(&sample_stream(&payload, 2, AudioType::Demo))
        .unwrap();

    assert_eq!(output.path, nested.join("demo_02_demo.ac3"));
    assert!(output.path.is_file());
}
