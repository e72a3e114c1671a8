//! Container loading and directory access.

use std::path::Path;

use log::debug;

use crate::structs::header::{ContainerHeader, StreamDescriptor};
use crate::utils::errors::FormatError;

/// An opened `.sgb` container with a validated stream directory.
///
/// The whole file is held in memory. Containers ship a handful of streams
/// of a few megabytes each, so payloads are borrowed straight out of the
/// buffer rather than copied.
#[derive(Debug)]
pub struct Container {
    name: String,
    data: Vec<u8>,
    directory: Vec<StreamDescriptor>,
}

impl Container {
    /// Reads and validates the container at `path`.
    ///
    /// The container name used for output files is the file stem, so
    /// `bgm_stage1.sgb` yields outputs named `bgm_stage1_*`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("container"));

        Self::from_bytes(name, data)
    }

    /// Validates an in-memory container. `name` becomes the output name stem.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self, FormatError> {
        let name = name.into();
        let header = ContainerHeader::read(&data)?;

        debug!(
            "{name}: {} streams in {} bytes",
            header.stream_count(),
            data.len()
        );

        Ok(Self {
            directory: header.into_directory(),
            name,
            data,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw container bytes, including header and directory.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Directory entries in on-disk order.
    pub fn streams(&self) -> &[StreamDescriptor] {
        &self.directory
    }

    pub fn stream_count(&self) -> usize {
        self.directory.len()
    }
}

#[test]
fn opens_example_container() {
    use crate::process::EXAMPLE_DATA;

    let container = Container::from_bytes("demo", EXAMPLE_DATA.to_vec()).unwrap();

    assert_eq!(container.name(), "demo");
    assert_eq!(container.stream_count(), 3);
    assert_eq!(container.streams()[0].offset, 32);
    assert_eq!(container.streams()[2].declared_length, None);
}

#[test]
fn opens_zero_stream_container() {
    let data = crate::process::build_container(&[]);
    let container = Container::from_bytes("empty", data).unwrap();

    assert_eq!(container.stream_count(), 0);
    assert!(container.streams().is_empty());
}

#[test]
fn rejects_garbage() {
    let err = Container::from_bytes("junk", vec![0u8; 64]).unwrap_err();
    assert!(matches!(err, FormatError::BadMagic { .. }));
}

#[test]
fn open_derives_name_from_file_stem() {
    use crate::process::{build_container, sync_payload};

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bgm_stage1.sgb");
    std::fs::write(&path, build_container(&[&sync_payload(16)])).unwrap();

    let container = Container::open(&path).unwrap();
    assert_eq!(container.name(), "bgm_stage1");
    assert_eq!(container.stream_count(), 1);
}

#[test]
fn open_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Container::open(dir.path().join("absent.sgb")).unwrap_err();
    assert!(matches!(err, FormatError::Io(_)));
}
