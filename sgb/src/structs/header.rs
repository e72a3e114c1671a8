//! `.sgb` container header and stream directory structures.
//!
//! ## Layout
//!
//! All integers are big endian.
//!
//! | Offset | Size | Field                     |
//! |--------|------|---------------------------|
//! | 0x00   | 4    | magic `SGB\0`             |
//! | 0x04   | 4    | stream count N            |
//! | 0x08   | 8×N  | directory entries         |
//!
//! Each directory entry is a pair of `u32` values: payload offset from the
//! start of the container, and declared payload length. A declared length of
//! zero means the length is unknown and must be inferred from the next
//! stream's offset, or from the end of the container for the last stream.

use crate::utils::errors::FormatError;

/// Magic bytes at the start of every `.sgb` container.
pub const SGB_MAGIC: [u8; 4] = *b"SGB\0";

/// Fixed header size: magic plus stream count.
pub const HEADER_LEN: u64 = 8;

/// Size of one stream directory entry.
pub const DIRECTORY_ENTRY_LEN: u64 = 8;

/// Location of one stream payload inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDescriptor {
    /// Zero-based position in the stream directory.
    pub index: usize,
    /// Payload offset from the start of the container.
    pub offset: u64,
    /// Declared payload length. `None` when the directory carried the
    /// zero sentinel and the length must be inferred.
    pub declared_length: Option<u64>,
}

/// Parsed container header: magic, stream count and directory.
#[derive(Debug, Clone)]
pub struct ContainerHeader {
    directory: Vec<StreamDescriptor>,
}

impl ContainerHeader {
    /// Parses and validates the header region of `data`.
    ///
    /// Directory entries must not point into the header region, must not
    /// run past the end of the container, and their offsets must not
    /// decrease. Any violation fails the whole container.
    pub fn read(data: &[u8]) -> Result<Self, FormatError> {
        let container_size = data.len() as u64;

        if container_size < HEADER_LEN {
            return Err(FormatError::Truncated {
                expected: HEADER_LEN,
                actual: container_size,
            });
        }

        if data[..4] != SGB_MAGIC {
            let mut found = [0u8; 4];
            found.copy_from_slice(&data[..4]);
            return Err(FormatError::BadMagic { found });
        }

        let stream_count = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        let directory_end = HEADER_LEN + stream_count as u64 * DIRECTORY_ENTRY_LEN;

        if container_size < directory_end {
            return Err(FormatError::Truncated {
                expected: directory_end,
                actual: container_size,
            });
        }

        let mut directory = Vec::with_capacity(stream_count as usize);
        let mut previous = directory_end;

        for index in 0..stream_count as usize {
            let entry = HEADER_LEN as usize + index * DIRECTORY_ENTRY_LEN as usize;
            let offset = read_u32_be(data, entry) as u64;
            let length = read_u32_be(data, entry + 4) as u64;

            if offset < directory_end {
                return Err(FormatError::DescriptorInHeader {
                    index,
                    offset,
                    directory_end,
                });
            }

            // First entry is checked against the directory end above, so
            // only a decrease between neighbours can trip this.
            if offset < previous {
                return Err(FormatError::DescriptorOrder {
                    index,
                    offset,
                    previous,
                });
            }

            if offset + length > container_size {
                return Err(FormatError::DescriptorOutOfBounds {
                    index,
                    offset,
                    length,
                    container_size,
                });
            }

            directory.push(StreamDescriptor {
                index,
                offset,
                declared_length: if length == 0 { None } else { Some(length) },
            });
            previous = offset;
        }

        Ok(Self { directory })
    }

    pub fn stream_count(&self) -> usize {
        self.directory.len()
    }

    pub fn into_directory(self) -> Vec<StreamDescriptor> {
        self.directory
    }
}

fn read_u32_be(data: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

#[cfg(test)]
fn raw_container(stream_count: u32, entries: &[(u32, u32)], tail: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&SGB_MAGIC);
    data.extend_from_slice(&stream_count.to_be_bytes());
    for (offset, length) in entries {
        data.extend_from_slice(&offset.to_be_bytes());
        data.extend_from_slice(&length.to_be_bytes());
    }
    data.extend_from_slice(tail);
    data
}

#[test]
fn parses_directory() {
    let data = raw_container(2, &[(24, 4), (28, 0)], &[0xAA; 10]);
    let header = ContainerHeader::read(&data).unwrap();

    assert_eq!(header.stream_count(), 2);
    let directory = header.into_directory();
    assert_eq!(
        directory[0],
        StreamDescriptor {
            index: 0,
            offset: 24,
            declared_length: Some(4),
        }
    );
    assert_eq!(
        directory[1],
        StreamDescriptor {
            index: 1,
            offset: 28,
            declared_length: None,
        }
    );
}

#[test]
fn zero_streams() {
    let data = raw_container(0, &[], &[]);
    let header = ContainerHeader::read(&data).unwrap();
    assert_eq!(header.stream_count(), 0);
}

#[test]
fn rejects_bad_magic() {
    let mut data = raw_container(0, &[], &[]);
    data[0] = b'X';
    assert!(matches!(
        ContainerHeader::read(&data),
        Err(FormatError::BadMagic { found: [b'X', b'G', b'B', 0] })
    ));
}

#[test]
fn rejects_short_header() {
    assert!(matches!(
        ContainerHeader::read(&[0x53, 0x47]),
        Err(FormatError::Truncated { expected: 8, actual: 2 })
    ));
}

#[test]
fn rejects_truncated_directory() {
    // Claims 4 streams but carries bytes for barely one entry.
    let data = raw_container(4, &[(40, 0)], &[]);
    assert!(matches!(
        ContainerHeader::read(&data),
        Err(FormatError::Truncated { expected: 40, actual: 16 })
    ));
}

#[test]
fn rejects_offset_inside_directory() {
    let data = raw_container(1, &[(8, 4)], &[0xAA; 16]);
    assert!(matches!(
        ContainerHeader::read(&data),
        Err(FormatError::DescriptorInHeader { index: 0, offset: 8, directory_end: 16 })
    ));
}

#[test]
fn rejects_decreasing_offsets() {
    let data = raw_container(2, &[(28, 2), (24, 2)], &[0xAA; 10]);
    assert!(matches!(
        ContainerHeader::read(&data),
        Err(FormatError::DescriptorOrder { index: 1, offset: 24, previous: 28 })
    ));
}

#[test]
fn rejects_payload_past_end() {
    let data = raw_container(1, &[(16, 100)], &[0xAA; 4]);
    assert!(matches!(
        ContainerHeader::read(&data),
        Err(FormatError::DescriptorOutOfBounds {
            index: 0,
            offset: 16,
            length: 100,
            container_size: 20,
        })
    ));
}
