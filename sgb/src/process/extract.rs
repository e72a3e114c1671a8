//! Stream payload extraction.
//!
//! Extraction resolves each descriptor to a byte range, borrows the
//! payload out of the container buffer and validates that it opens with
//! an AC-3 sync frame. Streams fail independently: one corrupt payload
//! never takes down the rest of a container.

use std::num::NonZeroUsize;

use crate::process::classify::{AudioType, RoleTable};
use crate::process::read::Container;
use crate::structs::ac3::SyncInfo;
use crate::structs::header::StreamDescriptor;
use crate::utils::errors::ExtractError;

/// A validated stream payload borrowed from its container.
#[derive(Debug, Clone)]
pub struct ExtractedStream<'a> {
    /// Zero-based directory position.
    pub index: usize,
    /// Role assigned by the classifier.
    pub role: AudioType,
    /// Sync info of the first frame.
    pub sync: SyncInfo,
    /// The raw AC-3 elementary stream bytes.
    pub payload: &'a [u8],
    /// Container name, used as the output name stem.
    pub source: &'a str,
}

impl ExtractedStream<'_> {
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Extracts a single stream from `container`.
///
/// The payload end comes from the declared length when the directory has
/// one, otherwise from the next stream's offset, or the container end for
/// the last stream. The payload must open with a valid sync frame.
pub fn extract<'a>(
    container: &'a Container,
    descriptor: &StreamDescriptor,
    role: AudioType,
) -> Result<ExtractedStream<'a>, ExtractError> {
    let index = descriptor.index;
    let container_size = container.len() as u64;

    let start = descriptor.offset;
    let end = match descriptor.declared_length {
        Some(length) => start + length,
        None => container
            .streams()
            .get(index + 1)
            .map(|next| next.offset)
            .unwrap_or(container_size),
    };

    // Descriptors from an opened container always pass these two checks.
    // Hand-built descriptors do not get to bypass them.
    if start > end || end > container_size {
        return Err(ExtractError::PayloadOutOfBounds {
            index,
            start,
            end,
            container_size,
        });
    }
    if start == end {
        return Err(ExtractError::EmptyPayload { index });
    }

    let payload = &container.data()[start as usize..end as usize];
    let sync = SyncInfo::read(payload)
        .map_err(|source| ExtractError::InvalidPayload { index, source })?;

    Ok(ExtractedStream {
        index,
        role,
        sync,
        payload,
        source: container.name(),
    })
}

/// Extracts every stream in directory order.
///
/// Returns one result per descriptor so callers can account for every
/// stream, failed or not.
pub fn extract_all<'a>(
    container: &'a Container,
    table: &RoleTable,
) -> Vec<Result<ExtractedStream<'a>, ExtractError>> {
    let total = container.stream_count();

    container
        .streams()
        .iter()
        .map(|descriptor| extract(container, descriptor, table.classify(descriptor.index, total)))
        .collect()
}

/// Extracts every stream using up to `jobs` worker threads.
///
/// The directory is split into contiguous chunks, one per worker, and the
/// per-chunk results are stitched back together in directory order. Output
/// is identical to [`extract_all`] regardless of `jobs`.
pub fn extract_all_parallel<'a>(
    container: &'a Container,
    table: &RoleTable,
    jobs: NonZeroUsize,
) -> Vec<Result<ExtractedStream<'a>, ExtractError>> {
    let descriptors = container.streams();
    let total = descriptors.len();
    let jobs = jobs.get().min(total);

    if jobs <= 1 {
        return extract_all(container, table);
    }

    let chunk_len = total.div_ceil(jobs);
    let mut results = Vec::with_capacity(total);

    std::thread::scope(|scope| {
        let workers: Vec<_> = descriptors
            .chunks(chunk_len)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|descriptor| {
                            extract(container, descriptor, table.classify(descriptor.index, total))
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for worker in workers {
            match worker.join() {
                Ok(chunk_results) => results.extend(chunk_results),
                Err(payload) => std::panic::resume_unwind(payload),
            }
        }
    });

    results
}

#[cfg(test)]
fn example_container() -> Container {
    Container::from_bytes("demo", crate::process::EXAMPLE_DATA.to_vec()).unwrap()
}

#[test]
fn extracts_streams_with_roles() {
    let container = example_container();
    let results = extract_all(&container, &RoleTable::default());

    assert_eq!(results.len(), 3);
    let roles: Vec<_> = results
        .iter()
        .map(|result| result.as_ref().unwrap().role)
        .collect();
    assert_eq!(roles, [AudioType::Music, AudioType::Ambient, AudioType::Demo]);

    for result in &results {
        let stream = result.as_ref().unwrap();
        assert_eq!(stream.len(), 8);
        assert_eq!(stream.payload[..2], [0x0B, 0x77]);
        assert_eq!(stream.source, "demo");
    }
}

#[test]
fn infers_length_of_last_stream() {
    use crate::process::{build_container, sync_payload};

    // Last entry declares length zero, so its end is the container end.
    let payloads = [sync_payload(32), sync_payload(48)];
    let mut data = build_container(&[&payloads[0], &payloads[1]]);
    let last_entry_length = 8 + 8 + 4;
    data[last_entry_length..last_entry_length + 4].copy_from_slice(&0u32.to_be_bytes());

    let container = Container::from_bytes("bank", data).unwrap();
    assert_eq!(container.streams()[1].declared_length, None);

    let stream = extract(&container, &container.streams()[1], AudioType::Ambient).unwrap();
    assert_eq!(stream.len(), 48);
}

#[test]
fn infers_length_from_next_offset() {
    use crate::process::{build_container, sync_payload};

    // Middle entry declares length zero, so its end is the next offset.
    let payloads = [sync_payload(16), sync_payload(24), sync_payload(32)];
    let mut data = build_container(&[&payloads[0], &payloads[1], &payloads[2]]);
    let middle_entry_length = 8 + 8 + 4;
    data[middle_entry_length..middle_entry_length + 4].copy_from_slice(&0u32.to_be_bytes());

    let container = Container::from_bytes("bank", data).unwrap();
    assert_eq!(container.streams()[1].declared_length, None);

    let stream = extract(&container, &container.streams()[1], AudioType::Ambient).unwrap();
    assert_eq!(stream.payload, &payloads[1][..]);
}

#[test]
fn corrupt_stream_fails_alone() {
    use crate::process::{build_container, sync_payload};

    // Five streams, the middle one overwritten with garbage.
    let payloads: Vec<Vec<u8>> = (0..5).map(|_| sync_payload(24)).collect();
    let mut borrowed: Vec<&[u8]> = payloads.iter().map(Vec::as_slice).collect();
    let garbage = vec![0xFFu8; 24];
    borrowed[2] = &garbage;

    let container = Container::from_bytes("bank", build_container(&borrowed)).unwrap();
    let results = extract_all(&container, &RoleTable::default());

    assert_eq!(results.len(), 5);
    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 4);
    match &results[2] {
        Err(error) => assert_eq!(error.index(), 2),
        Ok(_) => panic!("corrupt stream extracted"),
    }
}

#[test]
fn empty_payload_is_reported() {
    use crate::process::{build_container, sync_payload};

    let payload = sync_payload(16);
    let empty: &[u8] = &[];
    let container = Container::from_bytes("bank", build_container(&[&payload, empty])).unwrap();
    let results = extract_all(&container, &RoleTable::default());

    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(ExtractError::EmptyPayload { index: 1 })
    ));
}

#[test]
fn foreign_descriptor_is_bounds_checked() {
    let container = example_container();
    let descriptor = StreamDescriptor {
        index: 9,
        offset: 1024,
        declared_length: Some(64),
    };

    assert!(matches!(
        extract(&container, &descriptor, AudioType::Unknown),
        Err(ExtractError::PayloadOutOfBounds { index: 9, .. })
    ));
}

#[test]
fn parallel_matches_sequential() {
    use crate::process::{build_container, sync_payload};

    let payloads: Vec<Vec<u8>> = (0..7).map(|i| sync_payload(16 + i * 4)).collect();
    let mut borrowed: Vec<&[u8]> = payloads.iter().map(Vec::as_slice).collect();
    let garbage = vec![0u8; 16];
    borrowed[4] = &garbage;

    let container = Container::from_bytes("bank", build_container(&borrowed)).unwrap();
    let table = RoleTable::default();

    let sequential = extract_all(&container, &table);
    for jobs in [1, 2, 3, 8] {
        let parallel =
            extract_all_parallel(&container, &table, NonZeroUsize::new(jobs).unwrap());

        assert_eq!(parallel.len(), sequential.len());
        for (a, b) in parallel.iter().zip(&sequential) {
            match (a, b) {
                (Ok(x), Ok(y)) => {
                    assert_eq!(x.index, y.index);
                    assert_eq!(x.role, y.role);
                    assert_eq!(x.payload, y.payload);
                }
                (Err(x), Err(y)) => assert_eq!(x.index(), y.index()),
                _ => panic!("parallel and sequential results diverge"),
            }
        }
    }
}

#[test]
fn zero_stream_container_extracts_nothing() {
    let container = Container::from_bytes("empty", crate::process::build_container(&[])).unwrap();

    assert!(extract_all(&container, &RoleTable::default()).is_empty());
    assert!(
        extract_all_parallel(&container, &RoleTable::default(), NonZeroUsize::MIN).is_empty()
    );
}
