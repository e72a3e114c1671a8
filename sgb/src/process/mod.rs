/// Container reading and directory validation.
///
/// Provides [`Container`](read::Container) for loading `.sgb` files and
/// exposing their [`StreamDescriptor`](crate::structs::header::StreamDescriptor) directory.
pub mod read;

/// Stream payload extraction.
///
/// Provides [`extract_all`](extract::extract_all) and friends for turning
/// descriptors into validated [`ExtractedStream`](extract::ExtractedStream) payloads.
pub mod extract;

/// Positional stream classification.
///
/// Provides the [`RoleTable`](classify::RoleTable) mapping directory
/// positions to [`AudioType`](classify::AudioType) roles.
pub mod classify;

/// Output naming and atomic file writing.
///
/// Provides the [`Writer`](write::Writer) that persists extracted streams
/// under deterministic names.
pub mod write;

/// A complete 56-byte container holding three one-frame-prefix streams.
/// The third directory entry carries the zero length sentinel.
pub const EXAMPLE_DATA: &[u8] = &[
    0x53, 0x47, 0x42, 0x00, 0x00, 0x00, 0x00, 0x03, // magic, stream count 3
    0x00, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00, 0x08, // stream 0: offset 32, length 8
    0x00, 0x00, 0x00, 0x28, 0x00, 0x00, 0x00, 0x08, // stream 1: offset 40, length 8
    0x00, 0x00, 0x00, 0x30, 0x00, 0x00, 0x00, 0x00, // stream 2: offset 48, length unknown
    0x0B, 0x77, 0x00, 0x00, 0x02, 0x40, 0x00, 0x00,
    0x0B, 0x77, 0x00, 0x00, 0x02, 0x40, 0x00, 0x00,
    0x0B, 0x77, 0x00, 0x00, 0x02, 0x40, 0x00, 0x00,
];

/// Builds a container around the given payloads with declared lengths.
#[cfg(test)]
pub(crate) fn build_container(payloads: &[&[u8]]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&crate::structs::header::SGB_MAGIC);
    data.extend_from_slice(&(payloads.len() as u32).to_be_bytes());

    let mut offset = 8 + payloads.len() as u32 * 8;
    for payload in payloads {
        data.extend_from_slice(&offset.to_be_bytes());
        data.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        offset += payload.len() as u32;
    }
    for payload in payloads {
        data.extend_from_slice(payload);
    }
    data
}

/// A payload of `len` bytes opening with a valid 48kHz sync frame prefix.
#[cfg(test)]
pub(crate) fn sync_payload(len: usize) -> Vec<u8> {
    let mut payload = vec![0u8; len.max(6)];
    payload[..6].copy_from_slice(&[0x0B, 0x77, 0x00, 0x00, 0x02, 0x40]);
    payload
}
