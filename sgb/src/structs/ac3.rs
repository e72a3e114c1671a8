//! AC-3 sync frame structures.
//!
//! ## Sync Frame Prefix
//!
//! Every AC-3 sync frame starts with `syncinfo` followed by the first two
//! BSI fields:
//!
//! | Field      | Bits | Meaning                       |
//! |------------|------|-------------------------------|
//! | syncword   | 16   | always 0x0B77                 |
//! | crc1       | 16   | CRC over the first 5/8 frame  |
//! | fscod      | 2    | sample rate code              |
//! | frmsizecod | 6    | frame size code               |
//! | bsid       | 5    | bitstream id                  |
//! | bsmod      | 3    | bitstream mode                |
//!
//! The frame length in bytes follows from `fscod` and `frmsizecod` alone,
//! which is enough to walk a stream frame by frame without decoding audio.

use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::SyncError;

/// 16-bit sync word (0x0B77) opening every AC-3 sync frame.
pub const SYNC_WORD: u16 = 0x0B77;

/// Bytes needed to read the sync frame prefix.
pub const SYNC_FRAME_PREFIX_LEN: usize = 6;

/// PCM samples carried by one sync frame, independent of sample rate.
pub const SAMPLES_PER_FRAME: u32 = 1536;

/// Nominal bitrates in kbit/s, indexed by `frmsizecod >> 1`.
const BITRATE_KBPS: [u32; 19] = [
    32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 448, 512, 576, 640,
];

/// Validated fields from one AC-3 sync frame prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncInfo {
    pub fscod: u8,
    pub frmsizecod: u8,
    pub bsid: u8,
    pub bsmod: u8,
}

impl SyncInfo {
    /// Parses the sync frame prefix at the start of `payload`.
    ///
    /// Rejects a wrong sync word, the reserved sample rate code 3, frame
    /// size codes past the table and bitstream ids above 16. Annex D/E
    /// variants (bsid 11 through 16) pack their headers compatibly and
    /// pass through unchanged.
    pub fn read(payload: &[u8]) -> Result<Self, SyncError> {
        if payload.len() < SYNC_FRAME_PREFIX_LEN {
            return Err(SyncError::ShortPayload { len: payload.len() });
        }

        let (syncword, fscod, frmsizecod, bsid, bsmod) =
            read_prefix(payload).map_err(|_| SyncError::ShortPayload { len: payload.len() })?;

        if syncword != SYNC_WORD {
            return Err(SyncError::BadSyncWord { found: syncword });
        }
        if fscod == 3 {
            return Err(SyncError::ReservedSampleRate);
        }
        if frmsizecod as usize >= BITRATE_KBPS.len() * 2 {
            return Err(SyncError::BadFrameSizeCode { code: frmsizecod });
        }
        if bsid > 16 {
            return Err(SyncError::BadBsid { bsid });
        }

        Ok(Self {
            fscod,
            frmsizecod,
            bsid,
            bsmod,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        match self.fscod {
            0 => 48_000,
            1 => 44_100,
            _ => 32_000,
        }
    }

    pub fn bitrate_kbps(&self) -> u32 {
        BITRATE_KBPS[(self.frmsizecod >> 1) as usize]
    }

    /// Sync frame length in bytes.
    ///
    /// The frame size tables count 16-bit words: `2 * bitrate` words at
    /// 48kHz, `3 * bitrate` words at 32kHz. At 44.1kHz the rate does not
    /// divide evenly and odd frame size codes pad by one word.
    pub fn frame_len(&self) -> usize {
        let rate = self.bitrate_kbps() as usize;
        let words = match self.fscod {
            0 => 2 * rate,
            1 => rate * 320 / 147 + (self.frmsizecod & 1) as usize,
            _ => 3 * rate,
        };
        words * 2
    }
}

fn read_prefix(payload: &[u8]) -> std::io::Result<(u16, u8, u8, u8, u8)> {
    let mut bs = BsIoSliceReader::from_slice(payload);

    let syncword = bs.get_n(16)?;
    // crc1 covers the first five eighths of the frame and is not checked here.
    bs.skip_n(16)?;
    let fscod = bs.get_n(2)?;
    let frmsizecod = bs.get_n(6)?;
    let bsid = bs.get_n(5)?;
    let bsmod = bs.get_n(3)?;

    Ok((syncword, fscod, frmsizecod, bsid, bsmod))
}

/// Per-stream statistics gathered by walking sync frames back to back.
#[derive(Debug, Clone, Copy)]
pub struct StreamStats {
    /// Sync info of the first frame.
    pub sync: SyncInfo,
    /// Number of complete sync frames.
    pub frames: usize,
    /// Bytes covered by those frames. Anything past this is trailing data.
    pub bytes: usize,
}

impl StreamStats {
    /// Walks `payload` frame by frame from the start.
    ///
    /// The walk stops at the first byte that does not open a valid sync
    /// frame, or when the last frame would run past the end of the
    /// payload. Only the first frame has to be valid.
    pub fn scan(payload: &[u8]) -> Result<Self, SyncError> {
        let sync = SyncInfo::read(payload)?;

        let mut frames = 0usize;
        let mut pos = 0usize;

        while pos < payload.len() {
            let Ok(info) = SyncInfo::read(&payload[pos..]) else {
                break;
            };
            let len = info.frame_len();
            if payload.len() - pos < len {
                break;
            }
            frames += 1;
            pos += len;
        }

        Ok(Self {
            sync,
            frames,
            bytes: pos,
        })
    }

    /// Playback duration of the complete frames in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 * SAMPLES_PER_FRAME as f64 / self.sync.sample_rate() as f64
    }
}

// fscod 0 (48kHz), frmsizecod 2 (40 kbps), bsid 8, bsmod 0.
#[cfg(test)]
const PREFIX_48K_40KBPS: [u8; 6] = [0x0B, 0x77, 0x00, 0x00, 0x02, 0x40];

#[cfg(test)]
fn prefix(fscod: u8, frmsizecod: u8, bsid: u8) -> Vec<u8> {
    vec![0x0B, 0x77, 0x00, 0x00, (fscod << 6) | frmsizecod, bsid << 3]
}

#[test]
fn parses_prefix_fields() {
    let sync = SyncInfo::read(&PREFIX_48K_40KBPS).unwrap();
    assert_eq!(
        sync,
        SyncInfo {
            fscod: 0,
            frmsizecod: 2,
            bsid: 8,
            bsmod: 0,
        }
    );
    assert_eq!(sync.sample_rate(), 48_000);
    assert_eq!(sync.bitrate_kbps(), 40);
    assert_eq!(sync.frame_len(), 160);
}

#[test]
fn frame_len_all_rates() {
    // 448 kbps at 48kHz: 896 words.
    assert_eq!(SyncInfo::read(&prefix(0, 30, 8)).unwrap().frame_len(), 1792);
    // 448 kbps at 32kHz: 1344 words.
    assert_eq!(SyncInfo::read(&prefix(2, 30, 8)).unwrap().frame_len(), 2688);
    // 448 kbps at 44.1kHz: 975 words even, 976 words odd.
    assert_eq!(SyncInfo::read(&prefix(1, 30, 8)).unwrap().frame_len(), 1950);
    assert_eq!(SyncInfo::read(&prefix(1, 31, 8)).unwrap().frame_len(), 1952);
}

#[test]
fn rejects_bad_sync_word() {
    let mut data = PREFIX_48K_40KBPS;
    data[0] = 0x0C;
    assert!(matches!(
        SyncInfo::read(&data),
        Err(SyncError::BadSyncWord { found: 0x0C77 })
    ));
}

#[test]
fn rejects_reserved_sample_rate() {
    assert!(matches!(
        SyncInfo::read(&prefix(3, 2, 8)),
        Err(SyncError::ReservedSampleRate)
    ));
}

#[test]
fn rejects_frame_size_code_out_of_range() {
    assert!(matches!(
        SyncInfo::read(&prefix(0, 38, 8)),
        Err(SyncError::BadFrameSizeCode { code: 38 })
    ));
    assert!(SyncInfo::read(&prefix(0, 37, 8)).is_ok());
}

#[test]
fn rejects_bsid_out_of_range() {
    assert!(matches!(
        SyncInfo::read(&prefix(0, 2, 17)),
        Err(SyncError::BadBsid { bsid: 17 })
    ));
    assert!(SyncInfo::read(&prefix(0, 2, 16)).is_ok());
}

#[test]
fn rejects_short_payload() {
    assert!(matches!(
        SyncInfo::read(&[0x0B, 0x77, 0x00]),
        Err(SyncError::ShortPayload { len: 3 })
    ));
}

#[test]
fn scan_counts_whole_frames() {
    // Two complete 160-byte frames plus a truncated third.
    let mut payload = Vec::new();
    for _ in 0..2 {
        let mut frame = vec![0u8; 160];
        frame[..6].copy_from_slice(&PREFIX_48K_40KBPS);
        payload.extend_from_slice(&frame);
    }
    payload.extend_from_slice(&PREFIX_48K_40KBPS);

    let stats = StreamStats::scan(&payload).unwrap();
    assert_eq!(stats.frames, 2);
    assert_eq!(stats.bytes, 320);
    assert_eq!(stats.sync.sample_rate(), 48_000);
}

#[test]
fn scan_stops_at_garbage() {
    let mut payload = vec![0u8; 160];
    payload[..6].copy_from_slice(&PREFIX_48K_40KBPS);
    payload.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

    let stats = StreamStats::scan(&payload).unwrap();
    assert_eq!(stats.frames, 1);
    assert_eq!(stats.bytes, 160);
}

#[test]
fn scan_requires_leading_sync() {
    assert!(StreamStats::scan(&[0u8; 32]).is_err());
}

#[test]
fn duration_follows_sample_rate() {
    let stats = StreamStats {
        sync: SyncInfo::read(&PREFIX_48K_40KBPS).unwrap(),
        frames: 125,
        bytes: 125 * 160,
    };
    assert!((stats.duration_secs() - 4.0).abs() < 1e-9);
}
