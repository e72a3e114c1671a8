//! Bitstream reading utilities.
//!
//! Thin wrapper around `bitstream_io` used to pull the bit-packed fields
//! out of AC-3 sync frame headers.

use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader, UnsignedInteger};

#[derive(Debug)]
pub struct BitstreamIoReader<R: io::Read + io::Seek> {
    bs: BitReader<R, BigEndian>,
    len: u64,
}

pub type BsIoSliceReader<'a> = BitstreamIoReader<io::Cursor<&'a [u8]>>;

impl<R> BitstreamIoReader<R>
where
    R: io::Read + io::Seek,
{
    pub fn new(read: R, len_bytes: u64) -> Self {
        Self {
            bs: BitReader::new(read),
            len: len_bytes << 3,
        }
    }

    /// Reads `n` bits as an unsigned value. All header fields fit in 16 bits,
    /// so EOF reporting is the only concern beyond the raw read.
    #[inline(always)]
    pub fn get_n<I: UnsignedInteger>(&mut self, n: u32) -> io::Result<I> {
        match self.bs.read_unsigned_var(n) {
            Ok(val) => Ok(val),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "get_n({}): out of bounds bits at {}",
                    n,
                    self.bs.position_in_bits().unwrap_or(0)
                ),
            )),
            Err(e) => Err(e),
        }
    }

    #[inline(always)]
    pub fn skip_n(&mut self, n: u32) -> io::Result<()> {
        self.bs.skip(n)
    }

    #[inline(always)]
    pub fn available(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits().map(|pos| self.len - pos)
    }
}

impl<'a> BsIoSliceReader<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        let len = buf.len() as u64;
        let read = io::Cursor::new(buf);

        Self::new(read, len)
    }
}

#[test]
fn read_packed_fields() {
    // 0x0B77 followed by 0b00_000110 (fscod 0, frmsizecod 6).
    let mut bs = BsIoSliceReader::from_slice(&[0x0B, 0x77, 0x06]);

    assert_eq!(bs.get_n::<u16>(16).unwrap(), 0x0B77);
    assert_eq!(bs.get_n::<u8>(2).unwrap(), 0);
    assert_eq!(bs.get_n::<u8>(6).unwrap(), 6);
    assert_eq!(bs.available().unwrap(), 0);
    assert!(bs.get_n::<u8>(1).is_err());
}
