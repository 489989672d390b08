use std::io::{ErrorKind, Read};

use super::error::DecodeError;
use super::layout;
use crate::ByteOrder;

/// Bounds-checked field access over a fixed header buffer.
///
/// Multi-byte fields are decoded with the byte order detected from the magic
/// number. A short buffer is reported with the error matching the header kind
/// being read.
pub struct FieldReader<'a> {
    bytes: &'a [u8],
    order: ByteOrder,
    short: fn(usize) -> DecodeError,
}

impl<'a> FieldReader<'a> {
    pub fn file_header(bytes: &'a [u8], order: ByteOrder) -> Result<Self, DecodeError> {
        let reader = Self {
            bytes,
            order,
            short: |actual| DecodeError::HeaderTooShort { actual },
        };
        reader.require_len(layout::FILE_HEADER_LEN)?;
        Ok(reader)
    }

    pub fn record_header(bytes: &'a [u8], order: ByteOrder) -> Result<Self, DecodeError> {
        let reader = Self {
            bytes,
            order,
            short: |actual| DecodeError::RecordHeaderTooShort { actual },
        };
        reader.require_len(layout::RECORD_HEADER_LEN)?;
        Ok(reader)
    }

    pub fn require_len(&self, needed: usize) -> Result<(), DecodeError> {
        if self.bytes.len() < needed {
            return Err((self.short)(self.bytes.len()));
        }
        Ok(())
    }

    pub fn read_slice(&self, range: std::ops::Range<usize>) -> Result<&'a [u8], DecodeError> {
        self.bytes
            .get(range)
            .ok_or_else(|| (self.short)(self.bytes.len()))
    }

    pub fn read_array<const N: usize>(
        &self,
        range: std::ops::Range<usize>,
    ) -> Result<[u8; N], DecodeError> {
        let bytes = self.read_slice(range)?;
        bytes
            .try_into()
            .map_err(|_| (self.short)(self.bytes.len()))
    }

    pub fn read_u16(&self, range: std::ops::Range<usize>) -> Result<u16, DecodeError> {
        let bytes = self.read_array::<2>(range)?;
        Ok(match self.order {
            ByteOrder::Little => u16::from_le_bytes(bytes),
            ByteOrder::Big => u16::from_be_bytes(bytes),
        })
    }

    pub fn read_u32(&self, range: std::ops::Range<usize>) -> Result<u32, DecodeError> {
        let bytes = self.read_array::<4>(range)?;
        Ok(match self.order {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        })
    }
}

/// Read the magic number as a little-endian u32 from the start of `bytes`.
///
/// # Examples
/// This helper is part of an internal module, so the example is marked as
/// text example.
/// ```text
/// use pcapwalk_core::capture::reader::read_magic;
///
/// assert_eq!(read_magic(&[0xd4, 0xc3, 0xb2, 0xa1]), Some(0xa1b2_c3d4));
/// assert_eq!(read_magic(&[0xd4, 0xc3]), None);
/// ```
pub fn read_magic(bytes: &[u8]) -> Option<u32> {
    let magic: [u8; 4] = bytes.get(layout::MAGIC_RANGE)?.try_into().ok()?;
    Some(u32::from_le_bytes(magic))
}

/// Fill `buf` from `reader`, stopping early only at end of stream.
///
/// Returns the number of bytes read; a value smaller than `buf.len()` means
/// the stream ended. Interrupted reads are retried.
pub fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
