use std::io::Read;

use pcap_parser::Linktype;
use time::{Duration, OffsetDateTime};
use tracing::{debug, trace, warn};

use super::error::DecodeError;
use super::layout;
use super::reader::{FieldReader, read_magic, read_up_to};
use crate::{
    ByteOrder, DecodeOptions, FileHeader, Packet, PacketHeader, Reserved, TimestampResolution,
    Version,
};

/// Decode and validate the 24-byte global header of a capture file.
///
/// The magic number is read little-endian; when it matches the byte-swapped
/// constant every following field (and every record in the file) is decoded
/// big-endian. Only format version 2.4 is accepted.
///
/// # Examples
/// ```
/// use pcapwalk_core::{ByteOrder, DecodeOptions, decode_file_header};
///
/// let mut bytes = Vec::new();
/// bytes.extend_from_slice(&0xa1b2_c3d4u32.to_be_bytes());
/// bytes.extend_from_slice(&2u16.to_be_bytes());
/// bytes.extend_from_slice(&4u16.to_be_bytes());
/// bytes.extend_from_slice(&[0u8; 8]);
/// bytes.extend_from_slice(&65535u32.to_be_bytes());
/// bytes.extend_from_slice(&1u32.to_be_bytes());
///
/// let header = decode_file_header(&bytes, &DecodeOptions::default())?;
/// assert_eq!(header.magic, 0xd4c3_b2a1);
/// assert_eq!(header.byte_order(), ByteOrder::Big);
/// assert_eq!(header.snap_len, 65535);
/// # Ok::<(), pcapwalk_core::DecodeError>(())
/// ```
///
/// # Errors
/// Returns `DecodeError::HeaderTooShort` before interpreting any field when
/// fewer than 24 bytes are supplied, `UnknownMagic` or `UnsupportedVersion`
/// for structurally invalid headers, and `ZeroSnapLen` in strict mode.
pub fn decode_file_header(
    bytes: &[u8],
    options: &DecodeOptions,
) -> Result<FileHeader, DecodeError> {
    if bytes.len() < layout::FILE_HEADER_LEN {
        return Err(DecodeError::HeaderTooShort {
            actual: bytes.len(),
        });
    }
    let magic = read_magic(bytes).ok_or(DecodeError::HeaderTooShort {
        actual: bytes.len(),
    })?;
    let (order, resolution) =
        classify_magic(magic, options).ok_or(DecodeError::UnknownMagic { magic })?;

    let reader = FieldReader::file_header(bytes, order)?;
    let version = Version {
        major: reader.read_u16(layout::VERSION_MAJOR_RANGE)?,
        minor: reader.read_u16(layout::VERSION_MINOR_RANGE)?,
    };
    if !version.is_supported() {
        return Err(DecodeError::UnsupportedVersion {
            major: version.major,
            minor: version.minor,
        });
    }

    let reserved = Reserved {
        reserved1: reader.read_array(layout::RESERVED1_RANGE)?,
        reserved2: reader.read_array(layout::RESERVED2_RANGE)?,
    };

    let snap_len = reader.read_u32(layout::SNAP_LEN_RANGE)?;
    if snap_len == 0 {
        if options.is_strict() {
            return Err(DecodeError::ZeroSnapLen);
        }
        warn!("capture declares a zero snap length; passing through");
    }

    let link_word = reader.read_u32(layout::LINK_TYPE_WORD_RANGE)?;
    let link_type = Linktype((link_word & layout::LINK_TYPE_MASK) as i32);
    let fcs = (link_word & layout::FCS_PRESENT_BIT != 0)
        .then(|| (link_word >> layout::FCS_LEN_SHIFT) as u8);

    debug!(
        magic,
        ?order,
        ?resolution,
        snap_len,
        %link_type,
        "decoded capture file header"
    );

    Ok(FileHeader {
        magic,
        version,
        reserved,
        snap_len,
        link_type,
        fcs,
    })
}

/// Decode one record (16-byte header plus payload) from `reader`.
///
/// Returns `Ok(None)` when the stream is exhausted exactly at a record
/// boundary. The payload is read up to the declared captured length and never
/// padded or truncated.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use pcapwalk_core::{DecodeOptions, decode_file_header, decode_record};
///
/// let mut file = Vec::new();
/// file.extend_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
/// file.extend_from_slice(&[2, 0, 4, 0]);
/// file.extend_from_slice(&[0u8; 8]);
/// file.extend_from_slice(&65535u32.to_le_bytes());
/// file.extend_from_slice(&1u32.to_le_bytes());
/// let options = DecodeOptions::default();
/// let header = decode_file_header(&file, &options)?;
///
/// let mut record = Vec::new();
/// for field in [10u32, 500, 3, 60] {
///     record.extend_from_slice(&field.to_le_bytes());
/// }
/// record.extend_from_slice(&[0xaa, 0xbb, 0xcc]);
/// let mut stream = Cursor::new(record);
///
/// let packet = decode_record(&mut stream, &header, &options)?.expect("one record");
/// assert_eq!(packet.data, vec![0xaa, 0xbb, 0xcc]);
/// assert_eq!(packet.header.original_len, 60);
/// assert!(decode_record(&mut stream, &header, &options)?.is_none());
/// # Ok::<(), pcapwalk_core::DecodeError>(())
/// ```
///
/// # Errors
/// Returns `RecordHeaderTooShort` when the stream ends inside a record
/// header, `PayloadTooShort` when fewer payload bytes than declared remain,
/// and the strict-mode length errors when enabled.
pub fn decode_record<R: Read>(
    reader: &mut R,
    header: &FileHeader,
    options: &DecodeOptions,
) -> Result<Option<Packet>, DecodeError> {
    let mut raw = [0u8; layout::RECORD_HEADER_LEN];
    let read = read_up_to(reader, &mut raw)?;
    if read == 0 {
        return Ok(None);
    }

    let fields = FieldReader::record_header(&raw[..read], header.byte_order())?;
    let ts_seconds = fields.read_u32(layout::TS_SECONDS_RANGE)?;
    let ts_fraction = fields.read_u32(layout::TS_FRACTION_RANGE)?;
    let captured_len = fields.read_u32(layout::CAPTURED_LEN_RANGE)?;
    let original_len = fields.read_u32(layout::ORIGINAL_LEN_RANGE)?;

    check_lengths(header, options, captured_len, original_len)?;

    let mut data = Vec::new();
    let actual = reader
        .by_ref()
        .take(u64::from(captured_len))
        .read_to_end(&mut data)?;
    if actual != captured_len as usize {
        return Err(DecodeError::PayloadTooShort {
            expected: captured_len,
            actual,
        });
    }

    trace!(ts_seconds, ts_fraction, captured_len, original_len, "decoded record");

    Ok(Some(Packet {
        header: PacketHeader {
            timestamp: record_timestamp(ts_seconds, ts_fraction, header.resolution()),
            ts_seconds,
            ts_fraction,
            captured_len,
            original_len,
        },
        data,
    }))
}

/// Convert a record's seconds and sub-second fraction into a UTC timestamp.
///
/// # Examples
/// ```
/// use pcapwalk_core::{TimestampResolution, record_timestamp};
///
/// let ts = record_timestamp(1, 500_000, TimestampResolution::Micro);
/// assert_eq!(ts.unix_timestamp_nanos(), 1_500_000_000);
/// ```
pub fn record_timestamp(
    seconds: u32,
    fraction: u32,
    resolution: TimestampResolution,
) -> OffsetDateTime {
    let fraction_nanos = match resolution {
        TimestampResolution::Micro => {
            i64::from(fraction) * i64::from(layout::NANOS_PER_SECOND / layout::MICROS_PER_SECOND)
        }
        TimestampResolution::Nano => i64::from(fraction),
    };
    let nanos = i64::from(seconds) * i64::from(layout::NANOS_PER_SECOND) + fraction_nanos;
    OffsetDateTime::UNIX_EPOCH.saturating_add(Duration::nanoseconds(nanos))
}

fn classify_magic(
    magic: u32,
    options: &DecodeOptions,
) -> Option<(ByteOrder, TimestampResolution)> {
    match magic {
        layout::MAGIC_MICRO => Some((ByteOrder::Little, TimestampResolution::Micro)),
        layout::MAGIC_MICRO_SWAPPED => Some((ByteOrder::Big, TimestampResolution::Micro)),
        layout::MAGIC_NANO if options.accepts_nanosecond_magic() => {
            Some((ByteOrder::Little, TimestampResolution::Nano))
        }
        layout::MAGIC_NANO_SWAPPED if options.accepts_nanosecond_magic() => {
            Some((ByteOrder::Big, TimestampResolution::Nano))
        }
        _ => None,
    }
}

fn check_lengths(
    header: &FileHeader,
    options: &DecodeOptions,
    captured: u32,
    original: u32,
) -> Result<(), DecodeError> {
    if !options.is_strict() {
        return Ok(());
    }
    if captured > original {
        return Err(DecodeError::CapturedExceedsOriginal { captured, original });
    }
    if header.snap_len != 0 && captured > header.snap_len {
        return Err(DecodeError::CapturedExceedsSnapLen {
            captured,
            snap_len: header.snap_len,
        });
    }
    Ok(())
}
