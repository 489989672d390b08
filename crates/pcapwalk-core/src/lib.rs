//! pcapwalk core library for streaming classic PCAP capture files.
//!
//! A [`CaptureSession`] validates the 24-byte global header once, then hands
//! out any number of [`CaptureCursor`]s. Each cursor reads records lazily
//! through its own file handle, so several cursors over the same file advance
//! independently and the file is never loaded whole. The wire-format codecs
//! in `capture` are pure functions over byte buffers and `Read` streams; all
//! file handling lives in `session`.
//!
//! Invariants:
//! - A packet's payload length always equals the record's captured length;
//!   a shortfall is reported as corruption, never padded or truncated.
//! - Byte order and timestamp resolution are fixed by the magic number and
//!   applied to the header and every record of the file.
//! - Clean end of file at a record boundary ends a cursor; it is not an error.
//!
//! # Examples
//! ```no_run
//! use pcapwalk_core::CaptureSession;
//!
//! let session = CaptureSession::open_path("capture.pcap")?;
//! let packets = session.get_all_packets()?;
//! println!("{} packets, link type {}", packets.len(), session.header().link_type);
//! # Ok::<(), pcapwalk_core::CaptureError>(())
//! ```

use std::fmt;

use pcap_parser::Linktype;
use time::OffsetDateTime;

pub mod capture;
mod error;
mod options;
mod session;
mod summary;

pub use capture::error::DecodeError;
pub use capture::{decode_file_header, decode_record, record_timestamp};
pub use error::CaptureError;
pub use options::DecodeOptions;
pub use session::{CaptureCursor, CaptureSession, CursorState};
pub use summary::{
    CaptureListing, CaptureSummary, HeaderSummary, InputInfo, ListingFilter, PacketSummary,
    summarize_capture,
};

/// Byte order of every multi-byte field in a capture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

/// Unit of the sub-second timestamp field in record headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampResolution {
    Micro,
    Nano,
}

/// Capture format version.
///
/// # Examples
/// ```
/// use pcapwalk_core::Version;
///
/// let version = Version { major: 2, minor: 4 };
/// assert!(version.is_supported());
/// assert_eq!(version.to_string(), "2.4");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

impl Version {
    pub const SUPPORTED: Version = Version {
        major: capture::layout::SUPPORTED_VERSION_MAJOR,
        minor: capture::layout::SUPPORTED_VERSION_MINOR,
    };

    pub fn is_supported(&self) -> bool {
        *self == Self::SUPPORTED
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// The two reserved header words, kept verbatim.
///
/// Older writers stored a timezone offset and timestamp accuracy here; the
/// values are never interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reserved {
    pub reserved1: [u8; 4],
    pub reserved2: [u8; 4],
}

/// Validated global header of a capture file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Magic number as read little-endian from offset 0.
    pub magic: u32,
    pub version: Version,
    pub reserved: Reserved,
    /// Per-packet capture ceiling. Zero is passed through unless decoding
    /// strictly.
    pub snap_len: u32,
    pub link_type: Linktype,
    /// FCS length in 16-bit units, when the header flags one as present.
    pub fcs: Option<u8>,
}

impl FileHeader {
    pub fn byte_order(&self) -> ByteOrder {
        match self.magic {
            capture::layout::MAGIC_MICRO_SWAPPED | capture::layout::MAGIC_NANO_SWAPPED => {
                ByteOrder::Big
            }
            _ => ByteOrder::Little,
        }
    }

    pub fn resolution(&self) -> TimestampResolution {
        match self.magic {
            capture::layout::MAGIC_NANO | capture::layout::MAGIC_NANO_SWAPPED => {
                TimestampResolution::Nano
            }
            _ => TimestampResolution::Micro,
        }
    }

    /// Whether fields are stored byte-swapped relative to the little-endian
    /// reading of the magic.
    pub fn is_swapped(&self) -> bool {
        self.byte_order() == ByteOrder::Big
    }
}

/// Record header of one packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketHeader {
    /// Capture time (UTC).
    pub timestamp: OffsetDateTime,
    pub ts_seconds: u32,
    /// Microseconds or nanoseconds, per the file's magic.
    pub ts_fraction: u32,
    /// Bytes of payload stored in the file.
    pub captured_len: u32,
    /// Length of the packet on the wire.
    pub original_len: u32,
}

/// One decoded record.
///
/// # Examples
/// ```
/// use pcapwalk_core::{Packet, PacketHeader, TimestampResolution, record_timestamp};
///
/// let packet = Packet {
///     header: PacketHeader {
///         timestamp: record_timestamp(1, 0, TimestampResolution::Micro),
///         ts_seconds: 1,
///         ts_fraction: 0,
///         captured_len: 2,
///         original_len: 2,
///     },
///     data: vec![0xca, 0xfe],
/// };
/// assert_eq!(packet.data.len(), packet.header.captured_len as usize);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: PacketHeader,
    pub data: Vec<u8>,
}
