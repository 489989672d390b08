//! Serializable views of a capture for reporting.
//!
//! Summaries stream through one cursor; only the selected packet summaries
//! are kept in memory, never payloads.

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{ByteOrder, CaptureError, CaptureSession, FileHeader, Packet, TimestampResolution};

/// Report over one capture file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureListing {
    pub input: InputInfo,
    pub header: HeaderSummary,
    pub capture_summary: CaptureSummary,
    /// Selected packets in file order.
    pub packets: Vec<PacketSummary>,
}

/// Input capture metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    pub path: String,
    pub bytes: u64,
}

/// Global header fields in display form.
///
/// # Examples
/// ```
/// use pcapwalk_core::{ByteOrder, FileHeader, HeaderSummary, Reserved, Version};
/// use pcap_parser::Linktype;
///
/// let header = FileHeader {
///     magic: 0xd4c3_b2a1,
///     version: Version { major: 2, minor: 4 },
///     reserved: Reserved::default(),
///     snap_len: 65535,
///     link_type: Linktype::ETHERNET,
///     fcs: None,
/// };
/// let summary = HeaderSummary::from_header(&header);
/// assert_eq!(summary.magic, "0xd4c3b2a1");
/// assert_eq!(summary.byte_order, "big");
/// assert_eq!(summary.link_type_name, "ETHERNET");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderSummary {
    pub magic: String,
    pub version: String,
    pub byte_order: String,
    pub timestamp_resolution: String,
    pub snap_len: u32,
    pub link_type: i32,
    pub link_type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcs_len: Option<u8>,
}

/// Totals across every record of the capture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureSummary {
    pub packets_total: u64,
    pub bytes_captured: u64,
    /// RFC3339 timestamp of the first packet (if any).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the last packet (if any).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Per-packet metadata (no payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketSummary {
    pub ordinal: u64,
    pub timestamp: String,
    pub captured_len: u32,
    pub original_len: u32,
    /// Captured fewer bytes than were on the wire.
    pub truncated: bool,
}

/// Which packets a listing keeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListingFilter {
    /// Keep at most this many packet summaries.
    pub limit: Option<usize>,
    /// Keep only packets whose payload is shorter than this many bytes.
    pub max_len: Option<usize>,
}

impl ListingFilter {
    fn accepts(&self, packet: &Packet) -> bool {
        self.max_len.is_none_or(|max| packet.data.len() < max)
    }
}

impl HeaderSummary {
    pub fn from_header(header: &FileHeader) -> Self {
        Self {
            magic: format!("{:#010x}", header.magic),
            version: header.version.to_string(),
            byte_order: match header.byte_order() {
                ByteOrder::Little => "little".to_string(),
                ByteOrder::Big => "big".to_string(),
            },
            timestamp_resolution: match header.resolution() {
                TimestampResolution::Micro => "microsecond".to_string(),
                TimestampResolution::Nano => "nanosecond".to_string(),
            },
            snap_len: header.snap_len,
            link_type: header.link_type.0,
            link_type_name: header.link_type.to_string(),
            fcs_len: header.fcs,
        }
    }
}

impl PacketSummary {
    pub fn from_packet(ordinal: u64, packet: &Packet) -> Self {
        Self {
            ordinal,
            timestamp: ts_to_rfc3339(packet.header.timestamp)
                .unwrap_or_else(|| packet.header.timestamp.unix_timestamp().to_string()),
            captured_len: packet.header.captured_len,
            original_len: packet.header.original_len,
            truncated: packet.header.captured_len < packet.header.original_len,
        }
    }
}

/// Walk every record of an open session once and build a listing.
///
/// # Errors
/// Propagates the first cursor error; a partially read capture yields no
/// listing.
pub fn summarize_capture(
    session: &CaptureSession,
    filter: &ListingFilter,
) -> Result<CaptureListing, CaptureError> {
    let bytes = std::fs::metadata(session.path())
        .map_err(|err| CaptureError::io(session.path(), err))?
        .len();

    let mut summary = CaptureSummary::default();
    let mut first_ts = None;
    let mut last_ts = None;
    let mut packets = Vec::new();

    let mut cursor = session.new_cursor()?;
    while let Some(packet) = cursor.advance()? {
        let ordinal = summary.packets_total;
        summary.packets_total += 1;
        summary.bytes_captured += packet.data.len() as u64;
        first_ts.get_or_insert(packet.header.timestamp);
        last_ts = Some(packet.header.timestamp);

        let room = filter.limit.is_none_or(|limit| packets.len() < limit);
        if room && filter.accepts(&packet) {
            packets.push(PacketSummary::from_packet(ordinal, &packet));
        }
    }
    summary.time_start = first_ts.and_then(ts_to_rfc3339);
    summary.time_end = last_ts.and_then(ts_to_rfc3339);

    Ok(CaptureListing {
        input: InputInfo {
            path: session.path().display().to_string(),
            bytes,
        },
        header: HeaderSummary::from_header(session.header()),
        capture_summary: summary,
        packets,
    })
}

fn ts_to_rfc3339(ts: OffsetDateTime) -> Option<String> {
    ts.format(&Rfc3339).ok()
}
