pub const FILE_HEADER_LEN: usize = 24;
pub const RECORD_HEADER_LEN: usize = 16;

pub const MAGIC_RANGE: std::ops::Range<usize> = 0..4;
pub const VERSION_MAJOR_RANGE: std::ops::Range<usize> = 4..6;
pub const VERSION_MINOR_RANGE: std::ops::Range<usize> = 6..8;
pub const RESERVED1_RANGE: std::ops::Range<usize> = 8..12;
pub const RESERVED2_RANGE: std::ops::Range<usize> = 12..16;
pub const SNAP_LEN_RANGE: std::ops::Range<usize> = 16..20;
pub const LINK_TYPE_WORD_RANGE: std::ops::Range<usize> = 20..24;

pub const TS_SECONDS_RANGE: std::ops::Range<usize> = 0..4;
pub const TS_FRACTION_RANGE: std::ops::Range<usize> = 4..8;
pub const CAPTURED_LEN_RANGE: std::ops::Range<usize> = 8..12;
pub const ORIGINAL_LEN_RANGE: std::ops::Range<usize> = 12..16;

pub const MAGIC_MICRO: u32 = 0xa1b2_c3d4;
pub const MAGIC_MICRO_SWAPPED: u32 = 0xd4c3_b2a1;
pub const MAGIC_NANO: u32 = 0xa1b2_3c4d;
pub const MAGIC_NANO_SWAPPED: u32 = 0x4d3c_b2a1;

pub const SUPPORTED_VERSION_MAJOR: u16 = 2;
pub const SUPPORTED_VERSION_MINOR: u16 = 4;

// Link-type word: low 16 bits are the link type, bit 27 flags an FCS
// and bits 28..32 hold its length in 16-bit units.
pub const LINK_TYPE_MASK: u32 = 0x0000_ffff;
pub const FCS_PRESENT_BIT: u32 = 1 << 27;
pub const FCS_LEN_SHIFT: u32 = 28;

pub const MICROS_PER_SECOND: u32 = 1_000_000;
pub const NANOS_PER_SECOND: u32 = 1_000_000_000;
