//! Capture file wire format.
//!
//! Decodes the classic libpcap layout: one 24-byte global header followed by
//! records made of a 16-byte header and `captured_len` payload bytes. Byte
//! order and timestamp resolution are detected from the magic number and
//! applied to every multi-byte field of the file.
//!
//! Field offsets live in `layout`, bounds-checked and endian-aware reads in
//! `reader`, and the header/record codecs in `parser`. Codec errors carry no
//! file context; sessions attach the path and record ordinal.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::{decode_file_header, decode_record, record_timestamp};
