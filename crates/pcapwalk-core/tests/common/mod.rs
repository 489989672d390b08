#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

pub const MAGIC_MICRO: u32 = 0xa1b2_c3d4;
pub const MAGIC_NANO: u32 = 0xa1b2_3c4d;

/// Builds capture file bytes in either byte order.
pub struct CaptureBuilder {
    big_endian: bool,
    magic: u32,
    version: (u16, u16),
    snap_len: u32,
    link_type: u32,
    body: Vec<u8>,
}

impl CaptureBuilder {
    pub fn little() -> Self {
        Self {
            big_endian: false,
            magic: MAGIC_MICRO,
            version: (2, 4),
            snap_len: 65535,
            link_type: 1,
            body: Vec::new(),
        }
    }

    pub fn big() -> Self {
        Self {
            big_endian: true,
            ..Self::little()
        }
    }

    pub fn nanosecond(mut self) -> Self {
        self.magic = MAGIC_NANO;
        self
    }

    pub fn version(mut self, major: u16, minor: u16) -> Self {
        self.version = (major, minor);
        self
    }

    pub fn snap_len(mut self, snap_len: u32) -> Self {
        self.snap_len = snap_len;
        self
    }

    pub fn record(self, seconds: u32, fraction: u32, payload: &[u8]) -> Self {
        let len = payload.len() as u32;
        self.record_with_lens(seconds, fraction, len, len, payload)
    }

    pub fn record_with_lens(
        mut self,
        seconds: u32,
        fraction: u32,
        captured: u32,
        original: u32,
        payload: &[u8],
    ) -> Self {
        for field in [seconds, fraction, captured, original] {
            let bytes = self.u32_bytes(field);
            self.body.extend_from_slice(&bytes);
        }
        self.body.extend_from_slice(payload);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.u32_bytes(self.magic));
        bytes.extend_from_slice(&self.u16_bytes(self.version.0));
        bytes.extend_from_slice(&self.u16_bytes(self.version.1));
        bytes.extend_from_slice(&[0u8; 8]);
        bytes.extend_from_slice(&self.u32_bytes(self.snap_len));
        bytes.extend_from_slice(&self.u32_bytes(self.link_type));
        bytes.extend_from_slice(&self.body);
        bytes
    }

    pub fn write(&self) -> NamedTempFile {
        write_bytes(&self.bytes())
    }

    fn u16_bytes(&self, value: u16) -> [u8; 2] {
        if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        }
    }

    fn u32_bytes(&self, value: u32) -> [u8; 4] {
        if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        }
    }
}

pub fn write_bytes(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(bytes).expect("write capture");
    file.flush().expect("flush capture");
    file
}

/// A small capture with `count` records of distinct payloads.
pub fn numbered(builder: CaptureBuilder, count: u32) -> CaptureBuilder {
    (0..count).fold(builder, |builder, idx| {
        let payload: Vec<u8> = (0..(idx % 7 + 1) as u8).map(|b| b.wrapping_add(idx as u8)).collect();
        builder.record(1_000 + idx, idx * 10, &payload)
    })
}
