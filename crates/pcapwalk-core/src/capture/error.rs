use thiserror::Error;

/// Errors returned by the header and record codecs.
///
/// These carry no file context; the session attaches the path and record
/// ordinal when converting into `CaptureError`.
///
/// # Examples
/// ```
/// use pcapwalk_core::DecodeError;
///
/// let err = DecodeError::HeaderTooShort { actual: 3 };
/// assert!(err.to_string().contains("need 24 bytes"));
/// ```
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("file header too short: need 24 bytes, got {actual}")]
    HeaderTooShort { actual: usize },
    #[error("unrecognized magic number: {magic:#010x}")]
    UnknownMagic { magic: u32 },
    #[error("unsupported format version {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },
    #[error("snap length is zero")]
    ZeroSnapLen,
    #[error("record header too short: need 16 bytes, got {actual}")]
    RecordHeaderTooShort { actual: usize },
    #[error("payload too short: declared {expected} bytes, got {actual}")]
    PayloadTooShort { expected: u32, actual: usize },
    #[error("captured length {captured} exceeds original length {original}")]
    CapturedExceedsOriginal { captured: u32, original: u32 },
    #[error("captured length {captured} exceeds snap length {snap_len}")]
    CapturedExceedsSnapLen { captured: u32, snap_len: u32 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
