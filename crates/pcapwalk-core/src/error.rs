use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::Version;
use crate::capture::error::DecodeError;

/// Errors surfaced by capture sessions and cursors.
///
/// Every variant names the capture file; record-level variants also carry the
/// 0-based ordinal of the record being decoded. None of them are retried.
///
/// # Examples
/// ```
/// use std::path::PathBuf;
///
/// use pcapwalk_core::CaptureError;
///
/// let err = CaptureError::ReadAfterClose {
///     path: PathBuf::from("capture.pcap"),
///     ordinal: 3,
/// };
/// assert_eq!(err.ordinal(), Some(3));
/// assert!(err.to_string().contains("capture.pcap"));
/// ```
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },
    #[error("invalid capture file header in {}: {source}", .path.display())]
    HeaderInvalid {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
    #[error("unsupported capture format version {version} in {}", .path.display())]
    VersionUnsupported { path: PathBuf, version: Version },
    #[error("invalid record header for packet {ordinal} in {}: {source}", .path.display())]
    RecordHeaderInvalid {
        path: PathBuf,
        ordinal: u64,
        #[source]
        source: DecodeError,
    },
    #[error(
        "packet {ordinal} in {} declares {expected} bytes but only {actual} are present",
        .path.display()
    )]
    PacketSizeMismatch {
        path: PathBuf,
        ordinal: u64,
        expected: u32,
        actual: usize,
    },
    #[error("read after close at packet {ordinal} in {}", .path.display())]
    ReadAfterClose { path: PathBuf, ordinal: u64 },
    #[error("capture file is not open: {}", .path.display())]
    NotOpen { path: PathBuf },
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CaptureError {
    /// Attach file context to a global-header decode failure.
    pub(crate) fn from_header(path: &Path, err: DecodeError) -> Self {
        let path = path.to_path_buf();
        match err {
            DecodeError::UnsupportedVersion { major, minor } => CaptureError::VersionUnsupported {
                path,
                version: Version { major, minor },
            },
            DecodeError::Io(source) => CaptureError::Io { path, source },
            source => CaptureError::HeaderInvalid { path, source },
        }
    }

    /// Attach file and ordinal context to a record decode failure.
    pub(crate) fn from_record(path: &Path, ordinal: u64, err: DecodeError) -> Self {
        let path = path.to_path_buf();
        match err {
            DecodeError::PayloadTooShort { expected, actual } => CaptureError::PacketSizeMismatch {
                path,
                ordinal,
                expected,
                actual,
            },
            DecodeError::Io(source) => CaptureError::Io { path, source },
            source => CaptureError::RecordHeaderInvalid {
                path,
                ordinal,
                source,
            },
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return CaptureError::FileNotFound {
                path: path.to_path_buf(),
            };
        }
        CaptureError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Path of the capture file the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            CaptureError::FileNotFound { path }
            | CaptureError::HeaderInvalid { path, .. }
            | CaptureError::VersionUnsupported { path, .. }
            | CaptureError::RecordHeaderInvalid { path, .. }
            | CaptureError::PacketSizeMismatch { path, .. }
            | CaptureError::ReadAfterClose { path, .. }
            | CaptureError::NotOpen { path }
            | CaptureError::Io { path, .. } => path,
        }
    }

    /// Ordinal of the offending record, for record-level errors.
    pub fn ordinal(&self) -> Option<u64> {
        match self {
            CaptureError::RecordHeaderInvalid { ordinal, .. }
            | CaptureError::PacketSizeMismatch { ordinal, .. }
            | CaptureError::ReadAfterClose { ordinal, .. } => Some(*ordinal),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CaptureError;
    use crate::capture::error::DecodeError;
    use std::path::Path;

    #[test]
    fn header_errors_split_version_from_structure() {
        let path = Path::new("a.pcap");
        let err = CaptureError::from_header(path, DecodeError::UnsupportedVersion { major: 1, minor: 0 });
        assert!(matches!(err, CaptureError::VersionUnsupported { ref version, .. } if version.major == 1));
        assert!(err.to_string().contains("1.0"));

        let err = CaptureError::from_header(path, DecodeError::HeaderTooShort { actual: 2 });
        assert!(matches!(err, CaptureError::HeaderInvalid { .. }));
        assert_eq!(err.path(), path);
        assert_eq!(err.ordinal(), None);
    }

    #[test]
    fn record_errors_keep_ordinal() {
        let path = Path::new("a.pcap");
        let err = CaptureError::from_record(
            path,
            4,
            DecodeError::PayloadTooShort {
                expected: 10,
                actual: 9,
            },
        );
        assert!(matches!(
            err,
            CaptureError::PacketSizeMismatch {
                ordinal: 4,
                expected: 10,
                actual: 9,
                ..
            }
        ));

        let err = CaptureError::from_record(path, 2, DecodeError::RecordHeaderTooShort { actual: 3 });
        assert!(matches!(err, CaptureError::RecordHeaderInvalid { ordinal: 2, .. }));
        assert_eq!(err.ordinal(), Some(2));
    }

    #[test]
    fn missing_file_maps_to_not_found() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = CaptureError::io(Path::new("gone.pcap"), source);
        assert!(matches!(err, CaptureError::FileNotFound { .. }));
    }
}
