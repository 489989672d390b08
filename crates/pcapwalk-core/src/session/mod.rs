//! Capture sessions and their cursors.
//!
//! A session validates the global header once, at construction, and then hands
//! out cursors. Each cursor owns an independent read handle positioned past
//! the header, so cursors never observe each other's progress. The session
//! keeps weak links to the handles of live cursors: closing the session
//! releases them, and any cursor still held afterwards fails with
//! `ReadAfterClose`.
//!
//! The registry is the only shared mutable state and sits behind a mutex, so
//! cursors may be driven from different threads.

mod cursor;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::debug;

use crate::capture::layout;
use crate::capture::parser::decode_file_header;
use crate::capture::reader::read_up_to;
use crate::{CaptureError, DecodeOptions, FileHeader, Packet};

pub use cursor::{CaptureCursor, CursorState};
use cursor::CursorLink;

/// An opened capture file with a validated header.
///
/// # Examples
/// ```no_run
/// use pcapwalk_core::CaptureSession;
///
/// let session = CaptureSession::open_path("capture.pcap")?;
/// println!("link type: {}", session.header().link_type);
/// for packet in session.new_cursor()? {
///     let packet = packet?;
///     println!("{} bytes at {}", packet.data.len(), packet.header.timestamp);
/// }
/// session.close();
/// # Ok::<(), pcapwalk_core::CaptureError>(())
/// ```
#[derive(Debug)]
pub struct CaptureSession {
    shared: Arc<SessionShared>,
}

#[derive(Debug)]
pub(crate) struct SessionShared {
    path: PathBuf,
    header: FileHeader,
    options: DecodeOptions,
    state: Mutex<SessionState>,
}

#[derive(Debug, Default)]
struct SessionState {
    open: bool,
    next_id: u64,
    cursors: BTreeMap<u64, Weak<CursorLink>>,
}

impl CaptureSession {
    /// Validate the header of the file at `path` with default options.
    ///
    /// The session starts closed; call [`CaptureSession::open`] before
    /// requesting cursors.
    ///
    /// # Errors
    /// `FileNotFound` when the path is not an existing regular file,
    /// `HeaderInvalid` or `VersionUnsupported` when the header fails
    /// validation.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        Self::with_options(path, DecodeOptions::default())
    }

    /// Like [`CaptureSession::new`], with explicit decode options.
    pub fn with_options(
        path: impl AsRef<Path>,
        options: DecodeOptions,
    ) -> Result<Self, CaptureError> {
        let path = path.as_ref().to_path_buf();
        let is_file = fs::metadata(&path)
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(CaptureError::FileNotFound { path });
        }

        let mut file = File::open(&path).map_err(|err| CaptureError::io(&path, err))?;
        let mut raw = [0u8; layout::FILE_HEADER_LEN];
        let read = read_up_to(&mut file, &mut raw).map_err(|err| CaptureError::io(&path, err))?;
        let header = decode_file_header(&raw[..read], &options)
            .map_err(|err| CaptureError::from_header(&path, err))?;
        debug!(path = %path.display(), "validated capture file header");

        Ok(Self {
            shared: Arc::new(SessionShared {
                path,
                header,
                options,
                state: Mutex::new(SessionState::default()),
            }),
        })
    }

    /// Validate and open in one step.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let session = Self::new(path)?;
        session.open();
        Ok(session)
    }

    /// Mark the session open. Calling it while already open does nothing.
    pub fn open(&self) {
        let mut state = self.shared.lock_state();
        if state.open {
            return;
        }
        state.open = true;
        debug!(path = %self.shared.path.display(), "capture session opened");
    }

    /// Release every live cursor's read handle and mark the session closed.
    ///
    /// Safe to call repeatedly; never fails.
    pub fn close(&self) {
        let cursors = {
            let mut state = self.shared.lock_state();
            if !state.open && state.cursors.is_empty() {
                return;
            }
            state.open = false;
            std::mem::take(&mut state.cursors)
        };

        let mut released = 0usize;
        for link in cursors.values().filter_map(Weak::upgrade) {
            link.release();
            released += 1;
        }
        debug!(
            path = %self.shared.path.display(),
            released,
            "capture session closed"
        );
    }

    /// Create a cursor positioned at the first record.
    ///
    /// # Errors
    /// `NotOpen` when the session has not been opened (or was closed), or an
    /// I/O error when the file cannot be reopened.
    pub fn new_cursor(&self) -> Result<CaptureCursor, CaptureError> {
        let shared = &self.shared;
        let mut state = shared.lock_state();
        if !state.open {
            return Err(CaptureError::NotOpen {
                path: shared.path.clone(),
            });
        }

        let mut file = File::open(&shared.path).map_err(|err| CaptureError::io(&shared.path, err))?;
        file.seek(SeekFrom::Start(layout::FILE_HEADER_LEN as u64))
            .map_err(|err| CaptureError::io(&shared.path, err))?;

        let id = state.next_id;
        state.next_id += 1;
        let link = Arc::new(CursorLink::new(BufReader::new(file)));
        state.cursors.insert(id, Arc::downgrade(&link));
        debug!(path = %shared.path.display(), cursor = id, "cursor created");

        Ok(CaptureCursor::new(id, Arc::clone(shared), link))
    }

    /// Drain a fresh cursor into memory.
    ///
    /// Holds every packet at once; prefer iterating a cursor for large files.
    pub fn get_all_packets(&self) -> Result<Vec<Packet>, CaptureError> {
        self.new_cursor()?.collect()
    }

    pub fn is_open(&self) -> bool {
        self.shared.lock_state().open
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    pub fn header(&self) -> &FileHeader {
        &self.shared.header
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.shared.options
    }

    /// Number of registered cursors that are still alive.
    pub fn live_cursors(&self) -> usize {
        self.shared
            .lock_state()
            .cursors
            .values()
            .filter(|link| link.strong_count() > 0)
            .count()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl SessionShared {
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.state)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn header(&self) -> &FileHeader {
        &self.header
    }

    pub(crate) fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub(crate) fn deregister(&self, id: u64) {
        self.lock_state().cursors.remove(&id);
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
