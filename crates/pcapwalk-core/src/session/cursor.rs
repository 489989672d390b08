use std::fs::File;
use std::io::BufReader;
use std::iter::FusedIterator;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::{SessionShared, lock};
use crate::capture::layout;
use crate::capture::parser::decode_record;
use crate::{CaptureError, FileHeader, Packet};

/// Lifecycle of a cursor. `Exhausted` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Created,
    Reading,
    Exhausted,
    Failed,
}

/// Read handle shared between a cursor and its session's registry.
///
/// The session only holds a weak link; releasing drops the file handle so the
/// next read reports `ReadAfterClose`.
#[derive(Debug)]
pub(crate) struct CursorLink {
    reader: Mutex<Option<BufReader<File>>>,
}

impl CursorLink {
    pub(crate) fn new(reader: BufReader<File>) -> Self {
        Self {
            reader: Mutex::new(Some(reader)),
        }
    }

    pub(crate) fn release(&self) {
        lock(&self.reader).take();
    }
}

/// Forward-only, pull-based reader over the records of one capture file.
///
/// Obtained from [`crate::CaptureSession::new_cursor`]. Each cursor reads
/// through its own file handle; advancing one never moves another. A cursor
/// cannot be rewound: request a new one to read from the start again.
#[derive(Debug)]
pub struct CaptureCursor {
    id: u64,
    session: Arc<SessionShared>,
    link: Arc<CursorLink>,
    state: CursorState,
    position: u64,
    offset: u64,
    registered: bool,
}

impl CaptureCursor {
    pub(crate) fn new(id: u64, session: Arc<SessionShared>, link: Arc<CursorLink>) -> Self {
        Self {
            id,
            session,
            link,
            state: CursorState::Created,
            position: 0,
            offset: layout::FILE_HEADER_LEN as u64,
            registered: true,
        }
    }

    /// Decode the next record.
    ///
    /// Returns `Ok(None)` once the capture is exhausted, and keeps doing so.
    /// On any failure the cursor becomes `Failed` and releases its handle, so
    /// advancing it again reports `ReadAfterClose` for the same ordinal.
    pub fn advance(&mut self) -> Result<Option<Packet>, CaptureError> {
        match self.state {
            CursorState::Exhausted => return Ok(None),
            CursorState::Failed => return Err(self.read_after_close()),
            CursorState::Created | CursorState::Reading => {}
        }

        match self.decode_next() {
            Ok(Some(packet)) => {
                self.state = CursorState::Reading;
                self.position += 1;
                self.offset += (layout::RECORD_HEADER_LEN + packet.data.len()) as u64;
                Ok(Some(packet))
            }
            Ok(None) => {
                self.state = CursorState::Exhausted;
                self.finish();
                debug!(cursor = self.id, packets = self.position, "cursor exhausted");
                Ok(None)
            }
            Err(err) => {
                self.state = CursorState::Failed;
                self.finish();
                debug!(cursor = self.id, error = %err, "cursor failed");
                Err(err)
            }
        }
    }

    /// Number of packets yielded so far, which is also the 0-based ordinal of
    /// the next record.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Byte offset of the next record within the file.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn header(&self) -> &FileHeader {
        self.session.header()
    }

    pub fn path(&self) -> &Path {
        self.session.path()
    }

    fn decode_next(&self) -> Result<Option<Packet>, CaptureError> {
        let mut guard = lock(&self.link.reader);
        let Some(reader) = guard.as_mut() else {
            return Err(self.read_after_close());
        };
        decode_record(reader, self.session.header(), self.session.options())
            .map_err(|err| CaptureError::from_record(self.session.path(), self.position, err))
    }

    fn read_after_close(&self) -> CaptureError {
        CaptureError::ReadAfterClose {
            path: self.session.path().to_path_buf(),
            ordinal: self.position,
        }
    }

    // Runs at most once: releases the handle and leaves the registry.
    fn finish(&mut self) {
        self.link.release();
        if self.registered {
            self.registered = false;
            self.session.deregister(self.id);
        }
    }
}

impl Iterator for CaptureCursor {
    type Item = Result<Packet, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == CursorState::Failed {
            return None;
        }
        self.advance().transpose()
    }
}

impl FusedIterator for CaptureCursor {}

impl Drop for CaptureCursor {
    fn drop(&mut self) {
        self.finish();
    }
}
