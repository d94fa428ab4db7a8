use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use super::encoding::{decode_line, strip_bom};
use super::identity::Snapshot;
use super::terminator::{LineSplitter, Terminators};
use crate::error::FollowError;

/// Default capacity of the read buffer, in bytes
pub const DEFAULT_READ_SIZE: usize = 1024;

/// Emit a diagnostic notice when the follower was built with `debug` set
macro_rules! notice {
    ($follower:expr, $($arg:tt)+) => {
        if $follower.options.debug {
            tracing::debug!($($arg)+);
        }
    };
}

/// How a [`Follower`] reads its file
#[derive(Debug, Clone)]
pub struct FollowOptions {
    /// Emit the file from byte 0 when it is opened, instead of only what is
    /// appended afterwards
    pub replay_from_start: bool,
    /// Emit diagnostic notices (opens, reads, rotations) through `tracing`
    pub debug: bool,
    /// Capacity of the read buffer
    pub read_size: usize,
    /// Line terminators to split on and strip
    pub terminators: Terminators,
}

impl Default for FollowOptions {
    fn default() -> Self {
        Self {
            replay_from_start: false,
            debug: false,
            read_size: DEFAULT_READ_SIZE,
            terminators: Terminators::default(),
        }
    }
}

/// Phase of a [`Follower`], as seen between polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowState {
    /// No handle is open (not polled yet, closed, or the file is missing)
    Unopened,
    /// Reading from an open handle
    Active,
    /// The active handle hit end of file and the path is being re-opened to
    /// check for rotation. Never outlives a single poll.
    Probing,
}

/// The open handle being read, with what is known about it
struct Handle {
    reader: BufReader<File>,
    snapshot: Snapshot,
    splitter: LineSplitter,
    /// Handle was positioned at the start of the file and nothing has been
    /// emitted from it yet
    at_start: bool,
}

impl Handle {
    fn new(file: File, snapshot: Snapshot, offset: u64, options: &FollowOptions) -> Self {
        Self {
            reader: BufReader::with_capacity(options.read_size, file),
            snapshot,
            splitter: LineSplitter::new(options.terminators, offset),
            at_start: offset == 0,
        }
    }

    /// Re-stat the handle
    fn refresh(&mut self) -> std::io::Result<()> {
        self.snapshot = Snapshot::of(self.reader.get_ref())?;
        Ok(())
    }
}

enum Phase {
    Unopened,
    Active(Handle),
    Probing(Handle),
}

/// Follows a file by name, like `tail --follow=name`
///
/// The path is re-opened whenever it stops referring to the file being read:
/// after rotation (a new file now lives at the path) or truncation (the same
/// file got shorter). The new file is read from its beginning.
///
/// No I/O happens until the first poll.
pub struct Follower {
    path: PathBuf,
    options: FollowOptions,
    phase: Phase,
    /// The next read that consists of a bare terminator is leftover from
    /// before the handle was opened and is dropped
    pending_trailing: bool,
}

impl Follower {
    /// Create a follower for `path`
    pub fn new(path: impl Into<PathBuf>, options: FollowOptions) -> Self {
        Self {
            path: path.into(),
            options,
            phase: Phase::Unopened,
            pending_trailing: true,
        }
    }

    /// The path being followed
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current phase
    pub fn state(&self) -> FollowState {
        match self.phase {
            Phase::Unopened => FollowState::Unopened,
            Phase::Active(_) => FollowState::Active,
            Phase::Probing(_) => FollowState::Probing,
        }
    }

    /// Whether a handle is currently open
    pub fn is_open(&self) -> bool {
        !matches!(self.phase, Phase::Unopened)
    }

    /// Lazy, endless sequence of lines, sleeping `interval` whenever no
    /// complete line is available
    ///
    /// Ends only after yielding a fatal I/O error.
    pub fn follow(&mut self, interval: Duration) -> Follow<'_> {
        Follow {
            follower: self,
            interval,
            failed: false,
        }
    }

    /// Release the open handle, if any. Safe to call any number of times.
    ///
    /// Polling again afterwards re-opens the path.
    pub fn close(&mut self) {
        if self.is_open() {
            notice!(self, path = %self.path.display(), "closed");
        }
        self.phase = Phase::Unopened;
    }

    /// Advance until a complete line is available or the follower would have
    /// to wait
    ///
    /// `Ok(None)` means "sleep, then poll again": either the path cannot be
    /// opened right now or no new data has arrived. Failures to open are
    /// never errors. An error is returned only when an already open handle
    /// cannot be stat'ed or read; the handle is released in that case.
    pub fn poll_line(&mut self) -> Result<Option<String>, FollowError> {
        loop {
            match std::mem::replace(&mut self.phase, Phase::Unopened) {
                Phase::Unopened => match self.open()? {
                    Some(handle) => self.phase = Phase::Active(handle),
                    None => return Ok(None),
                },
                Phase::Active(mut handle) => {
                    handle.refresh().map_err(|e| FollowError::io(e, &self.path))?;

                    let bytes = match handle.splitter.next_line(&mut handle.reader) {
                        Ok(Some(bytes)) => bytes,
                        Ok(None) => {
                            self.phase = Phase::Probing(handle);
                            continue;
                        }
                        Err(e) => return Err(FollowError::io(e, &self.path)),
                    };

                    let bytes = if handle.at_start {
                        handle.at_start = false;
                        strip_bom(&bytes).to_vec()
                    } else {
                        bytes
                    };

                    if self.pending_trailing && bytes.is_empty() {
                        notice!(self, path = %self.path.display(), "dropped leftover terminator");
                        self.pending_trailing = false;
                        self.phase = Phase::Active(handle);
                        continue;
                    }
                    self.pending_trailing = false;

                    handle.refresh().map_err(|e| FollowError::io(e, &self.path))?;
                    self.phase = Phase::Active(handle);

                    let line = decode_line(bytes);
                    notice!(self, line = %line, "line");
                    return Ok(Some(line));
                }
                Phase::Probing(active) => match self.probe(active) {
                    Probe::Replaced(handle) => self.phase = Phase::Active(handle),
                    Probe::Unchanged(handle) => {
                        self.phase = Phase::Active(handle);
                        return Ok(None);
                    }
                },
            }
        }
    }

    /// Open the path as the active handle
    ///
    /// Returns `Ok(None)` when the path cannot be opened.
    fn open(&mut self) -> Result<Option<Handle>, FollowError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) => {
                notice!(self, path = %self.path.display(), error = %e, "could not open");
                return Ok(None);
            }
        };

        let snapshot = Snapshot::of(&file).map_err(|e| FollowError::io(e, &self.path))?;
        let offset = if self.options.replay_from_start {
            0
        } else {
            file.seek(SeekFrom::End(0))
                .map_err(|e| FollowError::io(e, &self.path))?
        };
        self.pending_trailing = true;

        notice!(
            self,
            path = %self.path.display(),
            dev = snapshot.id.dev(),
            inode = snapshot.id.ino(),
            size = snapshot.len,
            "opened"
        );
        Ok(Some(Handle::new(file, snapshot, offset, &self.options)))
    }

    /// The active handle is at end of file: re-open the path and decide
    /// whether it still names the same file
    ///
    /// The probe handle is dropped unless it replaces the active one.
    fn probe(&mut self, active: Handle) -> Probe {
        let probe = match File::open(&self.path) {
            Ok(file) => file,
            Err(_) => {
                // Gone for now. Keep the old handle until a new file shows up.
                self.pending_trailing = true;
                return Probe::Unchanged(active);
            }
        };

        let snapshot = match Snapshot::of(&probe) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                notice!(self, path = %self.path.display(), error = %e, "could not stat probe");
                return Probe::Unchanged(active);
            }
        };

        if active
            .snapshot
            .is_same_file(&snapshot, active.splitter.offset())
        {
            return Probe::Unchanged(active);
        }

        if snapshot.id == active.snapshot.id {
            notice!(
                self,
                path = %self.path.display(),
                size = snapshot.len,
                offset = active.splitter.offset(),
                "truncated"
            );
        } else {
            notice!(
                self,
                path = %self.path.display(),
                inode = snapshot.id.ino(),
                previous = active.snapshot.id.ino(),
                "rotated"
            );
        }
        if !active.splitter.partial().is_empty() {
            notice!(
                self,
                bytes = active.splitter.partial().len(),
                "discarding unterminated line"
            );
        }

        drop(active);
        Probe::Replaced(Handle::new(probe, snapshot, 0, &self.options))
    }
}

/// Outcome of re-opening the path at end of file
enum Probe {
    /// Still the same file (or no file at all); keep waiting on it
    Unchanged(Handle),
    /// Rotated or truncated; read this handle from the start
    Replaced(Handle),
}

/// Iterator returned by [`Follower::follow`]
pub struct Follow<'a> {
    follower: &'a mut Follower,
    interval: Duration,
    failed: bool,
}

impl Iterator for Follow<'_> {
    type Item = Result<String, FollowError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            match self.follower.poll_line() {
                Ok(Some(line)) => return Some(Ok(line)),
                Ok(None) => thread::sleep(self.interval),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl FusedIterator for Follow<'_> {}
