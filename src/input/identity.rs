use std::fs::{File, Metadata};
use std::io;

/// Identity of the physical file behind a handle, independent of its path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    dev: u64,
    ino: u64,
}

impl FileId {
    #[cfg(unix)]
    fn from_metadata(metadata: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        }
    }

    // No stable (volume, index) pair outside unix; the creation time is the
    // closest thing that changes when a file is replaced.
    #[cfg(not(unix))]
    fn from_metadata(metadata: &Metadata) -> Self {
        let ino = metadata
            .created()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self { dev: 0, ino }
    }

    /// Device number (0 where the platform has none)
    pub fn dev(&self) -> u64 {
        self.dev
    }

    /// Inode number, or its platform stand-in
    pub fn ino(&self) -> u64 {
        self.ino
    }
}

/// Identity and size of an open handle at one moment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub id: FileId,
    pub len: u64,
}

impl Snapshot {
    /// Stat an open handle (fstat, not a path lookup)
    pub fn of(file: &File) -> io::Result<Self> {
        let metadata = file.metadata()?;
        Ok(Self {
            id: FileId::from_metadata(&metadata),
            len: metadata.len(),
        })
    }

    /// Whether `probe` is still the file this snapshot was taken from, given
    /// that `consumed` bytes have already been read from it.
    ///
    /// The same inode stat'ed again reports the shrunk length after a
    /// truncation, so shrinking is measured against the read offset.
    pub fn is_same_file(&self, probe: &Snapshot, consumed: u64) -> bool {
        self.id == probe.id && self.len.max(consumed) <= probe.len
    }
}
