use std::io::{self, BufRead};

/// The set of line terminators a follower recognizes
///
/// Fixed when the follower is built. The default recognizes `"\r\n"`, `"\n"`
/// and `"\r"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminators {
    crlf: bool,
    lf: bool,
    cr: bool,
}

impl Default for Terminators {
    fn default() -> Self {
        Self::ALL
    }
}

impl Terminators {
    /// `"\r\n"`, `"\n"` and `"\r"`
    pub const ALL: Terminators = Terminators {
        crlf: true,
        lf: true,
        cr: true,
    };

    /// `"\n"` only; a `\r` is kept as part of the line
    pub const LF: Terminators = Terminators {
        crlf: false,
        lf: true,
        cr: false,
    };
}

/// Splits the bytes of one open handle into terminated lines
///
/// Holds the partial final line between reads. Nothing is returned until its
/// terminator has been read.
#[derive(Debug)]
pub struct LineSplitter {
    terminators: Terminators,
    partial: Vec<u8>,
    /// A lone `\r` ended the previous line at the edge of the available
    /// data; a `\n` arriving next belongs to it.
    after_cr: bool,
    /// Offset in the underlying file of the next byte to read
    offset: u64,
}

impl LineSplitter {
    /// Create a splitter for a handle positioned at `offset`
    pub fn new(terminators: Terminators, offset: u64) -> Self {
        Self {
            terminators,
            partial: Vec::new(),
            after_cr: false,
            offset,
        }
    }

    /// Offset of the next unread byte (everything before it was consumed)
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Bytes held back waiting for a terminator
    pub fn partial(&self) -> &[u8] {
        &self.partial
    }

    /// Read the next terminated line, terminator stripped
    ///
    /// Returns `Ok(None)` once the reader has no more data. Unterminated
    /// bytes are kept and completed by later calls.
    pub fn next_line<R: BufRead>(&mut self, reader: &mut R) -> io::Result<Option<Vec<u8>>> {
        loop {
            let available = reader.fill_buf()?;
            if available.is_empty() {
                return Ok(None);
            }

            let mut start = 0;
            if self.after_cr {
                self.after_cr = false;
                if available[0] == b'\n' {
                    start = 1;
                }
            }

            let found = self.scan(&available[start..]);
            let used = match found {
                Some(end) => start + end,
                None => {
                    self.partial.extend_from_slice(&available[start..]);
                    available.len()
                }
            };
            reader.consume(used);
            self.offset += used as u64;

            if found.is_some() {
                return Ok(Some(std::mem::take(&mut self.partial)));
            }
        }
    }

    /// Look for the first terminator in `bytes`
    ///
    /// On success the line content has been moved into `partial` and the
    /// number of bytes used (content plus terminator) is returned.
    fn scan(&mut self, bytes: &[u8]) -> Option<usize> {
        let t = self.terminators;
        for (i, &b) in bytes.iter().enumerate() {
            match b {
                b'\n' => {
                    let cr_before = match i {
                        0 => self.partial.last() == Some(&b'\r'),
                        _ => bytes[i - 1] == b'\r',
                    };
                    if t.crlf && cr_before {
                        self.partial.extend_from_slice(&bytes[..i]);
                        self.partial.pop();
                        return Some(i + 1);
                    }
                    if t.lf {
                        self.partial.extend_from_slice(&bytes[..i]);
                        return Some(i + 1);
                    }
                }
                b'\r' => match bytes.get(i + 1) {
                    Some(b'\n') if t.crlf => {}
                    Some(_) if t.cr => {
                        self.partial.extend_from_slice(&bytes[..i]);
                        return Some(i + 1);
                    }
                    None if t.cr => {
                        self.partial.extend_from_slice(&bytes[..i]);
                        self.after_cr = t.crlf;
                        return Some(i + 1);
                    }
                    _ => {}
                },
                _ => {}
            }
        }
        None
    }
}
