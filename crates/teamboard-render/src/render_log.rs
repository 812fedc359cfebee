#![forbid(unsafe_code)]

//! Append-only line log with in-place tail redraw.
//!
//! The log mirrors every line printed below the prompt. Because each logged
//! line ends with a newline, the cursor always sits at column 0 one row
//! below the last line, so erasing the last `n` lines is a cursor-relative
//! move up `n` rows followed by an erase to the end of the screen.
//!
//! # Key Invariants
//!
//! 1. One writer owns terminal output (enforced by ownership).
//! 2. Every call emits exactly one `write_all`, so a batch of lines is never
//!    split by another writer.
//! 3. `size()` always equals the number of lines visible below the anchor.

use std::io::{self, Write};

use tracing::trace;

use crate::ansi::{erase_rows, sync_begin, sync_end};

/// Lines written so far plus the writer they went to.
#[derive(Debug)]
pub struct RenderLog<W: Write> {
    writer: W,
    lines: Vec<String>,
    newline: &'static str,
    sync_output: bool,
}

impl<W: Write> RenderLog<W> {
    /// Log writing `\n`-terminated lines to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            lines: Vec::new(),
            newline: "\n",
            sync_output: false,
        }
    }

    /// Terminate lines with `\r\n`, for terminals in raw mode.
    #[must_use]
    pub fn with_crlf(mut self, crlf: bool) -> Self {
        self.newline = if crlf { "\r\n" } else { "\n" };
        self
    }

    /// Wrap tail replacements in DEC 2026 synchronized output.
    #[must_use]
    pub fn with_sync_output(mut self, enabled: bool) -> Self {
        self.sync_output = enabled;
        self
    }

    /// Number of lines currently in the log.
    #[must_use]
    pub fn size(&self) -> usize {
        self.lines.len()
    }

    /// The logged lines, oldest first.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Append `lines` and print them as one write.
    pub fn append<I, S>(&mut self, lines: I) -> io::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut buf = Vec::new();
        let added = self.push_lines(&mut buf, lines);
        if added == 0 {
            return Ok(());
        }
        trace!(event = "render.append", lines = added, size = self.size());
        self.flush_buf(&buf)
    }

    /// Remove the last `n` lines from the log and the screen.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds [`size`](Self::size).
    pub fn erase(&mut self, n: usize) -> io::Result<()> {
        if n == 0 {
            return Ok(());
        }
        let mut buf = Vec::new();
        self.erase_into(&mut buf, n)?;
        trace!(event = "render.erase", lines = n, size = self.size());
        self.flush_buf(&buf)
    }

    /// Replace the last `n` lines with `lines` in a single write.
    ///
    /// Equivalent to [`erase`](Self::erase) followed by
    /// [`append`](Self::append), but the terminal never observes the
    /// intermediate state.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds [`size`](Self::size).
    pub fn replace_tail<I, S>(&mut self, n: usize, lines: I) -> io::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut buf = Vec::new();
        if self.sync_output {
            sync_begin(&mut buf)?;
        }
        self.erase_into(&mut buf, n)?;
        let added = self.push_lines(&mut buf, lines);
        if self.sync_output {
            sync_end(&mut buf)?;
        }
        if n == 0 && added == 0 {
            return Ok(());
        }
        trace!(
            event = "render.replace_tail",
            erased = n,
            added,
            size = self.size()
        );
        self.flush_buf(&buf)
    }

    /// Erase every line logged after `mark`, where `mark` is an earlier
    /// [`size`](Self::size). A mark at or beyond the current size is a no-op.
    pub fn truncate_to(&mut self, mark: usize) -> io::Result<()> {
        let n = self.size().saturating_sub(mark);
        self.erase(n)
    }

    /// Borrow the underlying writer.
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Consume the log and return the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn push_lines<I, S>(&mut self, buf: &mut Vec<u8>, lines: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = 0;
        for line in lines {
            let line = line.into();
            buf.extend_from_slice(line.as_bytes());
            buf.extend_from_slice(self.newline.as_bytes());
            self.lines.push(line);
            added += 1;
        }
        added
    }

    fn erase_into(&mut self, buf: &mut Vec<u8>, n: usize) -> io::Result<()> {
        assert!(
            n <= self.lines.len(),
            "cannot erase {n} lines from a log of {}",
            self.lines.len()
        );
        self.lines.truncate(self.lines.len() - n);
        erase_rows(buf, n)
    }

    fn flush_buf(&mut self, buf: &[u8]) -> io::Result<()> {
        self.writer.write_all(buf)?;
        self.writer.flush()
    }
}
