#![forbid(unsafe_code)]

//! Screen model for render log validation.
//!
//! A minimal in-memory terminal that understands the subset of sequences
//! the render log emits, so redraw behaviour can be asserted on the final
//! screen image instead of on raw bytes.
//!
//! # Scope
//!
//! This is NOT a VT emulator. It supports only:
//! - printable text (cell width from `unicode-width`, no line wrapping)
//! - CR, and LF with an implied CR (as a cooked tty with `onlcr` does)
//! - CUU (`CSI n A`) and ED (`CSI J`, `CSI 2 J`)
//! - SGR (parsed and ignored)
//! - DEC 2026 synchronized output and DECTCEM cursor visibility (tracked)
//!
//! The screen has no height limit: rows are scrollback plus viewport, which
//! is enough to tell an in-place update from one that scrolled.
//!
//! # Usage
//!
//! ```
//! use teamboard_render::ScreenModel;
//!
//! let mut screen = ScreenModel::new();
//! screen.process(b"one\ntwo\n\x1b[1A\r\x1b[Jthree\n");
//! assert_eq!(screen.visible_text(), vec!["one", "three"]);
//! ```

use unicode_width::UnicodeWidthChar;

/// Filler for the right half of a wide glyph.
const CONTINUATION: char = '\0';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Ground,
    Escape,
    Csi,
}

/// In-memory screen driven by [`process`](Self::process).
#[derive(Debug, Clone)]
pub struct ScreenModel {
    rows: Vec<Vec<char>>,
    row: usize,
    col: usize,
    state: ParseState,
    params: Vec<u32>,
    private: bool,
    sync_depth: i32,
    sync_underflow: bool,
    cursor_visible: bool,
}

impl Default for ScreenModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenModel {
    /// Empty screen with the cursor at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: vec![Vec::new()],
            row: 0,
            col: 0,
            state: ParseState::Ground,
            params: Vec::new(),
            private: false,
            sync_depth: 0,
            sync_underflow: false,
            cursor_visible: true,
        }
    }

    /// Feed output bytes. Invalid UTF-8 is replaced, not rejected.
    pub fn process(&mut self, bytes: &[u8]) {
        for c in String::from_utf8_lossy(bytes).chars() {
            match self.state {
                ParseState::Ground => self.ground(c),
                ParseState::Escape => self.escape(c),
                ParseState::Csi => self.csi(c),
            }
        }
    }

    /// Cursor position as `(column, row)`.
    #[must_use]
    pub const fn cursor(&self) -> (usize, usize) {
        (self.col, self.row)
    }

    /// Number of rows that exist, including the cursor row.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Text of row `y` with trailing blanks removed.
    #[must_use]
    pub fn row_text(&self, y: usize) -> Option<String> {
        self.rows.get(y).map(|cells| {
            let text: String = cells.iter().filter(|&&c| c != CONTINUATION).collect();
            text.trim_end().to_owned()
        })
    }

    /// All rows as text, trailing empty rows dropped.
    #[must_use]
    pub fn visible_text(&self) -> Vec<String> {
        let mut out: Vec<String> = (0..self.rows.len())
            .filter_map(|y| self.row_text(y))
            .collect();
        while out.last().is_some_and(String::is_empty) {
            out.pop();
        }
        out
    }

    /// Whether every synchronized output begin had a matching end.
    #[must_use]
    pub const fn sync_balanced(&self) -> bool {
        self.sync_depth == 0 && !self.sync_underflow
    }

    /// Current DECTCEM state.
    #[must_use]
    pub const fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    fn ground(&mut self, c: char) {
        match c {
            '\x1b' => self.state = ParseState::Escape,
            '\r' => self.col = 0,
            '\n' => {
                self.row += 1;
                self.col = 0;
                if self.rows.len() <= self.row {
                    self.rows.resize_with(self.row + 1, Vec::new);
                }
            }
            c if c.is_control() => {}
            c => self.put_char(c),
        }
    }

    fn escape(&mut self, c: char) {
        if c == '[' {
            self.params.clear();
            self.private = false;
            self.state = ParseState::Csi;
        } else {
            self.state = ParseState::Ground;
        }
    }

    fn csi(&mut self, c: char) {
        match c {
            '0'..='9' => {
                let digit = c as u32 - '0' as u32;
                if self.params.is_empty() {
                    self.params.push(0);
                }
                if let Some(last) = self.params.last_mut() {
                    *last = last.saturating_mul(10).saturating_add(digit);
                }
            }
            ';' => self.params.push(0),
            '?' => self.private = true,
            '\x40'..='\x7e' => {
                self.execute_csi(c);
                self.state = ParseState::Ground;
            }
            _ => self.state = ParseState::Ground,
        }
    }

    fn execute_csi(&mut self, final_byte: char) {
        let first = self.params.first().copied().unwrap_or(0);
        match (self.private, final_byte) {
            (false, 'A') => self.row = self.row.saturating_sub(first.max(1) as usize),
            (false, 'J') => self.erase_display(first),
            (false, 'm') => {}
            (true, 'h' | 'l') => {
                let set = final_byte == 'h';
                for &mode in &self.params {
                    match mode {
                        2026 if set => self.sync_depth += 1,
                        2026 => {
                            self.sync_depth -= 1;
                            if self.sync_depth < 0 {
                                self.sync_underflow = true;
                                self.sync_depth = 0;
                            }
                        }
                        25 => self.cursor_visible = set,
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    fn erase_display(&mut self, mode: u32) {
        match mode {
            0 => {
                if let Some(row) = self.rows.get_mut(self.row) {
                    row.truncate(self.col);
                }
                self.rows.truncate(self.row + 1);
            }
            2 => {
                for row in &mut self.rows {
                    row.clear();
                }
            }
            _ => {}
        }
    }

    fn put_char(&mut self, c: char) {
        let width = c.width().unwrap_or(0);
        if width == 0 {
            return;
        }
        if self.rows.len() <= self.row {
            self.rows.resize_with(self.row + 1, Vec::new);
        }
        let row = &mut self.rows[self.row];
        if row.len() < self.col + width {
            row.resize(self.col + width, ' ');
        }
        row[self.col] = c;
        for cell in &mut row[self.col + 1..self.col + width] {
            *cell = CONTINUATION;
        }
        self.col += width;
    }
}
