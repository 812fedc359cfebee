#![forbid(unsafe_code)]

//! ANSI escape sequence helpers.
//!
//! Pure byte generation for the small set of control sequences the render
//! log needs. No terminal state is tracked here.
//!
//! | Sequence | Meaning |
//! |----------|---------|
//! | `ESC [ n A` | CUU, cursor up n rows |
//! | `CR` | carriage return |
//! | `ESC [ J` | ED 0, erase from cursor to end of screen |
//! | `ESC [ 38;5;n m` / `ESC [ 48;5;n m` | 256-color foreground / background |
//! | `ESC [ m` | SGR reset |
//! | `ESC [ ? 25 l/h` | hide / show cursor |
//! | `ESC [ ? 2026 h/l` | synchronized output begin / end |
//! | `ESC [ > 1 u` / `ESC [ < u` | push / pop kitty keyboard flags |

use std::fmt;
use std::io::{self, Write};

/// Control Sequence Introducer.
pub const CSI: &str = "\x1b[";

/// SGR reset: `CSI m`.
pub const SGR_RESET: &str = "\x1b[m";

/// Erase from cursor to end of screen: `CSI J`.
pub const ERASE_BELOW: &[u8] = b"\x1b[J";

/// Hide cursor: `CSI ? 25 l`.
pub const CURSOR_HIDE: &[u8] = b"\x1b[?25l";

/// Show cursor: `CSI ? 25 h`.
pub const CURSOR_SHOW: &[u8] = b"\x1b[?25h";

/// Synchronized output begin (DEC 2026).
pub const SYNC_BEGIN: &[u8] = b"\x1b[?2026h";

/// Synchronized output end (DEC 2026).
pub const SYNC_END: &[u8] = b"\x1b[?2026l";

/// Push kitty keyboard flags with "disambiguate escape codes" set, so that
/// chords like Ctrl+Shift+<letter> are reported with both modifiers.
pub const KITTY_KEYBOARD_PUSH: &[u8] = b"\x1b[>1u";

/// Pop the kitty keyboard flags pushed by [`KITTY_KEYBOARD_PUSH`].
pub const KITTY_KEYBOARD_POP: &[u8] = b"\x1b[<u";

/// Cursor up `n` rows: `CSI n A`.
///
/// A count of zero is not emitted: terminals treat `CSI 0 A` as one row.
pub fn cuu<W: Write>(w: &mut W, n: usize) -> io::Result<()> {
    if n == 0 {
        return Ok(());
    }
    write!(w, "{CSI}{n}A")
}

/// Carriage return.
#[inline]
pub fn cr<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(b"\r")
}

/// Erase from the cursor to the end of the screen.
#[inline]
pub fn erase_below<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(ERASE_BELOW)
}

/// Move up `n` rows to column 0 and clear everything below.
///
/// Written after `n` newline-terminated lines, this leaves the cursor where
/// the first of those lines began.
pub fn erase_rows<W: Write>(w: &mut W, n: usize) -> io::Result<()> {
    if n == 0 {
        return Ok(());
    }
    cuu(w, n)?;
    cr(w)?;
    erase_below(w)
}

/// Begin a synchronized output block.
#[inline]
pub fn sync_begin<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(SYNC_BEGIN)
}

/// End a synchronized output block.
#[inline]
pub fn sync_end<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(SYNC_END)
}

/// Hide the cursor.
#[inline]
pub fn cursor_hide<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(CURSOR_HIDE)
}

/// Show the cursor.
#[inline]
pub fn cursor_show<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(CURSOR_SHOW)
}

/// Enable disambiguated key reporting on terminals that speak the kitty
/// keyboard protocol. Others ignore the sequence.
#[inline]
pub fn kitty_keyboard_push<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(KITTY_KEYBOARD_PUSH)
}

#[inline]
pub fn kitty_keyboard_pop<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(KITTY_KEYBOARD_POP)
}

/// Foreground from the 256-color palette: `CSI 38;5;n m`.
///
/// SGR codes are built into strings before they reach the terminal, so
/// these take a [`fmt::Write`].
pub fn sgr_fg_256<W: fmt::Write>(w: &mut W, index: u8) -> fmt::Result {
    write!(w, "{CSI}38;5;{index}m")
}

/// Background from the 256-color palette: `CSI 48;5;n m`.
pub fn sgr_bg_256<W: fmt::Write>(w: &mut W, index: u8) -> fmt::Result {
    write!(w, "{CSI}48;5;{index}m")
}
