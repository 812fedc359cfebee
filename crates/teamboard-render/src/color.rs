#![forbid(unsafe_code)]

//! 256-color painting.
//!
//! A [`Paint`] wraps text in SGR color codes and a trailing reset. Painting
//! never changes the visible width of the text, which is what lets a table
//! colorizer style cells after alignment without breaking columns.

use std::borrow::Cow;
use crate::ansi::{SGR_RESET, sgr_bg_256, sgr_fg_256};
use crate::display_width;

/// Border and de-emphasized text.
pub const GRAY: u8 = 239;
/// Highlighted values.
pub const ACCENT: u8 = 214;
/// Errors and warnings.
pub const ALERT: u8 = 129;

/// Foreground color with an optional background, from the 256-color palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Paint {
    fg: u8,
    bg: Option<u8>,
}

impl Paint {
    /// Paint with a foreground color only.
    #[must_use]
    pub const fn fg(fg: u8) -> Self {
        Self { fg, bg: None }
    }

    /// Add a background color.
    #[must_use]
    pub const fn on(mut self, bg: u8) -> Self {
        self.bg = Some(bg);
        self
    }

    /// Wrap `text` in this paint. Empty text stays empty.
    #[must_use]
    pub fn paint(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 24);
        self.paint_into(&mut out, text);
        out
    }

    /// Append `text` wrapped in this paint to `out`.
    pub fn paint_into(&self, out: &mut String, text: &str) {
        if text.is_empty() {
            return;
        }
        // Writing into a String cannot fail.
        let _ = sgr_fg_256(out, self.fg);
        if let Some(bg) = self.bg {
            let _ = sgr_bg_256(out, bg);
        }
        out.push_str(text);
        out.push_str(SGR_RESET);
    }
}

/// Table borders.
pub const BORDER: Paint = Paint::fg(GRAY);
/// Highlighted values.
pub const HIGHLIGHT: Paint = Paint::fg(ACCENT);
/// Error text.
pub const WARNING: Paint = Paint::fg(ALERT);
/// Hotkey letters: black on light gray.
pub const BUTTON: Paint = Paint::fg(0).on(7);

/// Remove SGR sequences (`ESC [ ... m`) from `text`.
#[must_use]
pub fn strip_sgr(text: &str) -> Cow<'_, str> {
    if !text.contains('\x1b') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for p in chars.by_ref() {
                if p == 'm' {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    Cow::Owned(out)
}

/// Width in cells of `text` once SGR sequences are removed.
#[must_use]
pub fn visible_width(text: &str) -> usize {
    display_width(&strip_sgr(text))
}
