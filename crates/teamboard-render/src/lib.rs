#![forbid(unsafe_code)]

//! Render engine: aligned box tables and an append-only line log that can
//! redraw its tail in place.
//!
//! # Role in teamboard
//! The runtime builds [`DisplayLine`]s for every row, turns them into a
//! bordered [`Table`], and hands the result to a [`RenderLog`], which owns
//! the terminal writer. Redraws erase the previously printed block with
//! cursor-relative sequences and print the new image in its place, so the
//! dashboard never scrolls.

pub mod align;
pub mod ansi;
pub mod color;
pub mod render_log;
pub mod segment;
pub mod table;
pub mod terminal_guard;
pub mod terminal_model;

pub use align::{Alignment, AlignmentGroup, align};
pub use color::{Paint, strip_sgr, visible_width};
pub use render_log::RenderLog;
pub use segment::{DisplayLine, Segment};
pub use table::{Colorizer, Table, identity};
pub use terminal_guard::{GuardOptions, TerminalGuard};
pub use terminal_model::ScreenModel;

/// Display width of plain text in terminal cells.
#[inline]
pub(crate) fn display_width(text: &str) -> usize {
    unicode_width::UnicodeWidthStr::width(text)
}
