#![forbid(unsafe_code)]

//! Bordered, column-aligned tables.
//!
//! ```text
//! ╭╼title╾────────────╮
//! │ <colorized row 0> │
//! │ <colorized row 1> │
//! ╰───────────────────╯
//! ```
//!
//! Rows are right-trimmed and aligned on their marks (see [`crate::align`]),
//! then each row is handed to a [`Colorizer`] together with its index. The
//! colorizer may add styling but must keep the visible width of the row.

use crate::align::{Alignment, align};
use crate::color::{BORDER, visible_width};
use crate::display_width;
use crate::segment::DisplayLine;

/// Per-row post-processing applied after alignment.
pub trait Colorizer {
    /// Style row `index`. The result must have the same visible width.
    fn colorize(&self, index: usize, row: &str) -> String;
}

impl<F> Colorizer for F
where
    F: Fn(usize, &str) -> String,
{
    fn colorize(&self, index: usize, row: &str) -> String {
        self(index, row)
    }
}

/// Colorizer that returns rows unchanged.
#[must_use]
pub fn identity(_index: usize, row: &str) -> String {
    row.to_owned()
}

/// A table ready to be rendered.
#[derive(Debug, Clone, Default)]
pub struct Table {
    lines: Vec<DisplayLine>,
    title: Option<String>,
    min_width: usize,
}

impl Table {
    /// Table over `lines`, with no title and no minimum width.
    #[must_use]
    pub fn new(lines: impl IntoIterator<Item = DisplayLine>) -> Self {
        Self {
            lines: lines.into_iter().collect(),
            title: None,
            min_width: 0,
        }
    }

    /// Embed a title in the top border. An empty title is ignored.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.title = (!title.is_empty()).then_some(title);
        self
    }

    /// Minimum inner width in cells.
    #[must_use]
    pub fn min_width(mut self, min_width: usize) -> Self {
        self.min_width = min_width;
        self
    }

    /// Number of content rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the table has no content rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Content rows after trimming and alignment.
    #[must_use]
    pub fn aligned(&self) -> Alignment {
        let trimmed: Vec<DisplayLine> = self
            .lines
            .iter()
            .cloned()
            .map(|mut line| {
                line.trim_end();
                line
            })
            .collect();
        align(&trimmed)
    }

    /// Render the table, borders included, without colorizing rows.
    #[must_use]
    pub fn render_plain(&self) -> Vec<String> {
        self.render(&identity)
    }

    /// Render the table. Every returned string is one terminal line.
    #[must_use]
    pub fn render(&self, colorizer: &dyn Colorizer) -> Vec<String> {
        let aligned = self.aligned();
        let title = self
            .title
            .as_deref()
            .map(|t| format!("╼{t}╾"))
            .unwrap_or_default();
        let title_width = display_width(&title);
        let width = self
            .min_width
            .max(title_width)
            .max(aligned.max_width());

        let mut out = Vec::with_capacity(aligned.lines.len() + 2);
        out.push(BORDER.paint(&format!(
            "╭{title}{}╮",
            "─".repeat(width - title_width + 2)
        )));

        let left = BORDER.paint("│ ");
        let right = BORDER.paint("│");
        for (index, row) in aligned.lines.iter().enumerate() {
            let row_width = display_width(row);
            let styled = colorizer.colorize(index, row);
            debug_assert_eq!(
                visible_width(&styled),
                row_width,
                "colorizer changed the visible width of row {index}"
            );
            out.push(format!(
                "{left}{styled}{} {right}",
                " ".repeat(width - row_width)
            ));
        }

        out.push(BORDER.paint(&format!("╰{}╯", "─".repeat(width + 2))));
        out
    }

    /// Inner width the table would render at.
    #[must_use]
    pub fn width(&self) -> usize {
        let title_width = self
            .title
            .as_deref()
            .map_or(0, |t| display_width(t) + 2);
        self.min_width
            .max(title_width)
            .max(self.aligned().max_width())
    }
}
