#![forbid(unsafe_code)]

//! Structured display lines.
//!
//! A [`DisplayLine`] is an ordered run of [`Segment`]s. Text segments carry
//! printable content; [`Segment::Mark`] is a zero-width alignment point. The
//! aligner pads every line so that the n-th mark of each line lands on the
//! same column (see [`crate::align`]).
//!
//! # Example
//! ```
//! use teamboard_render::DisplayLine;
//!
//! let line = DisplayLine::new().text("Ahri").mark().text(" │ mid");
//! assert_eq!(line.plain(), "Ahri │ mid");
//! assert_eq!(line.mark_count(), 1);
//! ```

use crate::display_width;

/// One unit of a display line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Printable text without line breaks.
    Text(String),
    /// Zero-width alignment point.
    Mark,
}

/// An ordered sequence of text runs and alignment marks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayLine {
    segments: Vec<Segment>,
}

impl DisplayLine {
    /// Create an empty line.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Append text (builder form).
    #[must_use]
    pub fn text(mut self, text: impl AsRef<str>) -> Self {
        self.push_str(text.as_ref());
        self
    }

    /// Append an alignment mark (builder form).
    #[must_use]
    pub fn mark(mut self) -> Self {
        self.push_mark();
        self
    }

    /// Append text, merging with a preceding text run.
    pub fn push_str(&mut self, text: &str) {
        debug_assert!(
            !text.contains(['\n', '\r']),
            "display lines must not contain line breaks"
        );
        if text.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some(Segment::Text(last)) => last.push_str(text),
            _ => self.segments.push(Segment::Text(text.to_owned())),
        }
    }

    /// Append an alignment mark.
    pub fn push_mark(&mut self) {
        self.segments.push(Segment::Mark);
    }

    /// The segments of this line.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the line carries at least one mark.
    #[must_use]
    pub fn has_mark(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Mark))
    }

    /// Number of marks in the line.
    #[must_use]
    pub fn mark_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Mark))
            .count()
    }

    /// Text content with marks dropped.
    #[must_use]
    pub fn plain(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Text(t) => Some(t.as_str()),
                Segment::Mark => None,
            })
            .collect()
    }

    /// Display width of the text content, ignoring marks.
    #[must_use]
    pub fn width(&self) -> usize {
        display_width(&self.plain())
    }

    /// Strip trailing whitespace from the text after the last mark.
    ///
    /// Stops at a mark: whitespace that precedes an alignment point is part
    /// of the column layout and is kept.
    pub fn trim_end(&mut self) {
        while let Some(Segment::Text(last)) = self.segments.last_mut() {
            let trimmed = last.trim_end().len();
            last.truncate(trimmed);
            if !last.is_empty() {
                break;
            }
            self.segments.pop();
        }
    }
}

impl From<&str> for DisplayLine {
    fn from(text: &str) -> Self {
        Self::new().text(text)
    }
}

impl From<String> for DisplayLine {
    fn from(text: String) -> Self {
        Self::new().text(text)
    }
}

impl FromIterator<Segment> for DisplayLine {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        let mut line = Self::new();
        for segment in iter {
            match segment {
                Segment::Text(text) => line.push_str(&text),
                Segment::Mark => line.push_mark(),
            }
        }
        line
    }
}
