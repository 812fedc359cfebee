#![forbid(unsafe_code)]

//! Column alignment across display lines.
//!
//! Every line may carry any number of [`Segment::Mark`]s. Alignment runs in
//! passes: each pass looks at the first unresolved mark of every line,
//! finds the widest column among them, and pads each marked line with
//! spaces up to that column. The mark is then consumed and the next pass
//! handles the following ordinal, until no marks remain.
//!
//! Lines that share the k-th mark form one [`AlignmentGroup`]. The result
//! is a pure function of the input: nothing is cached between calls, so a
//! redraw always recomputes the layout from the current lines.

use crate::display_width;
use crate::segment::{DisplayLine, Segment};

/// Lines that had their k-th mark resolved to a common column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentGroup {
    /// Mark ordinal (0 for the first mark of each line).
    pub ordinal: usize,
    /// Column (in cells) at which the text following the mark starts.
    pub column: usize,
    /// Indices of the lines that carried this mark.
    pub members: Vec<usize>,
}

/// Output of [`align`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    /// Aligned plain-text lines, in input order.
    pub lines: Vec<String>,
    /// One group per mark ordinal, in ordinal order.
    pub groups: Vec<AlignmentGroup>,
}

impl Alignment {
    /// Widest aligned line, in cells.
    #[must_use]
    pub fn max_width(&self) -> usize {
        self.lines
            .iter()
            .map(|l| display_width(l))
            .max()
            .unwrap_or(0)
    }
}

struct Cursor<'a> {
    out: String,
    rest: &'a [Segment],
}

impl Cursor<'_> {
    /// Consume text up to the next mark; returns the mark's column.
    fn advance_to_mark(&mut self) -> Option<usize> {
        while let Some((segment, tail)) = self.rest.split_first() {
            match segment {
                Segment::Text(text) => {
                    self.out.push_str(text);
                    self.rest = tail;
                }
                Segment::Mark => return Some(display_width(&self.out)),
            }
        }
        None
    }

    fn resolve_mark(&mut self, column: usize, target: usize) {
        self.out
            .extend(std::iter::repeat_n(' ', target.saturating_sub(column)));
        self.rest = &self.rest[1..];
    }
}

/// Align all lines on their marks.
#[must_use]
pub fn align(lines: &[DisplayLine]) -> Alignment {
    let mut cursors: Vec<Cursor<'_>> = lines
        .iter()
        .map(|line| Cursor {
            out: String::new(),
            rest: line.segments(),
        })
        .collect();
    let mut groups = Vec::new();

    loop {
        let columns: Vec<Option<usize>> =
            cursors.iter_mut().map(Cursor::advance_to_mark).collect();
        let Some(target) = columns.iter().flatten().copied().max() else {
            break;
        };

        let mut members = Vec::new();
        for (index, (cursor, column)) in cursors.iter_mut().zip(&columns).enumerate() {
            if let Some(column) = *column {
                cursor.resolve_mark(column, target);
                members.push(index);
            }
        }
        groups.push(AlignmentGroup {
            ordinal: groups.len(),
            column: target,
            members,
        });
    }

    Alignment {
        lines: cursors.into_iter().map(|c| c.out).collect(),
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(parts: &[Option<&str>]) -> DisplayLine {
        parts
            .iter()
            .map(|p| match p {
                Some(t) => Segment::Text((*t).to_owned()),
                None => Segment::Mark,
            })
            .collect()
    }

    #[test]
    fn lines_without_marks_pass_through() {
        let out = align(&[DisplayLine::from("abc"), DisplayLine::from("de")]);
        assert_eq!(out.lines, vec!["abc", "de"]);
        assert!(out.groups.is_empty());
    }

    #[test]
    fn single_mark_lines_up_columns() {
        let out = align(&[
            line(&[Some("a"), None, Some("|x")]),
            line(&[Some("abcd"), None, Some("|y")]),
        ]);
        assert_eq!(out.lines, vec!["a   |x", "abcd|y"]);
        assert_eq!(out.groups.len(), 1);
        assert_eq!(out.groups[0].column, 4);
        assert_eq!(out.groups[0].members, vec![0, 1]);
    }

    #[test]
    fn later_marks_account_for_earlier_padding() {
        let out = align(&[
            line(&[Some("a"), None, Some(" 1"), None, Some(" end")]),
            line(&[Some("abc"), None, Some(" 12345"), None, Some(" end")]),
        ]);
        assert_eq!(out.lines[0], "a   1     end");
        assert_eq!(out.lines[1], "abc 12345 end");
        assert_eq!(out.groups[1].column, 9);
    }

    #[test]
    fn unmarked_line_does_not_join_group() {
        let out = align(&[
            line(&[Some("ab"), None, Some("x")]),
            DisplayLine::from("abcdefgh"),
            line(&[Some("abcd"), None, Some("y")]),
        ]);
        assert_eq!(out.lines, vec!["ab  x", "abcdefgh", "abcdy"]);
        assert_eq!(out.groups[0].members, vec![0, 2]);
    }

    #[test]
    fn lines_with_fewer_marks_drop_out_of_later_groups() {
        let out = align(&[
            line(&[Some("a"), None, Some("b"), None, Some("c")]),
            line(&[Some("aaa"), None, Some("b")]),
        ]);
        assert_eq!(out.lines, vec!["a  bc", "aaab"]);
        assert_eq!(out.groups[1].members, vec![0]);
    }

    #[test]
    fn leading_mark_aligns_to_widest_prefix() {
        let out = align(&[line(&[None, Some(" ┼")]), line(&[Some("name"), None, Some(" │")])]);
        assert_eq!(out.lines, vec!["     ┼", "name │"]);
    }

    #[test]
    fn wide_glyphs_use_cell_width() {
        let out = align(&[
            line(&[Some("日本"), None, Some("|")]),
            line(&[Some("abc"), None, Some("|")]),
        ]);
        assert_eq!(out.lines, vec!["日本|", "abc |"]);
        assert_eq!(out.max_width(), 5);
    }

    #[test]
    fn empty_input() {
        let out = align(&[]);
        assert!(out.lines.is_empty());
        assert_eq!(out.max_width(), 0);
    }
}
