#![forbid(unsafe_code)]

//! How rows turn into table lines.
//!
//! A [`RowView`] decides which enrichments a row needs, renders one row into
//! a fixed number of [`DisplayLine`]s and styles each aligned line. The
//! controller owns everything else: polling, claiming, diffing and redraw.
//!
//! [`RosterView`] is the shipped view: two lines per row, the first with the
//! row's label, badge and current pick, the second with the win/loss history
//! and the detail for the pick under the current focus.

use teamboard_enrich::{CacheEntry, EnrichmentKey, EnrichmentKind};
use teamboard_render::DisplayLine;
use teamboard_render::color::{ACCENT, GRAY, HIGHLIGHT, Paint, WARNING};

use crate::source::Entity;

/// Everything a view may show for one row, as of one tick.
///
/// Compared by value to decide whether a redraw is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowState {
    pub entity: Entity,
    pub selector: Option<String>,
    /// Wanted keys and their states, in the order the view asked for them.
    pub enrichments: Vec<(EnrichmentKey, CacheEntry<String>)>,
}

impl RowState {
    /// State of the first wanted key of `kind`; `Absent` if none was wanted.
    #[must_use]
    pub fn enrichment(&self, kind: EnrichmentKind) -> CacheEntry<String> {
        self.enrichments
            .iter()
            .find(|(key, _)| key.kind == kind)
            .map_or(CacheEntry::Absent, |(_, entry)| entry.clone())
    }
}

/// What a table line shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    /// Line `line` of row `row`.
    Row { row: usize, line: usize },
    /// The separator between row groups.
    Separator,
}

/// Role of every table line for `rows` rows.
///
/// The separator is placed before row `separator` and only when it splits
/// the rows into two non-empty groups.
#[must_use]
pub fn layout(rows: usize, lines_per_row: usize, separator: Option<usize>) -> Vec<LineRole> {
    let mut roles = Vec::with_capacity(rows * lines_per_row + 1);
    for row in 0..rows {
        if separator == Some(row) && row > 0 {
            roles.push(LineRole::Separator);
        }
        roles.extend((0..lines_per_row).map(|line| LineRole::Row { row, line }));
    }
    roles
}

/// Row presentation used by the controller.
pub trait RowView {
    /// Lines rendered per row. Must be the same for every row.
    fn lines_per_row(&self) -> usize;

    /// Enrichment keys the row needs, given its selector and the focus.
    fn wanted(
        &self,
        entity: &Entity,
        selector: Option<&str>,
        focus: Option<&str>,
    ) -> Vec<EnrichmentKey>;

    /// Exactly [`lines_per_row`](Self::lines_per_row) lines for one row.
    fn render_row(&self, row: &RowState) -> Vec<DisplayLine>;

    /// Separator line, if the view draws one.
    fn separator(&self) -> Option<DisplayLine> {
        None
    }

    /// Style one aligned line. Must keep its visible width.
    fn colorize(&self, role: LineRole, row: Option<&RowState>, line: &str) -> String {
        let _ = (role, row);
        line.to_owned()
    }
}

/// Win/loss history of the row's subject.
pub const HISTORY: EnrichmentKind = EnrichmentKind::new("history");
/// Detail for the row's pick under the current focus.
pub const DETAIL: EnrichmentKind = EnrichmentKind::new("detail");

/// Shown while a lookup is in flight.
pub const PENDING_PLACEHOLDER: &str = "…";
const FAILED_PREFIX: &str = "unavailable: ";
/// Between the left and right cells of a row line.
const CELL_SEP: &str = " │ ";

/// Two-line roster rows.
///
/// ```text
/// Faker C1  │ Ahri
/// WWLWL     │ Electrocute · Sudden Impact
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RosterView;

impl RosterView {
    fn cell(entry: &CacheEntry<String>) -> String {
        match entry {
            CacheEntry::Absent => String::new(),
            CacheEntry::Pending => PENDING_PLACEHOLDER.to_owned(),
            CacheEntry::Ready(value) => value.clone(),
            CacheEntry::Failed(reason) => format!("{FAILED_PREFIX}{reason}"),
        }
    }

    fn badge_paint(badge: &str) -> Paint {
        let tier = badge.chars().next().map(|c| c.to_ascii_uppercase());
        Paint::fg(match tier {
            Some('I') => 8,
            Some('B') => 95,
            Some('S') => 102,
            Some('G') => 179,
            Some('P') => 7,
            Some('D') => 14,
            Some('M') => 12,
            Some('C') => 50,
            _ => GRAY,
        })
    }

    fn paint_history(line: &str, history: &str) -> String {
        let count = history.chars().count();
        let mut out = String::with_capacity(line.len() * 2);
        let mut chars = line.chars();
        for (c, h) in chars.by_ref().zip(history.chars()).take(count) {
            match (c, h) {
                ('W', 'W') => Paint::fg(ACCENT).paint_into(&mut out, "•"),
                ('L', 'L') => Paint::fg(GRAY).paint_into(&mut out, "•"),
                _ => out.push(c),
            }
        }
        out.extend(chars);
        out
    }

    fn paint_badge(line: &str, entity: &Entity) -> String {
        let Some(badge) = entity.badge.as_deref() else {
            return line.to_owned();
        };
        let start = entity.label.len() + 1;
        if line.get(start..start + badge.len()) != Some(badge) {
            return line.to_owned();
        }
        let mut out = String::with_capacity(line.len() + 16);
        out.push_str(&line[..start]);
        Self::badge_paint(badge).paint_into(&mut out, badge);
        out.push_str(&line[start + badge.len()..]);
        out
    }

    /// The pick is the last cell of the head line.
    fn paint_pick(line: String, pick: &str) -> String {
        match line.strip_suffix(pick) {
            Some(head) if head.ends_with(CELL_SEP) => {
                let mut out = String::with_capacity(line.len() + 16);
                out.push_str(head);
                HIGHLIGHT.paint_into(&mut out, pick);
                out
            }
            _ => line,
        }
    }

    /// Style the detail line from the row's cache state: history dots or a
    /// failed history on the left, a failed detail on the right.
    fn paint_detail_line(line: &str, row: &RowState) -> String {
        let history = row.enrichment(HISTORY);
        let Some((head, rest)) = line.split_at_checked(Self::cell(&history).len()) else {
            return line.to_owned();
        };
        let mut out = String::with_capacity(line.len() * 2);
        match &history {
            CacheEntry::Ready(dots) => out.push_str(&Self::paint_history(head, dots)),
            CacheEntry::Failed(_) => WARNING.paint_into(&mut out, head),
            CacheEntry::Absent | CacheEntry::Pending => out.push_str(head),
        }
        let detail_failed = matches!(row.enrichment(DETAIL), CacheEntry::Failed(_));
        match rest.find(CELL_SEP) {
            Some(at) if detail_failed => {
                let cut = at + CELL_SEP.len();
                out.push_str(&rest[..cut]);
                WARNING.paint_into(&mut out, &rest[cut..]);
            }
            _ => out.push_str(rest),
        }
        out
    }
}

impl RowView for RosterView {
    fn lines_per_row(&self) -> usize {
        2
    }

    fn wanted(
        &self,
        entity: &Entity,
        selector: Option<&str>,
        focus: Option<&str>,
    ) -> Vec<EnrichmentKey> {
        let mut keys = vec![EnrichmentKey::new(entity.key.clone(), HISTORY)];
        if let Some(pick) = selector {
            keys.push(EnrichmentKey::new(pick, DETAIL).with_selector(focus));
        }
        keys
    }

    fn render_row(&self, row: &RowState) -> Vec<DisplayLine> {
        let mut head = DisplayLine::new().text(&row.entity.label);
        if let Some(badge) = &row.entity.badge {
            head.push_str(" ");
            head.push_str(badge);
        }
        head.push_mark();
        head.push_str(CELL_SEP);
        head.push_str(row.selector.as_deref().unwrap_or("-"));

        let detail = DisplayLine::new()
            .text(Self::cell(&row.enrichment(HISTORY)))
            .mark()
            .text(CELL_SEP)
            .text(Self::cell(&row.enrichment(DETAIL)));

        vec![head, detail]
    }

    fn separator(&self) -> Option<DisplayLine> {
        Some(DisplayLine::new().mark().text(" ┼"))
    }

    fn colorize(&self, role: LineRole, row: Option<&RowState>, line: &str) -> String {
        match (role, row) {
            (LineRole::Separator, _) => Paint::fg(GRAY).paint(&line.replace(' ', "─")),
            (LineRole::Row { line: 0, .. }, Some(row)) => {
                let out = Self::paint_badge(line, &row.entity);
                match row.selector.as_deref() {
                    Some(pick) => Self::paint_pick(out, pick),
                    None => out,
                }
            }
            (LineRole::Row { line: 1, .. }, Some(row)) => Self::paint_detail_line(line, row),
            _ => line.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teamboard_render::{Table, strip_sgr, visible_width};

    fn state(history: CacheEntry<String>, detail: CacheEntry<String>) -> RowState {
        let entity = Entity::new("p1", "Faker").badge("C1");
        let view = RosterView;
        let keys = view.wanted(&entity, Some("Ahri"), Some("mid"));
        RowState {
            entity,
            selector: Some("Ahri".into()),
            enrichments: keys.into_iter().zip([history, detail]).collect(),
        }
    }

    #[test]
    fn layout_places_separator_between_groups() {
        let roles = layout(3, 2, Some(1));
        assert_eq!(roles.len(), 7);
        assert_eq!(roles[2], LineRole::Separator);
        assert_eq!(roles[3], LineRole::Row { row: 1, line: 0 });
    }

    #[test]
    fn layout_ignores_separator_at_edges() {
        assert_eq!(layout(2, 2, Some(0)).len(), 4);
        assert_eq!(layout(2, 2, Some(2)).len(), 4);
        assert_eq!(layout(2, 2, None).len(), 4);
    }

    #[test]
    fn wanted_keys_follow_pick_and_focus() {
        let entity = Entity::new("p1", "Faker");
        let keys = RosterView.wanted(&entity, Some("Ahri"), Some("mid"));
        assert_eq!(keys[0], EnrichmentKey::new("p1", HISTORY));
        assert_eq!(
            keys[1],
            EnrichmentKey::new("Ahri", DETAIL).with_selector(Some("mid"))
        );
        assert_eq!(RosterView.wanted(&entity, None, Some("mid")).len(), 1);
    }

    #[test]
    fn pending_and_failed_cells() {
        let row = state(CacheEntry::Pending, CacheEntry::Failed("timeout".into()));
        let lines = RosterView.render_row(&row);
        assert_eq!(lines[0].plain(), "Faker C1 │ Ahri");
        assert_eq!(lines[1].plain(), "… │ unavailable: timeout");
    }

    #[test]
    fn colorizer_keeps_width() {
        let row = state(
            CacheEntry::Ready("WWL".into()),
            CacheEntry::Failed("timeout".into()),
        );
        let lines = RosterView.render_row(&row);
        let aligned = Table::new(lines).aligned();
        for (i, text) in aligned.lines.iter().enumerate() {
            let role = LineRole::Row { row: 0, line: i };
            let styled = RosterView.colorize(role, Some(&row), text);
            assert_eq!(visible_width(&styled), visible_width(text));
        }
    }

    #[test]
    fn history_becomes_dots() {
        let row = state(CacheEntry::Ready("WL".into()), CacheEntry::Ready("x".into()));
        let styled = RosterView.colorize(LineRole::Row { row: 0, line: 1 }, Some(&row), "WL    │ x");
        assert_eq!(strip_sgr(&styled), "••    │ x");
        assert!(styled.contains(&Paint::fg(ACCENT).paint("•")));
    }

    fn detail_line(row: &RowState) -> String {
        let text = RosterView.render_row(row)[1].plain();
        RosterView.colorize(LineRole::Row { row: 0, line: 1 }, Some(row), &text)
    }

    #[test]
    fn failed_detail_painted_with_alert_color() {
        let styled = detail_line(&state(
            CacheEntry::Pending,
            CacheEntry::Failed("timeout".into()),
        ));
        assert!(styled.contains(&WARNING.paint("unavailable: timeout")));
        assert_eq!(strip_sgr(&styled), "… │ unavailable: timeout");
    }

    #[test]
    fn ready_text_resembling_a_failure_is_not_alerted() {
        let styled = detail_line(&state(
            CacheEntry::Ready("WL".into()),
            CacheEntry::Ready("unavailable: in ranked".into()),
        ));
        assert!(!styled.contains(&WARNING.paint("unavailable: in ranked")));
        assert!(styled.ends_with(" │ unavailable: in ranked"));
    }

    #[test]
    fn failed_history_painted_with_alert_color() {
        let styled = detail_line(&state(
            CacheEntry::Failed("private".into()),
            CacheEntry::Ready("runes".into()),
        ));
        assert!(styled.starts_with(&WARNING.paint("unavailable: private")));
        assert!(styled.ends_with(" │ runes"));
    }

    #[test]
    fn pick_highlighted() {
        let row = state(CacheEntry::Pending, CacheEntry::Pending);
        let styled = RosterView.colorize(
            LineRole::Row { row: 0, line: 0 },
            Some(&row),
            "Faker C1 │ Ahri",
        );
        assert!(styled.ends_with(&HIGHLIGHT.paint("Ahri")));

        let mut unpicked = row.clone();
        unpicked.selector = None;
        let styled = RosterView.colorize(
            LineRole::Row { row: 0, line: 0 },
            Some(&unpicked),
            "Faker C1 │ -",
        );
        assert!(styled.ends_with(" │ -"));
    }

    #[test]
    fn separator_draws_rule() {
        let styled = RosterView.colorize(LineRole::Separator, None, "      ┼");
        assert_eq!(strip_sgr(&styled), "──────┼");
    }

    #[test]
    fn badge_painted_by_tier() {
        let row = state(CacheEntry::Pending, CacheEntry::Pending);
        let styled = RosterView.colorize(
            LineRole::Row { row: 0, line: 0 },
            Some(&row),
            "Faker C1 │ Ahri",
        );
        assert!(styled.contains(&Paint::fg(50).paint("C1")));
        assert_eq!(strip_sgr(&styled), "Faker C1 │ Ahri");
    }
}
