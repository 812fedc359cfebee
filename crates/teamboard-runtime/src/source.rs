#![forbid(unsafe_code)]

//! The upstream collaborator the dashboard polls.

use teamboard_enrich::EntityKey;

/// One row subject as reported by the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub key: EntityKey,
    /// Name shown in the first column.
    pub label: String,
    /// Short tag shown after the label, e.g. a rank.
    pub badge: Option<String>,
}

impl Entity {
    #[must_use]
    pub fn new(key: impl Into<EntityKey>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            badge: None,
        }
    }

    #[must_use]
    pub fn badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }
}

/// A live session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionInfo {
    /// Shown in the table's top border.
    pub title: Option<String>,
    /// Entities in source order.
    pub entities: Vec<Entity>,
    /// Row index before which a separator line is drawn (between teams).
    pub separator: Option<usize>,
}

/// Result of one entity poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityPoll {
    /// A session exists. An empty entity list while a session is displayed
    /// ends it.
    Session(SessionInfo),
    /// Nothing yet; poll again later.
    Waiting,
    /// The session is over for good.
    Ended,
}

/// Blocking access to the current session.
///
/// Both calls run on the controller thread once per tick and should return
/// quickly; slow derived data belongs in an enrichment lookup instead.
pub trait EntitySource {
    /// Current entity set.
    fn fetch_entities(&mut self) -> EntityPoll;

    /// Current selector of one entity, e.g. the item it has picked.
    fn fetch_selector(&mut self, key: &EntityKey) -> Option<String>;
}

impl<S: EntitySource + ?Sized> EntitySource for Box<S> {
    fn fetch_entities(&mut self) -> EntityPoll {
        (**self).fetch_entities()
    }

    fn fetch_selector(&mut self, key: &EntityKey) -> Option<String> {
        (**self).fetch_selector(key)
    }
}
