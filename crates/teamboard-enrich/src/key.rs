#![forbid(unsafe_code)]

//! Keys for rows and their derived values.

use std::fmt;

/// Stable identity of one dashboard row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(String);

impl EntityKey {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityKey {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Kind of derived value. Each kind has its own lookup and its own worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnrichmentKind(&'static str);

impl EnrichmentKind {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for EnrichmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// One derived value: a subject, the kind of value, and an optional
/// sub-selector such as a role.
///
/// Keys are compared by value. A changed selector is a different key, so
/// the value computed for the old selector stays cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnrichmentKey {
    pub subject: EntityKey,
    pub kind: EnrichmentKind,
    pub selector: Option<String>,
}

impl EnrichmentKey {
    /// Key with no selector.
    #[must_use]
    pub fn new(subject: impl Into<EntityKey>, kind: EnrichmentKind) -> Self {
        Self {
            subject: subject.into(),
            kind,
            selector: None,
        }
    }

    /// Set the sub-selector.
    #[must_use]
    pub fn with_selector(mut self, selector: Option<impl Into<String>>) -> Self {
        self.selector = selector.map(Into::into);
        self
    }
}

impl fmt::Display for EnrichmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.subject)?;
        if let Some(selector) = &self.selector {
            write!(f, "/{selector}")?;
        }
        Ok(())
    }
}
