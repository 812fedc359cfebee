#![forbid(unsafe_code)]

//! Scripted session loaded from a JSON file.
//!
//! A demo file describes a roster, when the session starts and ends (in
//! polls), how each entity's pick evolves, and the answers the `history`
//! and `detail` lookups give, with an artificial latency so the pending
//! state is visible.
//!
//! ```json
//! {
//!   "title": "RANKED SOLO/DUO",
//!   "separator": 5,
//!   "start_after_polls": 4,
//!   "session_polls": 120,
//!   "pick_every_polls": 8,
//!   "latency_ms": 600,
//!   "entities": [
//!     { "id": "p1", "name": "Faker", "badge": "C1", "picks": ["Ahri"], "history": "WWLWW" }
//!   ],
//!   "details": { "Ahri/mid": "Electrocute · Sudden Impact", "Ahri": "Electrocute" },
//!   "failures": { "Zed": "rate limited" }
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use teamboard_enrich::{EnrichmentKey, EntityKey, Lookup, LookupError};
use teamboard_runtime::{Entity, EntityPoll, EntitySource, SessionInfo};

/// Errors loading a demo file.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("cannot read demo file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse demo file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid demo file {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DemoEntity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub badge: Option<String>,
    /// Picks in the order they are revealed.
    #[serde(default)]
    pub picks: Vec<String>,
    /// Win/loss history as a string of `W` and `L`.
    #[serde(default)]
    pub history: Option<String>,
}

fn default_session_polls() -> u64 {
    240
}

fn default_pick_every() -> u64 {
    4
}

fn default_latency_ms() -> u64 {
    500
}

/// Parsed demo file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DemoFile {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub separator: Option<usize>,
    /// Polls answered with "waiting" before the session starts.
    #[serde(default)]
    pub start_after_polls: u64,
    /// Polls the session lasts once started.
    #[serde(default = "default_session_polls")]
    pub session_polls: u64,
    /// Polls between two reveals of each entity's next pick.
    #[serde(default = "default_pick_every")]
    pub pick_every_polls: u64,
    /// Simulated lookup latency.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    /// Focus labels offered as buttons.
    #[serde(default)]
    pub focus_labels: Vec<String>,
    pub entities: Vec<DemoEntity>,
    /// Detail text keyed by `pick/focus`, falling back to `pick`.
    #[serde(default)]
    pub details: HashMap<String, String>,
    /// Picks whose detail lookup fails, with the reason.
    #[serde(default)]
    pub failures: HashMap<String, String>,
}

impl DemoFile {
    /// Read and validate a demo file.
    pub fn load(path: &Path) -> Result<Self, DemoError> {
        let text = fs::read_to_string(path).map_err(|source| DemoError::Read {
            path: path.to_owned(),
            source,
        })?;
        let demo: Self = serde_json::from_str(&text).map_err(|source| DemoError::Parse {
            path: path.to_owned(),
            source,
        })?;
        demo.validate().map_err(|message| DemoError::Invalid {
            path: path.to_owned(),
            message,
        })?;
        debug!(
            event = "demo.loaded",
            path = %path.display(),
            entities = demo.entities.len()
        );
        Ok(demo)
    }

    fn validate(&self) -> Result<(), String> {
        if self.entities.is_empty() {
            return Err("no entities".to_owned());
        }
        if self.pick_every_polls == 0 {
            return Err("pick_every_polls must be at least 1".to_owned());
        }
        let mut ids = std::collections::HashSet::new();
        for entity in &self.entities {
            if !ids.insert(entity.id.as_str()) {
                return Err(format!("duplicate entity id {:?}", entity.id));
            }
            if let Some(history) = &entity.history
                && !history.chars().all(|c| c == 'W' || c == 'L')
            {
                return Err(format!(
                    "history of {:?} must only contain W and L",
                    entity.id
                ));
            }
        }
        Ok(())
    }

    fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    /// Lookup for the `history` kind.
    #[must_use]
    pub fn history_lookup(self: &Arc<Self>) -> impl Lookup<String> + 'static {
        let demo = Arc::clone(self);
        move |key: &EnrichmentKey| -> Result<String, LookupError> {
            thread::sleep(demo.latency());
            demo.entities
                .iter()
                .find(|e| e.id == key.subject.as_str())
                .and_then(|e| e.history.clone())
                .ok_or(LookupError::NoData)
        }
    }

    /// Lookup for the `detail` kind.
    #[must_use]
    pub fn detail_lookup(self: &Arc<Self>) -> impl Lookup<String> + 'static {
        let demo = Arc::clone(self);
        move |key: &EnrichmentKey| -> Result<String, LookupError> {
            thread::sleep(demo.latency());
            let pick = key.subject.as_str();
            if let Some(reason) = demo.failures.get(pick) {
                return Err(LookupError::Failed(reason.clone()));
            }
            key.selector
                .as_ref()
                .and_then(|focus| demo.details.get(&format!("{pick}/{focus}")))
                .or_else(|| demo.details.get(pick))
                .cloned()
                .ok_or(LookupError::NoData)
        }
    }
}

/// [`EntitySource`] replaying a [`DemoFile`].
#[derive(Debug)]
pub struct DemoSource {
    demo: Arc<DemoFile>,
    polls: u64,
}

impl DemoSource {
    #[must_use]
    pub fn new(demo: Arc<DemoFile>) -> Self {
        Self { demo, polls: 0 }
    }

    /// Polls since the session started; `None` before it.
    fn session_polls(&self) -> Option<u64> {
        self.polls
            .checked_sub(self.demo.start_after_polls.saturating_add(1))
    }
}

impl EntitySource for DemoSource {
    fn fetch_entities(&mut self) -> EntityPoll {
        self.polls = self.polls.saturating_add(1);
        let Some(elapsed) = self.session_polls() else {
            return EntityPoll::Waiting;
        };
        if elapsed >= self.demo.session_polls {
            return EntityPoll::Ended;
        }
        EntityPoll::Session(SessionInfo {
            title: self.demo.title.clone(),
            separator: self.demo.separator,
            entities: self
                .demo
                .entities
                .iter()
                .map(|e| {
                    let entity = Entity::new(e.id.as_str(), e.name.as_str());
                    match &e.badge {
                        Some(badge) => entity.badge(badge.as_str()),
                        None => entity,
                    }
                })
                .collect(),
        })
    }

    fn fetch_selector(&mut self, key: &EntityKey) -> Option<String> {
        let revealed = self.session_polls()? / self.demo.pick_every_polls;
        let entity = self.demo.entities.iter().find(|e| e.id == key.as_str())?;
        let index = usize::try_from(revealed).ok()?.checked_sub(1)?;
        entity
            .picks
            .get(index.min(entity.picks.len().checked_sub(1)?))
            .cloned()
    }
}
