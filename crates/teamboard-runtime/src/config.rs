#![forbid(unsafe_code)]

//! Dashboard configuration.
//!
//! Defaults match an interactive session: the table refreshes four times a
//! second while a session is live and once a second while waiting for one.
//! Every field can be set with a builder method, and the numeric and boolean
//! fields can be overridden by `TEAMBOARD_*` environment variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `TEAMBOARD_POLL_MS` | [`poll_interval`](DashboardConfig::poll_interval) |
//! | `TEAMBOARD_AWAIT_MS` | [`await_interval`](DashboardConfig::await_interval) |
//! | `TEAMBOARD_MIN_WIDTH` | [`min_width`](DashboardConfig::min_width) |
//! | `TEAMBOARD_SYNC_OUTPUT` | [`sync_output`](DashboardConfig::sync_output) |

use std::time::Duration;

use crate::error::{DashboardError, Result};

/// Default banner shown while no session exists.
pub const DEFAULT_WAITING_BANNER: &str = "waiting for session, press Ctrl+C to abort";

/// Runtime configuration for [`Dashboard`](crate::Dashboard).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Tick interval while a session is displayed.
    pub poll_interval: Duration,
    /// Tick interval while waiting for a session.
    pub await_interval: Duration,
    /// Minimum inner table width in cells.
    pub min_width: usize,
    /// Wrap redraws in DEC 2026 synchronized output.
    pub sync_output: bool,
    /// Terminate lines with CRLF (required in raw mode).
    pub crlf: bool,
    /// Line printed while waiting; `None` prints nothing.
    pub waiting_banner: Option<String>,
    /// Focus choices, in cycle order. Empty disables the button bar.
    pub focus_labels: Vec<String>,
    /// Focus at session start.
    pub initial_focus: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            await_interval: Duration::from_secs(1),
            min_width: 40,
            sync_output: false,
            crlf: false,
            waiting_banner: Some(DEFAULT_WAITING_BANNER.to_owned()),
            focus_labels: Vec::new(),
            initial_focus: None,
        }
    }
}

impl DashboardConfig {
    /// Defaults with `TEAMBOARD_*` overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides read through `lookup`, which maps a variable name to
    /// its value.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ms) = parse_var::<u64>(&lookup, "TEAMBOARD_POLL_MS")? {
            self.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "TEAMBOARD_AWAIT_MS")? {
            self.await_interval = Duration::from_millis(ms);
        }
        if let Some(width) = parse_var::<usize>(&lookup, "TEAMBOARD_MIN_WIDTH")? {
            self.min_width = width;
        }
        if let Some(value) = lookup("TEAMBOARD_SYNC_OUTPUT") {
            self.sync_output = parse_flag("TEAMBOARD_SYNC_OUTPUT", &value)?;
        }
        self.validate()?;
        Ok(self)
    }

    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn await_interval(mut self, interval: Duration) -> Self {
        self.await_interval = interval;
        self
    }

    #[must_use]
    pub fn min_width(mut self, width: usize) -> Self {
        self.min_width = width;
        self
    }

    #[must_use]
    pub fn sync_output(mut self, enabled: bool) -> Self {
        self.sync_output = enabled;
        self
    }

    #[must_use]
    pub fn crlf(mut self, enabled: bool) -> Self {
        self.crlf = enabled;
        self
    }

    #[must_use]
    pub fn waiting_banner(mut self, banner: Option<impl Into<String>>) -> Self {
        self.waiting_banner = banner.map(Into::into);
        self
    }

    /// Focus choices offered by the button bar and focus cycling.
    #[must_use]
    pub fn focus_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.focus_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn initial_focus(mut self, focus: Option<impl Into<String>>) -> Self {
        self.initial_focus = focus.map(Into::into);
        self
    }

    /// Reject zero intervals and an initial focus that is not a label.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(DashboardError::config("poll interval must be positive"));
        }
        if self.await_interval.is_zero() {
            return Err(DashboardError::config("await interval must be positive"));
        }
        if let Some(focus) = &self.initial_focus
            && !self.focus_labels.is_empty()
            && !self.focus_labels.iter().any(|l| l == focus)
        {
            return Err(DashboardError::config(format!(
                "initial focus {focus:?} is not one of {:?}",
                self.focus_labels
            )));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>> {
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| DashboardError::config(format!("{name}={raw:?} is not a valid number")))
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(DashboardError::config(format!(
            "{name}={raw:?} is not a boolean"
        ))),
    }
}
