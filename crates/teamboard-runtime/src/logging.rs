#![forbid(unsafe_code)]

//! Tracing setup.
//!
//! The dashboard owns stdout and redraws it with cursor-relative moves, so
//! log lines must never reach the terminal. Logs go to a file or nowhere.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "TEAMBOARD_LOG";

/// Where log events go.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogTarget {
    /// Drop every event.
    #[default]
    Disabled,
    /// Append JSON lines to this file.
    File(PathBuf),
}

/// Filter directive used when `TEAMBOARD_LOG` is unset.
#[must_use]
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "teamboard=debug,teamboard_runtime=debug,teamboard_enrich=debug,teamboard_render=debug"
    } else {
        "teamboard=info,teamboard_runtime=info,teamboard_enrich=info,teamboard_render=warn"
    }
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Install the global subscriber.
///
/// Returns an error if the log file cannot be opened. Installing twice is
/// not an error; the second call leaves the first subscriber in place.
pub fn init_logging(target: &LogTarget, verbose: bool) -> io::Result<()> {
    let LogTarget::File(path) = target else {
        return Ok(());
    };
    let file: File = OpenOptions::new().create(true).append(true).open(path)?;

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(filter(verbose))
        .try_init();
    Ok(())
}
