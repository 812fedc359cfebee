#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::time::Duration;

use clap::{Arg, ArgAction, ArgMatches, Command};

use teamboard_render::GuardOptions;
use teamboard_runtime::{DashboardConfig, LogTarget};

use crate::error::AppError;

pub fn build_cli() -> Command {
    Command::new("teamboard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Live roster dashboard for the terminal")
        .long_about(
            "teamboard polls a session for its roster and keeps a boxed table of the roster \
             up to date in place, filling in per-row details from background lookups. The \
             table is erased when the session ends.",
        )
        .arg(
            Arg::new("demo")
                .long("demo")
                .short('d')
                .value_name("FILE")
                .help("Replay a scripted session from a JSON file")
                .env("TEAMBOARD_DEMO")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("poll-ms")
                .long("poll-ms")
                .value_name("MS")
                .help("Refresh interval while a session is shown")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("min-width")
                .long("min-width")
                .value_name("CELLS")
                .help("Minimum inner width of the table")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("focus")
                .long("focus")
                .short('f')
                .value_name("LABEL")
                .help("Focus shown when the session starts"),
        )
        .arg(
            Arg::new("interactive")
                .long("interactive")
                .short('i')
                .help("Read focus keys from the terminal (raw mode)")
                .long_help(
                    "Read focus keys from the terminal in raw mode. Each focus label is \
                     selected with Ctrl+Shift+<first letter> on terminals with kitty \
                     keyboard support, or with Alt+<first letter> or its position 1-9 \
                     elsewhere. Tab cycles the focus, r redraws, q or Ctrl+C quits.",
                )
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("sync-output")
                .long("sync-output")
                .help("Wrap redraws in synchronized output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("PATH")
                .help("Append JSON log lines to this file")
                .env("TEAMBOARD_LOG_FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub demo: PathBuf,
    pub poll_ms: Option<u64>,
    pub min_width: Option<usize>,
    pub focus: Option<String>,
    pub interactive: bool,
    pub sync_output: bool,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
}

impl CliArgs {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, AppError> {
        let demo = matches
            .get_one::<PathBuf>("demo")
            .cloned()
            .ok_or_else(|| AppError::Cli("--demo is required".to_owned()))?;
        Ok(Self {
            demo,
            poll_ms: matches.get_one::<u64>("poll-ms").copied(),
            min_width: matches.get_one::<usize>("min-width").copied(),
            focus: matches.get_one::<String>("focus").cloned(),
            interactive: matches.get_flag("interactive"),
            sync_output: matches.get_flag("sync-output"),
            log_file: matches.get_one::<PathBuf>("log-file").cloned(),
            verbose: matches.get_flag("verbose"),
        })
    }

    pub fn log_target(&self) -> LogTarget {
        self.log_file
            .clone()
            .map_or(LogTarget::Disabled, LogTarget::File)
    }

    /// Terminal state for this run. Interactive runs read key chords, which
    /// needs raw mode and kitty keyboard reporting.
    pub fn guard_options(&self) -> GuardOptions {
        if self.interactive {
            GuardOptions::interactive()
        } else {
            GuardOptions::default()
        }
    }

    /// Flags given on the command line win over `TEAMBOARD_*` variables,
    /// which win over the defaults.
    pub fn apply(&self, mut config: DashboardConfig) -> DashboardConfig {
        if let Some(ms) = self.poll_ms {
            config = config.poll_interval(Duration::from_millis(ms));
        }
        if let Some(width) = self.min_width {
            config = config.min_width(width);
        }
        if self.sync_output {
            config = config.sync_output(true);
        }
        if self.focus.is_some() {
            config = config.initial_focus(self.focus.clone());
        }
        config.crlf(self.interactive)
    }
}
