#![forbid(unsafe_code)]

use std::io::{self, Write};
use std::sync::Arc;

use tracing::info;

use teamboard_render::TerminalGuard;
use teamboard_runtime::{
    DETAIL, Dashboard, DashboardConfig, Dispatcher, HISTORY, Keymap, RosterView, init_logging,
};

use crate::cli::CliArgs;
use crate::demo::{DemoFile, DemoSource};
use crate::error::AppError;
use crate::keys::KeyReader;

/// Dashboard replaying `demo` into `writer`, with both lookups registered.
///
/// The demo's focus labels are used when `config` has none.
pub fn demo_dashboard<W: Write>(
    demo: Arc<DemoFile>,
    mut config: DashboardConfig,
    writer: W,
) -> Result<Dashboard<DemoSource, RosterView, W>, AppError> {
    if config.focus_labels.is_empty() {
        config.focus_labels = demo.focus_labels.clone();
    }
    let dash = Dashboard::new(DemoSource::new(Arc::clone(&demo)), RosterView, writer, config)?;
    dash.register(HISTORY, demo.history_lookup());
    dash.register(DETAIL, demo.detail_lookup());
    Ok(dash)
}

/// Run the dashboard on the terminal until the session ends or the user
/// quits.
pub fn run(args: &CliArgs) -> Result<(), AppError> {
    init_logging(&args.log_target(), args.verbose)?;

    let demo = Arc::new(DemoFile::load(&args.demo)?);
    let config = args.apply(DashboardConfig::from_env()?);
    let labels = if config.focus_labels.is_empty() {
        demo.focus_labels.clone()
    } else {
        config.focus_labels.clone()
    };
    let mut dash = demo_dashboard(demo, config, io::stdout())?;
    info!(event = "app.start", demo = %args.demo.display(), interactive = args.interactive);

    let mut guard = TerminalGuard::enter(args.guard_options())?;

    #[cfg(unix)]
    let signals = crate::signals::SignalForwarder::new(dash.handle())?;

    let keys = if args.interactive {
        let keymap = Keymap::with_defaults().buttons(&labels);
        Some(KeyReader::spawn(Dispatcher::new(keymap, dash.handle()))?)
    } else {
        None
    };

    let result = dash.run();

    drop(keys);
    #[cfg(unix)]
    drop(signals);
    guard.restore()?;

    result?;
    info!(event = "app.done");
    Ok(())
}
