#![forbid(unsafe_code)]

//! The dashboard poll loop.
//!
//! # State machine
//!
//! ```text
//! AwaitingSession ──(non-empty session)──▶ ActiveDisplay ──(ended / empty / quit)──▶ Ended
//!        │                                                                          ▲
//!        └──────────────────────────(ended / quit)──────────────────────────────────┘
//! ```
//!
//! While awaiting, a banner line is shown. On session start the banner is
//! erased and the log size is remembered as the anchor; every redraw then
//! replaces everything printed after the anchor, and the end of the session
//! erases back to it.
//!
//! Each active tick applies queued actions, drains worker completions,
//! polls the source, claims missing enrichments and builds a
//! [`RenderedSnapshot`]. The table is redrawn only when the snapshot differs
//! from the one on screen.
//!
//! The controller is the only writer to the terminal. Workers report through
//! the cache and the completion channel, and other threads reach the
//! controller only through a [`DashboardHandle`].

use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use tracing::{debug, info, trace};

use teamboard_enrich::{
    Completion, EnrichmentCache, EnrichmentKey, EnrichmentKind, EntityKey, Lookup, WorkerPool,
};
use teamboard_render::{DisplayLine, RenderLog, Table};

use crate::config::DashboardConfig;
use crate::dispatch::{Action, button_bar};
use crate::error::Result;
use crate::source::{Entity, EntityPoll, EntitySource, SessionInfo};
use crate::view::{LineRole, RowState, RowView, layout};
use crate::wake::WakeSignal;

/// Controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingSession,
    ActiveDisplay,
    Ended,
}

/// Everything that determined the table currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSnapshot {
    pub title: Option<String>,
    pub separator: Option<usize>,
    pub focus: Option<String>,
    pub rows: Vec<RowState>,
}

/// What one [`Dashboard::tick`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Phase after the tick.
    pub phase: Phase,
    /// Whether the table was reprinted.
    pub redrawn: bool,
    /// Keys claimed and handed to workers during this tick.
    pub claims: Vec<EnrichmentKey>,
    /// Worker completions drained during this tick.
    pub completed: usize,
}

impl TickReport {
    fn new(phase: Phase) -> Self {
        Self {
            phase,
            redrawn: false,
            claims: Vec::new(),
            completed: 0,
        }
    }
}

/// Cloneable remote control for a running dashboard.
///
/// Every call queues an action and wakes the poll loop, so the change is
/// applied on the next tick instead of after a full poll interval.
#[derive(Debug, Clone)]
pub struct DashboardHandle {
    actions: Sender<Action>,
    wake: WakeSignal,
}

impl DashboardHandle {
    /// Queue `action` and wake the loop. Ignored once the dashboard is gone.
    pub fn send(&self, action: Action) {
        if self.actions.send(action).is_ok() {
            self.wake.wake();
        }
    }

    pub fn set_focus(&self, focus: Option<impl Into<String>>) {
        self.send(Action::SetFocus(focus.map(Into::into)));
    }

    pub fn cycle_focus(&self) {
        self.send(Action::CycleFocus);
    }

    pub fn refresh(&self) {
        self.send(Action::Refresh);
    }

    pub fn quit(&self) {
        self.send(Action::Quit);
    }

    /// Interrupt the loop's sleep without queueing anything.
    pub fn wake(&self) {
        self.wake.wake();
    }
}

/// Live dashboard over an [`EntitySource`], drawn by a [`RowView`].
pub struct Dashboard<S, V, W: Write> {
    source: S,
    view: V,
    log: RenderLog<W>,
    config: DashboardConfig,
    pool: WorkerPool<String>,
    completions: Receiver<Completion<String>>,
    wake: WakeSignal,
    actions_tx: Sender<Action>,
    actions: Receiver<Action>,
    phase: Phase,
    banner_lines: usize,
    seek: usize,
    rows: Vec<Entity>,
    seen: HashSet<EntityKey>,
    title: Option<String>,
    separator: Option<usize>,
    focus: Option<String>,
    snapshot: Option<RenderedSnapshot>,
    force_redraw: bool,
    quit: bool,
}

impl<S, V, W> Dashboard<S, V, W>
where
    S: EntitySource,
    V: RowView,
    W: Write,
{
    /// Dashboard writing to `writer`. The config is validated here.
    pub fn new(source: S, view: V, writer: W, config: DashboardConfig) -> Result<Self> {
        config.validate()?;
        let log = RenderLog::new(writer)
            .with_crlf(config.crlf)
            .with_sync_output(config.sync_output);
        let (pool, completions) = WorkerPool::new(Arc::new(EnrichmentCache::new()));
        let (actions_tx, actions) = mpsc::channel();
        Ok(Self {
            source,
            view,
            log,
            focus: config.initial_focus.clone(),
            config,
            pool,
            completions,
            wake: WakeSignal::new(),
            actions_tx,
            actions,
            phase: Phase::AwaitingSession,
            banner_lines: 0,
            seek: 0,
            rows: Vec::new(),
            seen: HashSet::new(),
            title: None,
            separator: None,
            snapshot: None,
            force_redraw: false,
            quit: false,
        })
    }

    /// Install the lookup for one enrichment kind.
    pub fn register(&self, kind: EnrichmentKind, lookup: impl Lookup<String> + 'static) {
        self.pool.register(kind, lookup);
    }

    /// Remote control usable from other threads.
    #[must_use]
    pub fn handle(&self) -> DashboardHandle {
        DashboardHandle {
            actions: self.actions_tx.clone(),
            wake: self.wake.clone(),
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    /// The enrichment cache shared with the workers.
    #[must_use]
    pub fn cache(&self) -> &Arc<EnrichmentCache<String>> {
        self.pool.cache()
    }

    /// The worker pool, e.g. to wait for lookups in tests.
    #[must_use]
    pub fn pool(&self) -> &WorkerPool<String> {
        &self.pool
    }

    #[must_use]
    pub fn log(&self) -> &RenderLog<W> {
        &self.log
    }

    /// Log size at session start; `None` before a session started.
    #[must_use]
    pub fn anchor(&self) -> Option<usize> {
        (self.phase != Phase::AwaitingSession).then_some(self.seek)
    }

    /// The snapshot behind the table on screen.
    #[must_use]
    pub fn snapshot(&self) -> Option<&RenderedSnapshot> {
        self.snapshot.as_ref()
    }

    /// Consume the dashboard and return its writer.
    pub fn into_writer(self) -> W {
        self.log.into_inner()
    }

    /// Tick until the session ends, sleeping between ticks on the wake
    /// signal.
    pub fn run(&mut self) -> Result<()> {
        info!(event = "dashboard.run");
        loop {
            let report = self.tick()?;
            let interval: Duration = match report.phase {
                Phase::Ended => break,
                Phase::AwaitingSession => self.config.await_interval,
                Phase::ActiveDisplay => self.config.poll_interval,
            };
            self.wake.wait_timeout(interval);
        }
        info!(event = "dashboard.done");
        Ok(())
    }

    /// Run one step of the state machine.
    pub fn tick(&mut self) -> Result<TickReport> {
        self.apply_actions();
        if self.phase == Phase::Ended {
            return Ok(TickReport::new(Phase::Ended));
        }
        if self.quit {
            info!(event = "dashboard.quit");
            self.end()?;
            return Ok(TickReport::new(Phase::Ended));
        }

        let poll = self.source.fetch_entities();
        match self.phase {
            Phase::AwaitingSession => match poll {
                EntityPoll::Session(info) if !info.entities.is_empty() => {
                    self.start(info)?;
                }
                EntityPoll::Ended => {
                    self.end()?;
                    return Ok(TickReport::new(Phase::Ended));
                }
                EntityPoll::Session(_) | EntityPoll::Waiting => {
                    self.show_banner()?;
                    return Ok(TickReport::new(Phase::AwaitingSession));
                }
            },
            Phase::ActiveDisplay => match poll {
                EntityPoll::Session(info) if !info.entities.is_empty() => self.merge(info),
                EntityPoll::Session(_) | EntityPoll::Ended => {
                    self.end()?;
                    return Ok(TickReport::new(Phase::Ended));
                }
                EntityPoll::Waiting => trace!(event = "dashboard.transient_empty"),
            },
            Phase::Ended => unreachable!("handled above"),
        }

        self.active_tick()
    }

    fn apply_actions(&mut self) {
        while let Ok(action) = self.actions.try_recv() {
            debug!(event = "dashboard.action", action = ?action);
            match action {
                Action::SetFocus(focus) => self.focus = focus,
                Action::CycleFocus => self.cycle_focus(),
                Action::Refresh => self.force_redraw = true,
                Action::Quit => self.quit = true,
            }
        }
    }

    fn cycle_focus(&mut self) {
        let labels = &self.config.focus_labels;
        if labels.is_empty() {
            return;
        }
        let next = match &self.focus {
            Some(current) => labels
                .iter()
                .position(|l| l == current)
                .map_or(0, |i| (i + 1) % labels.len()),
            None => 0,
        };
        self.focus = Some(labels[next].clone());
    }

    fn show_banner(&mut self) -> Result<()> {
        if self.banner_lines > 0 {
            return Ok(());
        }
        if let Some(banner) = &self.config.waiting_banner {
            self.log.append([banner.clone()])?;
            self.banner_lines = 1;
        }
        Ok(())
    }

    fn hide_banner(&mut self) -> Result<()> {
        self.log.erase(self.banner_lines)?;
        self.banner_lines = 0;
        Ok(())
    }

    fn start(&mut self, info: SessionInfo) -> Result<()> {
        self.hide_banner()?;
        self.seek = self.log.size();
        self.phase = Phase::ActiveDisplay;
        self.merge(info);
        info!(
            event = "dashboard.session_start",
            rows = self.rows.len(),
            anchor = self.seek
        );
        Ok(())
    }

    /// Fold a poll into the row list. New keys are appended in first-seen
    /// order; known keys keep their position and take the latest label.
    fn merge(&mut self, info: SessionInfo) {
        self.title = info.title;
        self.separator = info.separator;
        for entity in info.entities {
            if self.seen.insert(entity.key.clone()) {
                debug!(event = "dashboard.row_added", key = %entity.key);
                self.rows.push(entity);
            } else if let Some(row) = self.rows.iter_mut().find(|r| r.key == entity.key) {
                *row = entity;
            }
        }
    }

    fn end(&mut self) -> Result<()> {
        match self.phase {
            Phase::AwaitingSession => self.hide_banner()?,
            Phase::ActiveDisplay => {
                let erased = self.log.size() - self.seek;
                self.log.truncate_to(self.seek)?;
                info!(event = "dashboard.session_end", erased);
            }
            Phase::Ended => {}
        }
        self.phase = Phase::Ended;
        Ok(())
    }

    fn active_tick(&mut self) -> Result<TickReport> {
        let mut report = TickReport::new(Phase::ActiveDisplay);
        report.completed = self.completions.try_iter().count();

        let mut states = Vec::with_capacity(self.rows.len());
        for entity in &self.rows {
            let selector = self.source.fetch_selector(&entity.key);
            let wanted = self
                .view
                .wanted(entity, selector.as_deref(), self.focus.as_deref());
            let mut enrichments = Vec::with_capacity(wanted.len());
            for key in wanted {
                if self.pool.request(key.clone()) {
                    report.claims.push(key.clone());
                }
                let entry = self.pool.cache().get(&key);
                enrichments.push((key, entry));
            }
            states.push(RowState {
                entity: entity.clone(),
                selector,
                enrichments,
            });
        }

        let snapshot = RenderedSnapshot {
            title: self.title.clone(),
            separator: self.separator,
            focus: self.focus.clone(),
            rows: states,
        };
        if self.force_redraw || self.snapshot.as_ref() != Some(&snapshot) {
            self.redraw(&snapshot)?;
            self.snapshot = Some(snapshot);
            self.force_redraw = false;
            report.redrawn = true;
        }
        if !report.claims.is_empty() || report.completed > 0 {
            debug!(
                event = "dashboard.tick",
                claims = report.claims.len(),
                completed = report.completed,
                redrawn = report.redrawn
            );
        }
        Ok(report)
    }

    fn redraw(&mut self, snapshot: &RenderedSnapshot) -> Result<()> {
        let separator_line = self.view.separator();
        let separator = separator_line.as_ref().and(snapshot.separator);
        let roles = layout(snapshot.rows.len(), self.view.lines_per_row(), separator);

        let mut rendered_rows: Vec<Vec<DisplayLine>> = snapshot
            .rows
            .iter()
            .map(|row| {
                let lines = self.view.render_row(row);
                debug_assert_eq!(lines.len(), self.view.lines_per_row());
                lines
            })
            .collect();
        let lines: Vec<DisplayLine> = roles
            .iter()
            .map(|role| match *role {
                LineRole::Row { row, line } => {
                    std::mem::take(&mut rendered_rows[row][line])
                }
                LineRole::Separator => separator_line.clone().unwrap_or_default(),
            })
            .collect();

        let mut table = Table::new(lines).min_width(self.config.min_width);
        if let Some(title) = &snapshot.title {
            table = table.title(title.clone());
        }
        let view = &self.view;
        let mut out = table.render(&|i: usize, line: &str| {
            let role = roles[i];
            let row = match role {
                LineRole::Row { row, .. } => snapshot.rows.get(row),
                LineRole::Separator => None,
            };
            view.colorize(role, row, line)
        });
        if !self.config.focus_labels.is_empty() {
            out.push(button_bar(&self.config.focus_labels, snapshot.focus.as_deref()));
        }

        let previous = self.log.size() - self.seek;
        debug!(
            event = "dashboard.redraw",
            erased = previous,
            lines = out.len()
        );
        self.log.replace_tail(previous, out)?;
        Ok(())
    }
}

impl<S, V, W: Write> std::fmt::Debug for Dashboard<S, V, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("phase", &self.phase)
            .field("rows", &self.rows.len())
            .field("focus", &self.focus)
            .field("anchor", &self.seek)
            .field("log_size", &self.log.size())
            .finish_non_exhaustive()
    }
}
