#![forbid(unsafe_code)]

//! Dashboard runtime: the poll loop, row views and key dispatch.
//!
//! # Role in teamboard
//! [`Dashboard`] ties an [`EntitySource`] and a [`RowView`] to the render
//! log and the enrichment pool. It is driven either step by step with
//! [`Dashboard::tick`] or by [`Dashboard::run`], which sleeps on a
//! [`WakeSignal`] between ticks so that [`DashboardHandle`] calls from a key
//! reader or a signal handler take effect immediately.

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod source;
pub mod view;
pub mod wake;

pub use config::DashboardConfig;
pub use controller::{Dashboard, DashboardHandle, Phase, RenderedSnapshot, TickReport};
pub use dispatch::{Action, Dispatch, Dispatcher, KeyCode, KeyEvent, Keymap, Modifiers, button_bar};
pub use error::{DashboardError, Result};
pub use logging::{LogTarget, init_logging};
pub use source::{Entity, EntityPoll, EntitySource, SessionInfo};
pub use view::{DETAIL, HISTORY, LineRole, RosterView, RowState, RowView};
pub use wake::WakeSignal;
