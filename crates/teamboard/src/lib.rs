#![forbid(unsafe_code)]

//! teamboard: a live roster table for the terminal.
//!
//! The binary replays a scripted session from a demo file through the
//! [`runtime::Dashboard`]. The building blocks are re-exported so the demo
//! wiring can be reused with another [`runtime::EntitySource`].

pub mod app;
pub mod cli;
pub mod demo;
pub mod error;
pub mod keys;
#[cfg(unix)]
pub mod signals;

pub use teamboard_enrich as enrich;
pub use teamboard_render as render;
pub use teamboard_runtime as runtime;

pub use error::AppError;
