#![forbid(unsafe_code)]

//! Background enrichment for dashboard rows.
//!
//! # Role in teamboard
//! Rows are cheap to list but expensive to describe. The controller asks
//! for derived values by [`EnrichmentKey`]; the [`EnrichmentCache`] makes
//! sure each key is computed at most once per session, and the
//! [`WorkerPool`] runs the slow lookups off the poll thread with at most one
//! live worker per [`EnrichmentKind`].
//!
//! Workers never touch the terminal. They store results in the cache and
//! announce them as [`Completion`]s on a channel the controller drains
//! between ticks.

pub mod cache;
pub mod key;
pub mod worker;

pub use cache::{CacheEntry, EnrichmentCache};
pub use key::{EnrichmentKey, EnrichmentKind, EntityKey};
pub use worker::{Completion, Lookup, LookupError, WorkerPool};
