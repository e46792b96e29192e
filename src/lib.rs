//! Route optimization engine for daily facility pickup/dropoff runs.
//!
//! Assigns capacity-limited vehicles, drivers, and optional aides to a
//! day's riders and produces a timed multi-stop route per vehicle for the
//! morning (facility -> riders) and evening (riders -> facility) legs.
//! Travel times come from a persistent cache, a live lookup service, or a
//! synthetic fallback; no failure in that chain aborts a run.

pub mod allocator;
pub mod cache;
pub mod distance;
pub mod model;
pub mod optimizer;
pub mod propagator;
pub mod sequencer;
