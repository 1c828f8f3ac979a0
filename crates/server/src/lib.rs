//! HTTP control surface for the restreamer engine.

pub mod api;
pub mod metrics;
pub mod state;
