//! HTTP gateway for the treasure hunt.
//!
//! Serves the analyze endpoint that drives the pipeline, image listing and
//! display for the picker page, the hunter profile, health, and (with the
//! `metrics` feature) Prometheus metrics. The embedded UI is merged in at `/`.

#[cfg(feature = "metrics")]
pub mod metrics;
pub mod server;
pub mod state;

pub use server::{build_router, start_gateway};
pub use state::GatewayState;
