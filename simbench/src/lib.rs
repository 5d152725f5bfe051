//! Deterministic link simulation and benchmarking for glide transform sync.
//!
//! This crate provides:
//!
//! - Owner motion generators (linear, circling, stop-and-go)
//! - A simulated link with loss, latency, jitter and reordering
//! - Scenario runs that measure bandwidth and playback error
//! - A bincode baseline for the same sends
//!
//! # Design Principles
//!
//! - **Reproducible** - All scenarios are deterministic given a seed.
//! - **Realistic** - Link presets model common network conditions.
//! - **Measurable** - Output format suitable for CI regression tracking.

mod link;
mod report;
mod rng;
mod scenario;

pub use link::{LinkConditions, SimLink};
pub use report::{ScenarioReport, SerdeTransform};
pub use rng::Rng;
pub use scenario::{preset, run_scenario, Motion, Scenario, PRESETS};
