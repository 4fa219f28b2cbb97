//! `dlmm-shapes` library crate.
//!
//! Decomposes a discretised liquidity distribution into a small, non-negative
//! combination of shape templates (rectangle, curve, bid-ask).
//!
//! The binary (`shapes`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the generator and approximator are reusable from other tools
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod approx;
pub mod cli;
pub mod dictionary;
pub mod domain;
pub mod error;
pub mod math;
pub mod plot;
pub mod report;
pub mod targets;
