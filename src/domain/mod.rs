//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the shape families (`ShapeKind`) and per-template parameters (`TemplateParams`)
//! - reported strategies (`Strategy`)
//! - target and run configuration (`TargetSpec`, `RunConfig`)

pub mod types;

pub use types::*;
