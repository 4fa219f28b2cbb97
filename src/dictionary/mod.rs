//! Template dictionary construction.
//!
//! Responsibilities:
//!
//! - enumerate center/width grids
//! - materialise normalised templates with index-aligned parameters

pub mod generator;
pub mod grid;

pub use generator::*;
pub use grid::*;
