//! Sparse non-negative approximation.
//!
//! Responsibilities:
//!
//! - solve NNLS against a template dictionary
//! - prune to the strongest templates and renormalise
//! - score the reconstruction (residual norm, R²)

pub mod score;
pub mod solver;

pub use score::*;
pub use solver::*;
