//! Mathematical utilities: shape profiles, least squares, and NNLS.

pub mod nnls;
pub mod ols;
pub mod shapes;

pub use nnls::*;
pub use ols::*;
pub use shapes::*;
