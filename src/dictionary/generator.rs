//! Template dictionary generation.
//!
//! The dictionary is the full cross-product
//!
//! ```text
//! {rectangle, curve, bid_ask} × centers × widths
//! ```
//!
//! enumerated in exactly that nesting order (family outermost, width innermost).
//! Each raw shape is divided by `sum + NORMALIZE_EPS`, so non-degenerate
//! templates carry unit mass and all-zero shapes stay all-zero.

use nalgebra::DMatrix;
use tracing::debug;

use crate::dictionary::grid::{stepped_range, width_range};
use crate::domain::{ShapeKind, TemplateParams};
use crate::error::AppError;

/// Guard added to a template's mass before normalising.
pub const NORMALIZE_EPS: f64 = 1e-12;

/// Default inclusive width range.
pub const DEFAULT_WIDTH_RANGE: (usize, usize) = (7, 69);
pub const DEFAULT_CENTER_STEP: usize = 3;
pub const DEFAULT_WIDTH_STEP: usize = 2;

/// Enumeration settings for [`generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Number of bins `B` on the axis.
    pub bins: usize,
    /// Inclusive center range; `None` means `(0, bins - 1)`.
    pub center_range: Option<(i64, i64)>,
    /// Inclusive width range.
    pub width_range: (usize, usize),
    pub center_step: usize,
    pub width_step: usize,
}

impl GeneratorConfig {
    pub fn new(bins: usize) -> Self {
        Self {
            bins,
            center_range: None,
            width_range: DEFAULT_WIDTH_RANGE,
            center_step: DEFAULT_CENTER_STEP,
            width_step: DEFAULT_WIDTH_STEP,
        }
    }

    pub fn with_center_range(mut self, lo: i64, hi: i64) -> Self {
        self.center_range = Some((lo, hi));
        self
    }

    pub fn with_width_range(mut self, lo: usize, hi: usize) -> Self {
        self.width_range = (lo, hi);
        self
    }

    pub fn with_steps(mut self, center_step: usize, width_step: usize) -> Self {
        self.center_step = center_step;
        self.width_step = width_step;
        self
    }

    /// Effective center range after applying the default.
    pub fn resolved_center_range(&self) -> (i64, i64) {
        self.center_range.unwrap_or((0, self.bins as i64 - 1))
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.bins == 0 {
            return Err(AppError::new(2, "Bin count must be > 0."));
        }
        if self.center_step == 0 {
            return Err(AppError::new(2, "Center step must be >= 1."));
        }
        if self.width_step == 0 {
            return Err(AppError::new(2, "Width step must be >= 1."));
        }
        Ok(())
    }

    pub fn centers(&self) -> Result<Vec<i64>, AppError> {
        let (lo, hi) = self.resolved_center_range();
        stepped_range(lo, hi, self.center_step)
    }

    pub fn widths(&self) -> Result<Vec<usize>, AppError> {
        width_range(self.width_range.0, self.width_range.1, self.width_step)
    }

    /// Number of templates [`generate`] will produce.
    pub fn template_count(&self) -> Result<usize, AppError> {
        self.validate()?;
        Ok(ShapeKind::ALL.len() * self.centers()?.len() * self.widths()?.len())
    }
}

/// Immutable template matrix (rows = templates, columns = bins) plus the
/// index-aligned parameter list.
#[derive(Debug, Clone)]
pub struct Dictionary {
    templates: DMatrix<f64>,
    params: Vec<TemplateParams>,
}

impl Dictionary {
    /// Wrap an externally built template matrix.
    ///
    /// `params` must have exactly one entry per matrix row.
    pub fn from_parts(
        templates: DMatrix<f64>,
        params: Vec<TemplateParams>,
    ) -> Result<Self, AppError> {
        if templates.nrows() != params.len() {
            return Err(AppError::new(
                2,
                format!(
                    "Template/parameter count mismatch: {} rows vs {} params.",
                    templates.nrows(),
                    params.len()
                ),
            ));
        }
        Ok(Self { templates, params })
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Bin count `B` (matrix column count).
    pub fn bins(&self) -> usize {
        self.templates.ncols()
    }

    pub fn templates(&self) -> &DMatrix<f64> {
        &self.templates
    }

    pub fn params(&self) -> &[TemplateParams] {
        &self.params
    }

    /// Normalised profile of template `index`.
    pub fn template(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.len() {
            return None;
        }
        Some(self.templates.row(index).iter().copied().collect())
    }

    /// Row index of the template with the given parameters, if enumerated.
    pub fn find(&self, kind: ShapeKind, center: i64, width: usize) -> Option<usize> {
        self.params
            .iter()
            .position(|p| p.kind == kind && p.center == center && p.width == width)
    }
}

/// Build the normalised template dictionary.
pub fn generate(config: &GeneratorConfig) -> Result<Dictionary, AppError> {
    config.validate()?;
    let centers = config.centers()?;
    let widths = config.widths()?;
    let bins = config.bins;

    let n = ShapeKind::ALL.len() * centers.len() * widths.len();
    let mut data = Vec::with_capacity(n * bins);
    let mut params = Vec::with_capacity(n);

    for kind in ShapeKind::ALL {
        for &center in &centers {
            for &width in &widths {
                data.extend(normalize(kind.evaluate(center, width, bins)));
                params.push(TemplateParams {
                    kind,
                    center,
                    width,
                });
            }
        }
    }

    debug!(
        templates = n,
        bins,
        centers = centers.len(),
        widths = widths.len(),
        "generated template dictionary"
    );

    Dictionary::from_parts(DMatrix::from_row_slice(n, bins, &data), params)
}

/// Scale a raw shape to unit mass (`v / (Σv + NORMALIZE_EPS)`).
pub fn normalize(mut raw: Vec<f64>) -> Vec<f64> {
    let denom = raw.iter().sum::<f64>() + NORMALIZE_EPS;
    for v in &mut raw {
        *v /= denom;
    }
    raw
}
