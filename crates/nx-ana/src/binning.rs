//! Bin definitions and histogram axes.

use nx_core::{Error, Result};

use crate::var::Var;

/// Binning of one histogram axis.
#[derive(Debug, Clone, PartialEq)]
pub enum Binning {
    /// `n` equal-width bins over `[lo, hi)`. `lo == hi == 0` requests an
    /// automatic range taken from the filled data.
    Simple {
        /// Number of bins.
        n: usize,
        /// Lower edge.
        lo: f64,
        /// Upper edge.
        hi: f64,
    },
    /// Explicit, strictly increasing bin edges.
    Custom(Vec<f64>),
}

impl Binning {
    /// `n` uniform bins over `[lo, hi)`; `(n, 0, 0)` means auto-range.
    pub fn simple(n: usize, lo: f64, hi: f64) -> Self {
        Binning::Simple { n, lo, hi }
    }

    /// Explicit edges.
    pub fn custom(edges: impl Into<Vec<f64>>) -> Self {
        Binning::Custom(edges.into())
    }

    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        match self {
            Binning::Simple { n, .. } => *n,
            Binning::Custom(edges) => edges.len().saturating_sub(1),
        }
    }

    /// `true` if the range is deferred until after the event loop.
    pub fn is_auto(&self) -> bool {
        matches!(self, Binning::Simple { lo, hi, .. } if *lo == 0.0 && *hi == 0.0)
    }

    /// Reject malformed binnings.
    pub fn validate(&self) -> Result<()> {
        match self {
            Binning::Simple { n, lo, hi } => {
                if *n == 0 {
                    return Err(Error::Configuration("binning needs at least one bin".into()));
                }
                if !lo.is_finite() || !hi.is_finite() {
                    return Err(Error::Configuration(format!(
                        "binning range must be finite (lo={lo}, hi={hi})"
                    )));
                }
                if !self.is_auto() && lo >= hi {
                    return Err(Error::Configuration(format!(
                        "binning range is empty (lo={lo}, hi={hi})"
                    )));
                }
            }
            Binning::Custom(edges) => {
                if edges.len() < 2 {
                    return Err(Error::Configuration(format!(
                        "custom binning needs at least 2 edges (got {})",
                        edges.len()
                    )));
                }
                if edges.iter().any(|e| !e.is_finite()) {
                    return Err(Error::Configuration("custom bin edges must be finite".into()));
                }
                if edges.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(Error::Configuration(
                        "custom bin edges must be strictly increasing".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Bin edges, `None` for an auto-range binning.
    pub fn edges(&self) -> Option<Vec<f64>> {
        match self {
            Binning::Custom(edges) => Some(edges.clone()),
            Binning::Simple { n, lo, hi } if !self.is_auto() => Some(uniform_edges(*n, *lo, *hi)),
            Binning::Simple { .. } => None,
        }
    }

    /// Edges for an auto-range binning once the data range `[min, max]` is known.
    ///
    /// A degenerate range is widened to `[v - 0.5, v + 0.5]`; no data gives `[0, 1]`.
    pub fn resolve_auto(&self, range: Option<(f64, f64)>) -> Vec<f64> {
        let n = self.n_bins().max(1);
        let (lo, hi) = match range {
            None => (0.0, 1.0),
            Some((lo, hi)) if lo == hi => (lo - 0.5, hi + 0.5),
            Some(r) => r,
        };
        uniform_edges(n, lo, hi)
    }
}

fn uniform_edges(n: usize, lo: f64, hi: f64) -> Vec<f64> {
    let width = (hi - lo) / n as f64;
    let mut edges: Vec<f64> = (0..n).map(|i| lo + width * i as f64).collect();
    edges.push(hi);
    edges
}

/// Index of the bin containing `val`, `None` for under/overflow.
///
/// Bins are half-open `[e_i, e_{i+1})`; with `inclusive_upper` the last bin
/// also accepts `val == e_n`.
pub(crate) fn find_bin(edges: &[f64], val: f64, inclusive_upper: bool) -> Option<usize> {
    let n_bins = edges.len().checked_sub(1)?;
    let last = edges[n_bins];
    if val < edges[0] || val > last || val.is_nan() {
        return None;
    }
    if val == last {
        return if inclusive_upper { Some(n_bins - 1) } else { None };
    }
    Some(edges.partition_point(|e| *e <= val) - 1)
}

/// Label, binning and variable of one histogram axis.
pub struct HistAxis<R> {
    /// Axis title.
    pub label: String,
    /// Bin definition.
    pub binning: Binning,
    /// Filled quantity.
    pub var: Var<R>,
}

impl<R> Clone for HistAxis<R> {
    fn clone(&self) -> Self {
        Self { label: self.label.clone(), binning: self.binning.clone(), var: self.var.clone() }
    }
}

impl<R> std::fmt::Debug for HistAxis<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistAxis")
            .field("label", &self.label)
            .field("binning", &self.binning)
            .finish()
    }
}

impl<R> HistAxis<R> {
    /// New axis.
    pub fn new(label: impl Into<String>, binning: Binning, var: Var<R>) -> Self {
        Self { label: label.into(), binning, var }
    }
}

/// The two axes of a 2D spectrum.
pub struct HistAxis2D<R> {
    /// Horizontal axis.
    pub x: HistAxis<R>,
    /// Vertical axis.
    pub y: HistAxis<R>,
}

impl<R> Clone for HistAxis2D<R> {
    fn clone(&self) -> Self {
        Self { x: self.x.clone(), y: self.y.clone() }
    }
}

impl<R> std::fmt::Debug for HistAxis2D<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistAxis2D").field("x", &self.x).field("y", &self.y).finish()
    }
}

impl<R> HistAxis2D<R> {
    /// Pair two axes.
    pub fn new(x: HistAxis<R>, y: HistAxis<R>) -> Self {
        Self { x, y }
    }
}
