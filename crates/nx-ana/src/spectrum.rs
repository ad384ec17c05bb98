//! Filled (un-normalized) spectra and their accumulation.

use nx_core::{Error, Result};

use crate::binning::{Binning, HistAxis, find_bin};
use crate::histogram::{Histogram, Histogram2D};

/// Scale factor taking `observed` exposure to `target`.
fn pot_scale(name: &str, observed: f64, target: f64) -> Result<f64> {
    if !target.is_finite() || target < 0.0 {
        return Err(Error::Normalization(format!(
            "spectrum '{name}': invalid target exposure {target}"
        )));
    }
    if !observed.is_finite() || observed <= 0.0 {
        return Err(Error::Normalization(format!(
            "spectrum '{name}': observed exposure is {observed}, cannot scale to {target}"
        )));
    }
    Ok(target / observed)
}

/// A 1D spectrum: weighted bin contents plus the exposure they were filled with.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Spectrum name.
    pub name: String,
    /// Axis label.
    pub label: String,
    /// Bin edges.
    pub bin_edges: Vec<f64>,
    /// Sum of weights per bin.
    pub bin_content: Vec<f64>,
    /// Sum of weights squared per bin.
    pub sumw2: Vec<f64>,
    /// Weight below the first edge.
    pub underflow: f64,
    /// Weight at or above the last edge.
    pub overflow: f64,
    /// In-range fills.
    pub entries: u64,
    /// Observed exposure (POT of the spills that passed the spill cut).
    pub pot: f64,
    inclusive_upper: bool,
}

impl Spectrum {
    pub(crate) fn empty(
        name: &str,
        label: &str,
        bin_edges: Vec<f64>,
        inclusive_upper: bool,
    ) -> Self {
        let n_bins = bin_edges.len() - 1;
        Self {
            name: name.to_string(),
            label: label.to_string(),
            bin_edges,
            bin_content: vec![0.0; n_bins],
            sumw2: vec![0.0; n_bins],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
            pot: 0.0,
            inclusive_upper,
        }
    }

    pub(crate) fn fill(&mut self, val: f64, weight: f64) {
        let w2 = weight * weight;
        match find_bin(&self.bin_edges, val, self.inclusive_upper) {
            Some(b) => {
                self.bin_content[b] += weight;
                self.sumw2[b] += w2;
                self.entries += 1;
            }
            None if val < self.bin_edges[0] => self.underflow += weight,
            None => self.overflow += weight,
        }
    }

    /// Observed exposure.
    pub fn pot(&self) -> f64 {
        self.pot
    }

    /// Sum of in-range bin contents.
    pub fn integral(&self) -> f64 {
        self.bin_content.iter().sum()
    }

    /// Histogram scaled from the observed exposure to `target_pot`.
    ///
    /// Fails with [`Error::Normalization`] when the observed exposure is zero;
    /// the spectrum itself is untouched.
    pub fn to_hist(&self, target_pot: f64) -> Result<Histogram> {
        let s = pot_scale(&self.name, self.pot, target_pot)?;
        Ok(Histogram {
            name: self.name.clone(),
            title: self.label.clone(),
            bin_edges: self.bin_edges.clone(),
            bin_content: self.bin_content.iter().map(|c| c * s).collect(),
            sumw2: self.sumw2.iter().map(|w2| w2 * s * s).collect(),
            underflow: self.underflow * s,
            overflow: self.overflow * s,
            entries: self.entries,
            pot: target_pot,
        })
    }

    /// Histogram with the raw, un-normalized contents.
    pub fn to_hist_raw(&self) -> Histogram {
        Histogram {
            name: self.name.clone(),
            title: self.label.clone(),
            bin_edges: self.bin_edges.clone(),
            bin_content: self.bin_content.clone(),
            sumw2: self.sumw2.clone(),
            underflow: self.underflow,
            overflow: self.overflow,
            entries: self.entries,
            pot: self.pot,
        }
    }
}

/// A 2D spectrum. Contents are x-major: `index = ix * ny + iy`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum2D {
    /// Spectrum name.
    pub name: String,
    /// X axis label.
    pub x_label: String,
    /// Y axis label.
    pub y_label: String,
    /// X bin edges.
    pub x_edges: Vec<f64>,
    /// Y bin edges.
    pub y_edges: Vec<f64>,
    /// Sum of weights per bin.
    pub bin_content: Vec<f64>,
    /// Sum of weights squared per bin.
    pub sumw2: Vec<f64>,
    /// Weight outside the range on either axis.
    pub out_of_range: f64,
    /// In-range fills.
    pub entries: u64,
    /// Observed exposure.
    pub pot: f64,
    inclusive_upper: (bool, bool),
}

impl Spectrum2D {
    pub(crate) fn empty(
        name: &str,
        labels: (&str, &str),
        x_edges: Vec<f64>,
        y_edges: Vec<f64>,
        inclusive_upper: (bool, bool),
    ) -> Self {
        let n = (x_edges.len() - 1) * (y_edges.len() - 1);
        Self {
            name: name.to_string(),
            x_label: labels.0.to_string(),
            y_label: labels.1.to_string(),
            x_edges,
            y_edges,
            bin_content: vec![0.0; n],
            sumw2: vec![0.0; n],
            out_of_range: 0.0,
            entries: 0,
            pot: 0.0,
            inclusive_upper,
        }
    }

    pub(crate) fn fill(&mut self, x: f64, y: f64, weight: f64) {
        let bx = find_bin(&self.x_edges, x, self.inclusive_upper.0);
        let by = find_bin(&self.y_edges, y, self.inclusive_upper.1);
        match (bx, by) {
            (Some(ix), Some(iy)) => {
                let i = ix * (self.y_edges.len() - 1) + iy;
                self.bin_content[i] += weight;
                self.sumw2[i] += weight * weight;
                self.entries += 1;
            }
            _ => self.out_of_range += weight,
        }
    }

    /// Observed exposure.
    pub fn pot(&self) -> f64 {
        self.pot
    }

    /// Histogram scaled from the observed exposure to `target_pot`.
    pub fn to_hist(&self, target_pot: f64) -> Result<Histogram2D> {
        let s = pot_scale(&self.name, self.pot, target_pot)?;
        Ok(Histogram2D {
            name: self.name.clone(),
            x_title: self.x_label.clone(),
            y_title: self.y_label.clone(),
            x_edges: self.x_edges.clone(),
            y_edges: self.y_edges.clone(),
            bin_content: self.bin_content.iter().map(|c| c * s).collect(),
            sumw2: self.sumw2.iter().map(|w2| w2 * s * s).collect(),
            out_of_range: self.out_of_range * s,
            entries: self.entries,
            pot: target_pot,
        })
    }
}

fn data_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Accumulator for one 1D spectrum. Auto-range binnings buffer their fills
/// until the edges are known.
pub(crate) enum Fill1D {
    Direct(Spectrum),
    Buffered { name: String, label: String, binning: Binning, fills: Vec<(f64, f64)> },
}

impl Fill1D {
    pub(crate) fn new<R>(name: &str, axis: &HistAxis<R>) -> Self {
        match axis.binning.edges() {
            Some(edges) => Fill1D::Direct(Spectrum::empty(name, &axis.label, edges, false)),
            None => Fill1D::Buffered {
                name: name.to_string(),
                label: axis.label.clone(),
                binning: axis.binning.clone(),
                fills: Vec::new(),
            },
        }
    }

    pub(crate) fn fill(&mut self, val: f64, weight: f64) {
        match self {
            Fill1D::Direct(s) => s.fill(val, weight),
            Fill1D::Buffered { fills, .. } => fills.push((val, weight)),
        }
    }

    pub(crate) fn finish(self, pot: f64) -> Spectrum {
        let mut spectrum = match self {
            Fill1D::Direct(s) => s,
            Fill1D::Buffered { name, label, binning, fills } => {
                let edges = binning.resolve_auto(data_range(fills.iter().map(|(v, _)| *v)));
                let mut s = Spectrum::empty(&name, &label, edges, true);
                for (v, w) in fills {
                    s.fill(v, w);
                }
                s
            }
        };
        spectrum.pot = pot;
        spectrum
    }
}

/// Accumulator for one 2D spectrum.
pub(crate) enum Fill2D {
    Direct(Spectrum2D),
    Buffered {
        name: String,
        labels: (String, String),
        binnings: (Binning, Binning),
        fills: Vec<(f64, f64, f64)>,
    },
}

impl Fill2D {
    pub(crate) fn new<R>(name: &str, x: &HistAxis<R>, y: &HistAxis<R>) -> Self {
        match (x.binning.edges(), y.binning.edges()) {
            (Some(xe), Some(ye)) => Fill2D::Direct(Spectrum2D::empty(
                name,
                (&x.label, &y.label),
                xe,
                ye,
                (false, false),
            )),
            _ => Fill2D::Buffered {
                name: name.to_string(),
                labels: (x.label.clone(), y.label.clone()),
                binnings: (x.binning.clone(), y.binning.clone()),
                fills: Vec::new(),
            },
        }
    }

    pub(crate) fn fill(&mut self, x: f64, y: f64, weight: f64) {
        match self {
            Fill2D::Direct(s) => s.fill(x, y, weight),
            Fill2D::Buffered { fills, .. } => fills.push((x, y, weight)),
        }
    }

    pub(crate) fn finish(self, pot: f64) -> Spectrum2D {
        let mut spectrum = match self {
            Fill2D::Direct(s) => s,
            Fill2D::Buffered { name, labels, binnings, fills } => {
                let resolve = |b: &Binning, range: Option<(f64, f64)>| match b.edges() {
                    Some(e) => (e, false),
                    None => (b.resolve_auto(range), true),
                };
                let (xe, xi) = resolve(&binnings.0, data_range(fills.iter().map(|f| f.0)));
                let (ye, yi) = resolve(&binnings.1, data_range(fills.iter().map(|f| f.1)));
                let mut s = Spectrum2D::empty(&name, (&labels.0, &labels.1), xe, ye, (xi, yi));
                for (x, y, w) in fills {
                    s.fill(x, y, w);
                }
                s
            }
        };
        spectrum.pot = pot;
        spectrum
    }
}
