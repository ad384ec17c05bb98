//! Single-pass filling of many spectra from one source.
//!
//! Register spectra up front, then [`SpectrumLoader::go`] streams the source
//! once and fills every registered spectrum:
//!
//! ```ignore
//! let mut loader = SpectrumLoader::new(source);
//! loader.set_spill_cut(good_spill);
//! let energy = loader.add_spectrum("E", &axis, &numu_cc)?;
//! let spectra = loader.go()?;
//! let hist = spectra.get(energy).unwrap().to_hist(1e20)?;
//! ```

use nx_core::{Error, FieldError, Result, RunSummary, SpillSource};

use crate::binning::{HistAxis, HistAxis2D};
use crate::cut::Cut;
use crate::event_loop::{self, EventOutcome, FailurePolicy};
use crate::spectrum::{Fill1D, Fill2D, Spectrum, Spectrum2D};
use crate::weight::Weight;

/// Handle to a 1D spectrum registered on a [`SpectrumLoader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpectrumId(usize);

/// Handle to a 2D spectrum registered on a [`SpectrumLoader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Spectrum2DId(usize);

struct Request1D<R> {
    name: String,
    axis: HistAxis<R>,
    cut: Cut<R>,
    weight: Weight<R>,
}

struct Request2D<R> {
    name: String,
    axes: HistAxis2D<R>,
    cut: Cut<R>,
    weight: Weight<R>,
}

/// Filled spectra returned by [`SpectrumLoader::go`].
#[derive(Debug, Clone)]
pub struct Spectra {
    /// Totals of the pass that filled these spectra.
    pub summary: RunSummary,
    one_d: Vec<Spectrum>,
    two_d: Vec<Spectrum2D>,
}

impl Spectra {
    /// 1D spectrum for `id`.
    pub fn get(&self, id: SpectrumId) -> Option<&Spectrum> {
        self.one_d.get(id.0)
    }

    /// 2D spectrum for `id`.
    pub fn get_2d(&self, id: Spectrum2DId) -> Option<&Spectrum2D> {
        self.two_d.get(id.0)
    }

    /// 1D spectrum by registration name.
    pub fn by_name(&self, name: &str) -> Option<&Spectrum> {
        self.one_d.iter().find(|s| s.name == name)
    }

    /// 1D spectra in registration order.
    pub fn spectra(&self) -> &[Spectrum] {
        &self.one_d
    }

    /// 2D spectra in registration order.
    pub fn spectra_2d(&self) -> &[Spectrum2D] {
        &self.two_d
    }
}

/// Owns a source and the spectra to fill from it.
pub struct SpectrumLoader<Src: SpillSource> {
    source: Src,
    spill_cut: Cut<Src::Info>,
    policy: FailurePolicy,
    one_d: Vec<Request1D<Src::Record>>,
    two_d: Vec<Request2D<Src::Record>>,
}

impl<Src> SpectrumLoader<Src>
where
    Src: SpillSource,
    Src::Info: 'static,
    Src::Record: 'static,
{
    /// Loader over `source` with no spectra, accepting every spill.
    pub fn new(source: Src) -> Self {
        Self {
            source,
            spill_cut: Cut::pass_all(),
            policy: FailurePolicy::default(),
            one_d: Vec::new(),
            two_d: Vec::new(),
        }
    }

    /// Spills failing `cut` contribute neither events nor exposure.
    pub fn set_spill_cut(&mut self, cut: Cut<Src::Info>) -> &mut Self {
        self.spill_cut = cut;
        self
    }

    /// Behaviour on per-event evaluation errors.
    pub fn set_failure_policy(&mut self, policy: FailurePolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    fn check_name(&self, name: &str) -> Result<()> {
        let taken = self.one_d.iter().map(|r| r.name.as_str());
        if taken.chain(self.two_d.iter().map(|r| r.name.as_str())).any(|n| n == name) {
            return Err(Error::Configuration(format!("spectrum '{name}' registered twice")));
        }
        Ok(())
    }

    /// Register an unweighted 1D spectrum.
    pub fn add_spectrum(
        &mut self,
        name: &str,
        axis: &HistAxis<Src::Record>,
        cut: &Cut<Src::Record>,
    ) -> Result<SpectrumId> {
        self.add_weighted_spectrum(name, axis, cut, &Weight::unit())
    }

    /// Register a weighted 1D spectrum.
    pub fn add_weighted_spectrum(
        &mut self,
        name: &str,
        axis: &HistAxis<Src::Record>,
        cut: &Cut<Src::Record>,
        weight: &Weight<Src::Record>,
    ) -> Result<SpectrumId> {
        self.check_name(name)?;
        axis.binning.validate()?;
        self.one_d.push(Request1D {
            name: name.to_string(),
            axis: axis.clone(),
            cut: cut.clone(),
            weight: weight.clone(),
        });
        Ok(SpectrumId(self.one_d.len() - 1))
    }

    /// Register a 2D spectrum; pass [`Weight::unit`] for unweighted filling.
    pub fn add_spectrum_2d(
        &mut self,
        name: &str,
        axes: &HistAxis2D<Src::Record>,
        cut: &Cut<Src::Record>,
        weight: &Weight<Src::Record>,
    ) -> Result<Spectrum2DId> {
        self.check_name(name)?;
        axes.x.binning.validate()?;
        axes.y.binning.validate()?;
        self.two_d.push(Request2D {
            name: name.to_string(),
            axes: axes.clone(),
            cut: cut.clone(),
            weight: weight.clone(),
        });
        Ok(Spectrum2DId(self.two_d.len() - 1))
    }

    /// Number of registered spectra (1D and 2D).
    pub fn len(&self) -> usize {
        self.one_d.len() + self.two_d.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stream the source once and fill every registered spectrum.
    ///
    /// Each spectrum skips the events its own cut, variable or weight fails
    /// on; such events are counted once in `summary.events_failed`.
    pub fn go(self) -> Result<Spectra> {
        let Self { mut source, spill_cut, policy, one_d, two_d } = self;
        log::info!(
            "filling {} spectra from {}",
            one_d.len() + two_d.len(),
            source.describe()
        );

        let mut fills_1d: Vec<Fill1D> =
            one_d.iter().map(|r| Fill1D::new(&r.name, &r.axis)).collect();
        let mut fills_2d: Vec<Fill2D> =
            two_d.iter().map(|r| Fill2D::new(&r.name, &r.axes.x, &r.axes.y)).collect();

        let summary = event_loop::run(&mut source, &spill_cut, policy, |record| {
            let mut filled = false;
            let mut first_err = None;
            for (req, fill) in one_d.iter().zip(fills_1d.iter_mut()) {
                match fill_1d(req, fill, record) {
                    Ok(hit) => filled |= hit,
                    Err(e) if policy == FailurePolicy::Abort => return Err(e),
                    Err(e) => {
                        first_err.get_or_insert(e);
                    }
                }
            }
            for (req, fill) in two_d.iter().zip(fills_2d.iter_mut()) {
                match fill_2d(req, fill, record) {
                    Ok(hit) => filled |= hit,
                    Err(e) if policy == FailurePolicy::Abort => return Err(e),
                    Err(e) => {
                        first_err.get_or_insert(e);
                    }
                }
            }
            match first_err {
                Some(e) => Err(e),
                None if filled => Ok(EventOutcome::Passed),
                None => Ok(EventOutcome::Rejected),
            }
        })?;

        let pot = summary.pot;
        if pot <= 0.0 {
            log::warn!(
                "{}: no exposure accumulated, spectra cannot be normalized",
                source.describe()
            );
        }
        Ok(Spectra {
            summary,
            one_d: fills_1d.into_iter().map(|f| f.finish(pot)).collect(),
            two_d: fills_2d.into_iter().map(|f| f.finish(pot)).collect(),
        })
    }
}

fn checked_value(name: &str, v: f64) -> Result<f64> {
    if v.is_nan() {
        return Err(Error::extraction(name, FieldError::Invalid("NaN value".into())));
    }
    Ok(v)
}

fn checked_weight<R: 'static>(name: &str, weight: &Weight<R>, record: &R) -> Result<f64> {
    let w = weight.weight(record)?;
    if !w.is_finite() {
        return Err(Error::extraction(
            name,
            FieldError::Invalid(format!("non-finite weight {w} from '{}'", weight.name())),
        ));
    }
    Ok(w)
}

fn fill_1d<R: 'static>(req: &Request1D<R>, fill: &mut Fill1D, record: &R) -> Result<bool> {
    if !req.cut.pass(record)? {
        return Ok(false);
    }
    let v = req.axis.var.eval(record).map_err(|e| Error::extraction(req.name.as_str(), e))?;
    let v = checked_value(&req.name, v)?;
    let w = checked_weight(&req.name, &req.weight, record)?;
    fill.fill(v, w);
    Ok(true)
}

fn fill_2d<R: 'static>(req: &Request2D<R>, fill: &mut Fill2D, record: &R) -> Result<bool> {
    if !req.cut.pass(record)? {
        return Ok(false);
    }
    let eval = |axis: &HistAxis<R>| {
        axis.var
            .eval(record)
            .map_err(|e| Error::extraction(req.name.as_str(), e))
            .and_then(|v| checked_value(&req.name, v))
    };
    let x = eval(&req.axes.x)?;
    let y = eval(&req.axes.y)?;
    let w = checked_weight(&req.name, &req.weight, record)?;
    fill.fill(x, y, w);
    Ok(true)
}
