//! # nx-ana
//!
//! Declarative event selection and export for NuExport.
//!
//! Variables ([`Var`], [`MultiVar`]), selections ([`Cut`]) and weights
//! ([`Weight`]) are composable function objects over a record type. They are
//! handed to one of two drivers that stream a [`SpillSource`](nx_core::SpillSource):
//!
//! - [`CsvMaker`] writes one CSV row per selected event;
//! - [`SpectrumLoader`] fills binned [`Spectrum`]s, which are normalized to a
//!   target exposure and saved through a [`HistogramFile`].
//!
//! ## Example
//!
//! ```no_run
//! use nx_ana::{Binning, CsvMaker, Cut, HistAxis, SpectrumLoader, Var};
//! use nx_core::MemorySource;
//!
//! let energy = Var::simple(|e: &f64| *e);
//! let positive = energy.greater_than(0.0);
//!
//! let source = MemorySource::single_spill("demo", 1e20, vec![-1.0, 5.0]);
//! let mut maker = CsvMaker::new(source, "out.csv");
//! maker.add_var("E", energy.clone()).unwrap();
//! maker.set_cut(positive.clone());
//! let summary = maker.go().unwrap();
//! assert_eq!(summary.events_passed, 1);
//!
//! let mut loader = SpectrumLoader::new(MemorySource::single_spill("demo", 1e20, vec![5.0]));
//! let axis = HistAxis::new("E (GeV)", Binning::simple(10, 0.0, 10.0), energy);
//! let id = loader.add_spectrum("E", &axis, &positive).unwrap();
//! let hist = loader.go().unwrap().get(id).unwrap().to_hist(1e20).unwrap();
//! # let _ = (hist, Cut::<f64>::pass_all());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod binning;
pub mod csv_maker;
pub mod cut;
mod event_loop;
pub mod histogram;
pub mod loader;
pub mod multi;
pub mod registry;
pub mod spectrum;
pub mod var;
pub mod weight;

pub use binning::{Binning, HistAxis, HistAxis2D};
pub use csv_maker::{CsvMaker, DEFAULT_PRECISION, DEFAULT_WEIGHT_COLUMN};
pub use cut::Cut;
pub use event_loop::FailurePolicy;
pub use histogram::{Histogram, Histogram2D, HistogramFile, StoredHistogram};
pub use loader::{Spectra, Spectrum2DId, SpectrumId, SpectrumLoader};
pub use multi::{Expansion, MultiVar, MultiVarRegistry};
pub use registry::VarRegistry;
pub use spectrum::{Spectrum, Spectrum2D};
pub use var::Var;
pub use weight::Weight;
