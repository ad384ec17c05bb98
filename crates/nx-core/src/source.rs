//! Event-source abstraction.
//!
//! A run streams *spills* (beam pulses). Each spill carries a header with its
//! exposure and a batch of event records. Analysis code never mutates either.

use serde::{Deserialize, Serialize};

use crate::Result;

/// Exposure carried by a spill header, in protons-on-target.
pub trait Exposure {
    /// POT delivered during this spill.
    fn pot(&self) -> f64;
}

impl Exposure for f64 {
    fn pot(&self) -> f64 {
        *self
    }
}

/// One spill: header plus the event records reconstructed in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spill<S, R> {
    /// Spill-level header (gating flags, exposure).
    pub info: S,
    /// Event records in this spill.
    #[serde(default)]
    pub records: Vec<R>,
}

impl<S, R> Spill<S, R> {
    /// Create a spill.
    pub fn new(info: S, records: Vec<R>) -> Self {
        Self { info, records }
    }
}

/// Streams spills from some backing store.
///
/// Implementations own their file handles; dropping the source releases them,
/// including on early exit from a run.
pub trait SpillSource {
    /// Spill header type.
    type Info: Exposure;
    /// Event record type.
    type Record;

    /// Human-readable identifier of the data source, used in error messages.
    fn describe(&self) -> String;

    /// Next spill, `Ok(None)` once the source is exhausted.
    ///
    /// Errors here are fatal to the run (`Error::Resource`).
    fn next_spill(&mut self) -> Result<Option<Spill<Self::Info, Self::Record>>>;
}

impl<T: SpillSource + ?Sized> SpillSource for Box<T> {
    type Info = T::Info;
    type Record = T::Record;

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn next_spill(&mut self) -> Result<Option<Spill<Self::Info, Self::Record>>> {
        (**self).next_spill()
    }
}

/// In-memory spill source, mostly for tests and synthetic datasets.
#[derive(Debug, Clone)]
pub struct MemorySource<S, R> {
    name: String,
    spills: std::collections::VecDeque<Spill<S, R>>,
}

impl<S, R> MemorySource<S, R> {
    /// Create a source yielding `spills` in order.
    pub fn new(name: impl Into<String>, spills: Vec<Spill<S, R>>) -> Self {
        Self { name: name.into(), spills: spills.into() }
    }
}

impl<R> MemorySource<f64, R> {
    /// Single spill of `pot` POT holding all `records`.
    pub fn single_spill(name: impl Into<String>, pot: f64, records: Vec<R>) -> Self {
        Self::new(name, vec![Spill::new(pot, records)])
    }
}

impl<S: Exposure, R> SpillSource for MemorySource<S, R> {
    type Info = S;
    type Record = R;

    fn describe(&self) -> String {
        self.name.clone()
    }

    fn next_spill(&mut self) -> Result<Option<Spill<S, R>>> {
        Ok(self.spills.pop_front())
    }
}
