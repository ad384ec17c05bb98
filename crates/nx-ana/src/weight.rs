//! Per-event weights.

use std::fmt;
use std::sync::Arc;

use nx_core::{Error, FieldError, Result};

use crate::var::Var;

type WeightFn<R> = dyn Fn(&R) -> std::result::Result<f64, FieldError> + Send + Sync;

/// A named weight function over records of type `R`.
///
/// Weights combine multiplicatively (flux × cross-section, ...).
pub struct Weight<R> {
    name: Arc<str>,
    f: Arc<WeightFn<R>>,
}

impl<R> Clone for Weight<R> {
    fn clone(&self) -> Self {
        Self { name: Arc::clone(&self.name), f: Arc::clone(&self.f) }
    }
}

impl<R> fmt::Debug for Weight<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Weight").field(&self.name).finish()
    }
}

impl<R: 'static> Weight<R> {
    /// Weight from a fallible function.
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&R) -> std::result::Result<f64, FieldError> + Send + Sync + 'static,
    {
        Self { name: Arc::from(name.into()), f: Arc::new(f) }
    }

    /// Weight of exactly 1 for every record.
    pub fn unit() -> Self {
        Self::new("unweighted", |_| Ok(1.0))
    }

    /// Weight name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate without attaching the name to failures.
    #[inline]
    pub fn eval(&self, record: &R) -> std::result::Result<f64, FieldError> {
        (self.f)(record)
    }

    /// Evaluate, reporting failures as [`Error::Extraction`] under this weight's name.
    #[inline]
    pub fn weight(&self, record: &R) -> Result<f64> {
        self.eval(record).map_err(|e| Error::extraction(&*self.name, e))
    }

    /// Product of two weights.
    pub fn multiply(&self, other: &Weight<R>) -> Self {
        let (a, b) = (self.clone(), other.clone());
        Self::new(format!("{} * {}", a.name, b.name), move |r| Ok(a.eval(r)? * b.eval(r)?))
    }

    /// Expose the weight as a variable (e.g. to write it as a CSV column).
    pub fn to_var(&self) -> Var<R> {
        let w = self.clone();
        Var::new(move |r| w.eval(r))
    }
}
