//! Multi-valued variables: one value per sub-object (prong, track, ...).
//!
//! A tabular row has a fixed width, so each multi-variable is expanded into
//! `cap` columns `name[0] .. name[cap-1]` according to an [`Expansion`] policy.

use std::fmt;
use std::sync::Arc;

use nx_core::{Error, FieldError, Result};

use crate::registry::check_unique;

type MultiFn<R> = dyn Fn(&R) -> std::result::Result<Vec<f64>, FieldError> + Send + Sync;

/// Extractor returning an ordered sequence of values per record.
pub struct MultiVar<R> {
    f: Arc<MultiFn<R>>,
}

impl<R> Clone for MultiVar<R> {
    fn clone(&self) -> Self {
        Self { f: Arc::clone(&self.f) }
    }
}

impl<R> fmt::Debug for MultiVar<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MultiVar")
    }
}

impl<R: 'static> MultiVar<R> {
    /// Multi-variable from a fallible function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&R) -> std::result::Result<Vec<f64>, FieldError> + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    /// Evaluate on one record.
    #[inline]
    pub fn eval(&self, record: &R) -> std::result::Result<Vec<f64>, FieldError> {
        (self.f)(record)
    }
}

/// How a variable-length value list maps onto a fixed number of columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expansion {
    /// Keep the first `cap` values; missing indices are NaN.
    Truncate {
        /// Column count per multi-variable.
        cap: usize,
    },
    /// Fill missing indices with `fill`; values beyond `cap` are dropped.
    Pad {
        /// Column count per multi-variable.
        cap: usize,
        /// Sentinel for missing indices.
        fill: f64,
    },
    /// Fail the event when more than `cap` values are present; missing
    /// indices are NaN.
    Reject {
        /// Column count per multi-variable.
        cap: usize,
    },
}

impl Default for Expansion {
    fn default() -> Self {
        Expansion::Pad { cap: 20, fill: f64::NAN }
    }
}

impl Expansion {
    /// Number of columns each multi-variable expands to.
    pub fn cap(&self) -> usize {
        match *self {
            Expansion::Truncate { cap }
            | Expansion::Pad { cap, .. }
            | Expansion::Reject { cap } => cap,
        }
    }

    fn fill(&self) -> f64 {
        match *self {
            Expansion::Pad { fill, .. } => fill,
            _ => f64::NAN,
        }
    }

    /// Append exactly `cap()` values derived from `values` to `out`.
    pub fn expand(
        &self,
        values: &[f64],
        out: &mut Vec<f64>,
    ) -> std::result::Result<(), FieldError> {
        let cap = self.cap();
        if let Expansion::Reject { .. } = self
            && values.len() > cap
        {
            return Err(FieldError::Invalid(format!(
                "{} values exceed the {cap}-column limit",
                values.len()
            )));
        }
        let kept = values.len().min(cap);
        out.extend_from_slice(&values[..kept]);
        out.extend(std::iter::repeat_n(self.fill(), cap - kept));
        Ok(())
    }

    /// Column names for multi-variable `name`.
    pub fn column_names(&self, name: &str) -> Vec<String> {
        (0..self.cap()).map(|i| format!("{name}[{i}]")).collect()
    }
}

/// Ordered `(name, MultiVar)` pairs.
pub struct MultiVarRegistry<R> {
    entries: Vec<(String, MultiVar<R>)>,
}

impl<R> Default for MultiVarRegistry<R> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<R> Clone for MultiVarRegistry<R> {
    fn clone(&self) -> Self {
        Self { entries: self.entries.clone() }
    }
}

impl<R> fmt::Debug for MultiVarRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.entries.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("MultiVarRegistry").field("names", &names).finish()
    }
}

impl<R: 'static> MultiVarRegistry<R> {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered multi-variables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Append one multi-variable.
    pub fn register(&mut self, name: impl Into<String>, var: MultiVar<R>) -> Result<()> {
        let name = name.into();
        if self.entries.iter().any(|(n, _)| *n == name) {
            return Err(Error::Configuration(format!("duplicate multi-variable name '{name}'")));
        }
        self.entries.push((name, var));
        Ok(())
    }

    /// Append a batch. Either every entry is added or none is.
    pub fn register_all<I, N>(&mut self, defs: I) -> Result<()>
    where
        I: IntoIterator<Item = (N, MultiVar<R>)>,
        N: Into<String>,
    {
        let batch: Vec<(String, MultiVar<R>)> =
            defs.into_iter().map(|(n, v)| (n.into(), v)).collect();
        check_unique(self.names().chain(batch.iter().map(|(n, _)| n.as_str())))?;
        self.entries.extend(batch);
        Ok(())
    }

    /// Evaluate every multi-variable in order, one value list per name.
    pub fn evaluate(&self, record: &R) -> Result<Vec<(&str, Vec<f64>)>> {
        self.entries
            .iter()
            .map(|(name, var)| {
                var.eval(record)
                    .map(|v| (name.as_str(), v))
                    .map_err(|e| Error::extraction(name.as_str(), e))
            })
            .collect()
    }

    /// Expanded column names, `cap` per multi-variable, in registration order.
    pub fn column_names(&self, expansion: &Expansion) -> Vec<String> {
        self.names().flat_map(|n| expansion.column_names(n)).collect()
    }

    /// Evaluate and expand into `out` (`len() * cap` values). On error `out`
    /// is left truncated to its original length.
    pub fn evaluate_expanded_into(
        &self,
        record: &R,
        expansion: &Expansion,
        out: &mut Vec<f64>,
    ) -> Result<()> {
        let start = out.len();
        for (name, var) in &self.entries {
            let res = var.eval(record).and_then(|values| expansion.expand(&values, out));
            if let Err(e) = res {
                out.truncate(start);
                return Err(Error::extraction(name.as_str(), e));
            }
        }
        Ok(())
    }
}
