//! Ordered, uniquely-named collections of scalar variables.

use std::collections::HashSet;

use nx_core::{Error, Result};

use crate::var::Var;

/// Fail with [`Error::Configuration`] on the first repeated name.
pub(crate) fn check_unique<'a, I>(names: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(Error::Configuration(format!("duplicate column name '{name}'")));
        }
    }
    Ok(())
}

/// Ordered `(name, Var)` pairs. Insertion order is output column order.
pub struct VarRegistry<R> {
    entries: Vec<(String, Var<R>)>,
}

impl<R> Default for VarRegistry<R> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<R> Clone for VarRegistry<R> {
    fn clone(&self) -> Self {
        Self { entries: self.entries.clone() }
    }
}

impl<R> std::fmt::Debug for VarRegistry<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.entries.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("VarRegistry").field("names", &names).finish()
    }
}

impl<R: 'static> VarRegistry<R> {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered variables.
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

    /// `(name, var)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Var<R>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// `true` if `name` is already registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Append one variable.
    pub fn register(&mut self, name: impl Into<String>, var: Var<R>) -> Result<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(Error::Configuration(format!("duplicate column name '{name}'")));
        }
        self.entries.push((name, var));
        Ok(())
    }

    /// Append a batch. Either every entry is added or none is.
    pub fn register_all<I, N>(&mut self, defs: I) -> Result<()>
    where
        I: IntoIterator<Item = (N, Var<R>)>,
        N: Into<String>,
    {
        let batch: Vec<(String, Var<R>)> = defs.into_iter().map(|(n, v)| (n.into(), v)).collect();
        check_unique(self.names().chain(batch.iter().map(|(n, _)| n.as_str())))?;
        self.entries.extend(batch);
        Ok(())
    }

    /// Evaluate every variable in order.
    ///
    /// Exactly `len()` values on success; the first failing variable is
    /// reported as [`Error::Extraction`] with its column name.
    pub fn evaluate(&self, record: &R) -> Result<Vec<(&str, f64)>> {
        self.entries
            .iter()
            .map(|(name, var)| {
                var.eval(record)
                    .map(|v| (name.as_str(), v))
                    .map_err(|e| Error::extraction(name.as_str(), e))
            })
            .collect()
    }

    /// Append every value to `out`. On error `out` is left truncated to its
    /// original length.
    pub fn evaluate_into(&self, record: &R, out: &mut Vec<f64>) -> Result<()> {
        let start = out.len();
        for (name, var) in &self.entries {
            match var.eval(record) {
                Ok(v) => out.push(v),
                Err(e) => {
                    out.truncate(start);
                    return Err(Error::extraction(name.as_str(), e));
                }
            }
        }
        Ok(())
    }
}
