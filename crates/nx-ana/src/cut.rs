//! Selection predicates ("cuts") over records.
//!
//! Cuts combine with [`Cut::and`], [`Cut::or`] and [`Cut::not`]. `and`/`or`
//! evaluate left to right and stop as soon as the result is known, so a guard
//! placed on the left (e.g. "truth list non-empty") protects every cut to its
//! right from invalid record shapes. Nothing reorders operands.

use std::fmt;
use std::sync::Arc;

use nx_core::{Error, FieldError, Result};

type CutFn<R> = dyn Fn(&R) -> Result<bool> + Send + Sync;

/// A named boolean predicate over records of type `R`.
pub struct Cut<R> {
    name: Arc<str>,
    f: Arc<CutFn<R>>,
}

impl<R> Clone for Cut<R> {
    fn clone(&self) -> Self {
        Self { name: Arc::clone(&self.name), f: Arc::clone(&self.f) }
    }
}

impl<R> fmt::Debug for Cut<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cut").field(&self.name).finish()
    }
}

impl<R: 'static> Cut<R> {
    /// Leaf cut from a fallible predicate. Failures are reported under `name`.
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&R) -> std::result::Result<bool, FieldError> + Send + Sync + 'static,
    {
        let name: Arc<str> = Arc::from(name.into());
        let label = Arc::clone(&name);
        Self { name, f: Arc::new(move |r: &R| f(r).map_err(|e| Error::extraction(&*label, e))) }
    }

    /// Leaf cut from a predicate that cannot fail.
    pub fn simple<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        Self::new(name, move |r| Ok(f(r)))
    }

    /// Cut accepting every record; the identity of [`Cut::and`].
    pub fn pass_all() -> Self {
        Self::simple("pass_all", |_| true)
    }

    /// Cut rejecting every record; the identity of [`Cut::or`].
    pub fn reject_all() -> Self {
        Self::simple("reject_all", |_| false)
    }

    fn composite<F>(name: String, f: F) -> Self
    where
        F: Fn(&R) -> Result<bool> + Send + Sync + 'static,
    {
        Self { name: Arc::from(name), f: Arc::new(f) }
    }

    /// Cut name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same predicate under a different name.
    pub fn named(&self, name: impl Into<String>) -> Self {
        Self { name: Arc::from(name.into()), f: Arc::clone(&self.f) }
    }

    /// Evaluate on one record.
    ///
    /// A failing leaf is reported as [`Error::Extraction`] carrying the leaf's name.
    #[inline]
    pub fn pass(&self, record: &R) -> Result<bool> {
        (self.f)(record)
    }

    /// Logical AND; `other` is not evaluated when `self` fails.
    pub fn and(&self, other: &Cut<R>) -> Self {
        let (a, b) = (self.clone(), other.clone());
        Self::composite(format!("({} && {})", a.name, b.name), move |r| {
            Ok(a.pass(r)? && b.pass(r)?)
        })
    }

    /// Logical OR; `other` is not evaluated when `self` passes.
    pub fn or(&self, other: &Cut<R>) -> Self {
        let (a, b) = (self.clone(), other.clone());
        Self::composite(format!("({} || {})", a.name, b.name), move |r| {
            Ok(a.pass(r)? || b.pass(r)?)
        })
    }

    /// Logical NOT.
    #[allow(clippy::should_implement_trait)]
    pub fn not(&self) -> Self {
        let a = self.clone();
        Self::composite(format!("!{}", a.name), move |r| Ok(!a.pass(r)?))
    }

    /// AND of every cut in order; `pass_all` when empty.
    pub fn all<'a, I>(cuts: I) -> Self
    where
        I: IntoIterator<Item = &'a Cut<R>>,
    {
        let mut iter = cuts.into_iter();
        match iter.next() {
            Some(first) => iter.fold(first.clone(), |acc, c| acc.and(c)),
            None => Self::pass_all(),
        }
    }

    /// OR of every cut in order; `reject_all` when empty.
    pub fn any<'a, I>(cuts: I) -> Self
    where
        I: IntoIterator<Item = &'a Cut<R>>,
    {
        let mut iter = cuts.into_iter();
        match iter.next() {
            Some(first) => iter.fold(first.clone(), |acc, c| acc.or(c)),
            None => Self::reject_all(),
        }
    }
}
