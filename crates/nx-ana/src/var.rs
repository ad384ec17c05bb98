//! Scalar variables: pure functions from one record to one `f64`.
//!
//! Variables compose through explicit combinators (`add`, `sub`, `mul`,
//! `div`, `map`) and turn into cuts through comparisons (`less_than`,
//! `greater_than`, `in_range`, ...). A `Var` never mutates the record.

use std::fmt;
use std::sync::Arc;

use nx_core::FieldError;

use crate::cut::Cut;
use crate::weight::Weight;

type VarFn<R> = dyn Fn(&R) -> Result<f64, FieldError> + Send + Sync;

/// A scalar extractor over records of type `R`.
///
/// Cheap to clone (reference-counted); safe to share across threads.
pub struct Var<R> {
    f: Arc<VarFn<R>>,
}

impl<R> Clone for Var<R> {
    fn clone(&self) -> Self {
        Self { f: Arc::clone(&self.f) }
    }
}

impl<R> fmt::Debug for Var<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Var")
    }
}

impl<R: 'static> Var<R> {
    /// Derived variable: any fallible computation over the record.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&R) -> Result<f64, FieldError> + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    /// Simple variable: a direct, always-present field lookup.
    pub fn simple<F>(f: F) -> Self
    where
        F: Fn(&R) -> f64 + Send + Sync + 'static,
    {
        Self::new(move |r| Ok(f(r)))
    }

    /// Variable returning `value` for every record.
    pub fn constant(value: f64) -> Self {
        Self::simple(move |_| value)
    }

    /// Evaluate on one record.
    #[inline]
    pub fn eval(&self, record: &R) -> Result<f64, FieldError> {
        (self.f)(record)
    }

    /// Apply a scalar function to the result.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        let inner = self.clone();
        Self::new(move |r| inner.eval(r).map(&f))
    }

    fn binary<F>(&self, other: &Var<R>, op: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        let (a, b) = (self.clone(), other.clone());
        Self::new(move |r| Ok(op(a.eval(r)?, b.eval(r)?)))
    }

    /// `self + other`
    pub fn add(&self, other: &Var<R>) -> Self {
        self.binary(other, |a, b| a + b)
    }

    /// `self - other`
    pub fn sub(&self, other: &Var<R>) -> Self {
        self.binary(other, |a, b| a - b)
    }

    /// `self * other`
    pub fn mul(&self, other: &Var<R>) -> Self {
        self.binary(other, |a, b| a * b)
    }

    /// `self / other` (IEEE semantics on zero denominators).
    pub fn div(&self, other: &Var<R>) -> Self {
        self.binary(other, |a, b| a / b)
    }

    /// Multiply by a constant.
    pub fn scale(&self, factor: f64) -> Self {
        self.map(move |x| x * factor)
    }

    fn compare<F>(&self, name: String, pred: F) -> Cut<R>
    where
        F: Fn(f64) -> bool + Send + Sync + 'static,
    {
        let inner = self.clone();
        Cut::new(name, move |r| inner.eval(r).map(&pred))
    }

    /// Cut passing when `self < x`.
    pub fn less_than(&self, x: f64) -> Cut<R> {
        self.compare(format!("< {x}"), move |v| v < x)
    }

    /// Cut passing when `self <= x`.
    pub fn less_equal(&self, x: f64) -> Cut<R> {
        self.compare(format!("<= {x}"), move |v| v <= x)
    }

    /// Cut passing when `self > x`.
    pub fn greater_than(&self, x: f64) -> Cut<R> {
        self.compare(format!("> {x}"), move |v| v > x)
    }

    /// Cut passing when `self >= x`.
    pub fn greater_equal(&self, x: f64) -> Cut<R> {
        self.compare(format!(">= {x}"), move |v| v >= x)
    }

    /// Cut passing when `self == x`.
    pub fn equal_to(&self, x: f64) -> Cut<R> {
        self.compare(format!("== {x}"), move |v| v == x)
    }

    /// Cut passing when `lo < self < hi` (both ends exclusive).
    pub fn in_range(&self, lo: f64, hi: f64) -> Cut<R> {
        self.compare(format!("in ({lo}, {hi})"), move |v| v > lo && v < hi)
    }

    /// Reinterpret this variable as an event weight.
    pub fn to_weight(&self, name: impl Into<String>) -> Weight<R> {
        let inner = self.clone();
        Weight::new(name, move |r| inner.eval(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Rec {
        e: f64,
        parts: Vec<f64>,
    }

    fn first_part() -> Var<Rec> {
        Var::new(|r: &Rec| {
            r.parts.first().copied().ok_or(FieldError::OutOfBounds {
                list: "parts",
                index: 0,
                len: r.parts.len(),
            })
        })
    }

    #[test]
    fn arithmetic_combinators() {
        let rec = Rec { e: 10.0, parts: vec![4.0] };
        let e = Var::simple(|r: &Rec| r.e);
        let lep = first_part();
        assert_relative_eq!(e.sub(&lep).eval(&rec).unwrap(), 6.0);
        assert_relative_eq!(e.add(&lep).eval(&rec).unwrap(), 14.0);
        assert_relative_eq!(e.mul(&lep).eval(&rec).unwrap(), 40.0);
        assert_relative_eq!(e.div(&lep).eval(&rec).unwrap(), 2.5);
        assert_relative_eq!(e.scale(0.5).eval(&rec).unwrap(), 5.0);
        assert_relative_eq!(e.map(f64::sqrt).map(|x| x * x).eval(&rec).unwrap(), 10.0);
        assert_eq!(Var::<Rec>::constant(3.0).eval(&rec).unwrap(), 3.0);
    }

    #[test]
    fn errors_propagate_through_combinators() {
        let rec = Rec { e: 10.0, parts: vec![] };
        let had = Var::simple(|r: &Rec| r.e).sub(&first_part());
        let err = had.eval(&rec).unwrap_err();
        assert_eq!(err, FieldError::OutOfBounds { list: "parts", index: 0, len: 0 });
    }

    #[test]
    fn comparisons_build_cuts() {
        let rec = Rec { e: 7.0, parts: vec![] };
        let e = Var::simple(|r: &Rec| r.e);
        assert!(!e.less_than(7.0).pass(&rec).unwrap());
        assert!(e.less_equal(7.0).pass(&rec).unwrap());
        assert!(!e.greater_than(7.0).pass(&rec).unwrap());
        assert!(e.greater_equal(7.0).pass(&rec).unwrap());
        assert!(e.equal_to(7.0).pass(&rec).unwrap());
        assert!(e.in_range(6.0, 8.0).pass(&rec).unwrap());
        assert!(!e.in_range(7.0, 8.0).pass(&rec).unwrap());
        assert_eq!(e.less_than(7.0).name(), "< 7");
    }

    #[test]
    fn var_as_weight() {
        let rec = Rec { e: 2.0, parts: vec![] };
        let w = Var::simple(|r: &Rec| r.e).to_weight("w");
        assert_eq!(w.name(), "w");
        assert_eq!(w.eval(&rec).unwrap(), 2.0);
    }
}
