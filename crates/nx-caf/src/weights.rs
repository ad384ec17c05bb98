//! Central-value flux and cross-section weights.
//!
//! Records without a truth neutrino (data) get weight 1.

use nx_ana::Weight;

use crate::schema::StandardRecord;

/// PPFX flux central value.
pub fn ppfx_flux_cv() -> Weight<StandardRecord> {
    Weight::new("ppfx_cv", |r: &StandardRecord| {
        Ok(r.mc.nu.first().map_or(1.0, |nu| nu.rwgt.ppfx_cv))
    })
}

/// 2020 cross-section tune central value.
pub fn xsec_cv_2020() -> Weight<StandardRecord> {
    Weight::new("xsec_cv_2020", |r: &StandardRecord| {
        Ok(r.mc.nu.first().map_or(1.0, |nu| nu.rwgt.xsec_cv_2020))
    })
}

/// Flux × cross-section central value, the weight of every exporter.
pub fn standard_weight() -> Weight<StandardRecord> {
    ppfx_flux_cv().multiply(&xsec_cv_2020())
}
