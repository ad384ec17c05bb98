//! Standard event and spill selections.

use nx_ana::Cut;

use crate::catalogs::{VertexSource, is_forward_prong, remid, true_e};
use crate::schema::{SpillInfo, StandardRecord};

/// Muon-ID and loose-preselection CVN threshold.
pub const LOOSE_PID_MIN: f64 = 0.5;

/// Upper bound (MeV) of a plausible matched-truth prong energy.
pub const MAX_PRONG_TRUTH_E: f64 = 5000.0;

/// Slice mean-time window (ns) of the beam spill in simulated near-detector
/// events.
pub const ND_MC_BEAM_WINDOW: (f64, f64) = (215_000.0, 230_000.0);

/// Slice mean-time window (ns) of the test-beam trigger in simulation.
pub const TB_MC_BEAM_WINDOW: (f64, f64) = (84_020.0, 84_170.0);

/// The record has a truth neutrino with at least one final-state particle.
pub fn sanity() -> Cut<StandardRecord> {
    Cut::simple("sanity", |r: &StandardRecord| {
        r.mc.nnu() > 0 && !r.mc.nu[0].prim.is_empty()
    })
}

/// True muon-neutrino charged-current interaction.
pub fn is_numu_cc() -> Cut<StandardRecord> {
    Cut::simple("isNumuCC", |r: &StandardRecord| {
        r.mc.nu.first().is_some_and(|nu| nu.iscc && nu.pdg.abs() == 14)
    })
}

/// Reconstruction quality for the numu selection.
pub fn numu_basic_quality() -> Cut<StandardRecord> {
    Cut::simple("numuBasicQuality", |r: &StandardRecord| {
        r.energy.numu.trkcc_e > 0.0
            && r.sel.remid.pid > 0.0
            && r.slc.nhit > 20
            && r.slc.ncontplanes > 4
            && !r.trk.kalman.tracks.is_empty()
    })
}

/// Far-detector containment.
pub fn numu_contain_fd() -> Cut<StandardRecord> {
    Cut::simple("numuContainFD", |r: &StandardRecord| {
        let c = &r.sel.contain;
        c.kalfwdcell > 6
            && c.kalbakcell > 6
            && c.cosfwdcell > 0
            && c.cosbakcell > 7
            && c.planestofront > 1
            && c.planestoback > 1
    })
}

/// Muon-ID and loose-preselection CVN both above [`LOOSE_PID_MIN`].
pub fn numu_loose_pid() -> Cut<StandardRecord> {
    let cvn = Cut::simple("cvnloose > 0.5", |r: &StandardRecord| {
        r.sel.cvnloosepreselptp.numuid > LOOSE_PID_MIN
    });
    remid().greater_than(LOOSE_PID_MIN).and(&cvn).named("numuLoosePID")
}

/// True neutrino energy below `max_gev`.
pub fn true_e_below(max_gev: f64) -> Cut<StandardRecord> {
    true_e().less_than(max_gev).named(format!("trueE < {max_gev}"))
}

/// Near-detector neutral-current selection: quality, fiducial vertex and
/// NC-like CVN score.
pub fn nus_nd_cuts() -> Cut<StandardRecord> {
    let quality = Cut::simple("nusNDQuality", |r: &StandardRecord| {
        r.slc.nhit >= 20 && r.slc.ncontplanes >= 4
    });
    let fiducial = Cut::simple("nusNDFiducial", |r: &StandardRecord| {
        r.vtx.elastic.as_ref().is_some_and(|v| {
            v.vtx.x.abs() < 140.0 && v.vtx.y.abs() < 140.0 && v.vtx.z > 100.0 && v.vtx.z < 700.0
        })
    });
    let nc_id = Cut::simple("nusNDPID", |r: &StandardRecord| r.sel.cvn.ncid > LOOSE_PID_MIN);
    Cut::all([&quality, &fiducial, &nc_id]).named("nusNDCuts")
}

/// Slice mean time strictly inside `(lo, hi)`.
pub fn slc_time_mc((lo, hi): (f64, f64)) -> Cut<StandardRecord> {
    Cut::simple(format!("{lo} < slc.meantime < {hi}"), move |r: &StandardRecord| {
        r.slc.meantime > lo && r.slc.meantime < hi
    })
}

/// The first forward prong at `source` is matched to a particle of plausible
/// energy. Records without a forward prong fail.
pub fn truth_exists(source: VertexSource) -> Cut<StandardRecord> {
    Cut::new("truthExists", move |r: &StandardRecord| {
        Ok(source
            .prongs(r)?
            .iter()
            .find(|p| is_forward_prong(p))
            .is_some_and(|p| p.truth.p.e > 0.0 && p.truth.p.e < MAX_PRONG_TRUTH_E))
    })
}

/// Beam and readout quality of a spill; simulated spills always pass.
pub fn standard_spill_cuts() -> Cut<SpillInfo> {
    Cut::simple("standardSpillCuts", |s: &SpillInfo| {
        s.ismc || (s.isgoodspill && s.nmissingdcms == 0 && !s.eventincomplete)
    })
}
