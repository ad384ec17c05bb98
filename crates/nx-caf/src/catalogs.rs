//! Standard variable catalogs: named `(column, Var)` lists over
//! [`StandardRecord`].
//!
//! Every function builds fresh values; nothing is shared between callers.

use nx_ana::{MultiVar, Var};
use nx_core::FieldError;

use crate::kinematics::{self, ParticleFilter};
use crate::schema::{Prong, Prong2D, StandardRecord, Track, TrueNu, Vertex};

/// Ordered scalar column definitions.
pub type VarDefs = Vec<(&'static str, Var<StandardRecord>)>;

/// Ordered multi-variable column definitions.
pub type MultiVarDefs = Vec<(&'static str, MultiVar<StandardRecord>)>;

/// Value of the track variables when the slice has no track.
pub const NO_TRACK: f64 = -5.0;

/// Tune of the reconstructed-energy estimators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyTune {
    /// 2018 analysis
    Ana2018,
    /// 2020 analysis
    Ana2020,
}

/// Which vertex a prong-level quantity reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexSource {
    /// `vtx.elastic`; no vertex means no prongs.
    Elastic,
    /// `vtx.tbvtx[0]`; must exist.
    TestBeam,
}

impl VertexSource {
    /// 3D prongs of the selected vertex.
    pub fn prongs(self, rec: &StandardRecord) -> Result<&[Prong], FieldError> {
        match self {
            VertexSource::Elastic => {
                Ok(rec.vtx.elastic.as_ref().map(|v| v.fuzzyk.png.as_slice()).unwrap_or_default())
            }
            VertexSource::TestBeam => rec
                .vtx
                .tbvtx
                .first()
                .map(|v| v.fuzzyk.png.as_slice())
                .ok_or(FieldError::OutOfBounds { list: "vtx.tbvtx", index: 0, len: 0 }),
        }
    }
}

/// Minimum `dir.z` of a forward prong.
pub const FORWARD_PRONG_MIN_DIR_Z: f64 = 0.9;

/// Hit count a forward prong stays below.
pub const FORWARD_PRONG_MAX_NHIT: u32 = 23;

/// Forward-going, short prong (proton-like in the test beam).
pub fn is_forward_prong(p: &Prong) -> bool {
    p.dir.z > FORWARD_PRONG_MIN_DIR_Z && p.nhit < FORWARD_PRONG_MAX_NHIT
}

fn nu(rec: &StandardRecord) -> Result<&TrueNu, FieldError> {
    kinematics::leading_nu(&rec.mc.nu)
}

fn elastic(rec: &StandardRecord) -> Result<&Vertex, FieldError> {
    rec.vtx.elastic.as_ref().ok_or(FieldError::Missing("vtx.elastic"))
}

fn best_track(rec: &StandardRecord) -> Result<Option<&Track>, FieldError> {
    let tracks = &rec.trk.kalman.tracks;
    if tracks.is_empty() {
        return Ok(None);
    }
    let idx = rec.sel.remid.bestidx;
    tracks
        .get(idx)
        .map(Some)
        .ok_or(FieldError::OutOfBounds { list: "trk.kalman.tracks", index: idx, len: tracks.len() })
}

/// Length (m) of the muon-ID track; [`NO_TRACK`] without tracks.
pub fn trk_length() -> Var<StandardRecord> {
    Var::new(|r: &StandardRecord| Ok(best_track(r)?.map_or(NO_TRACK, |t| t.len / 100.0)))
}

/// Hits on the muon-ID track; [`NO_TRACK`] without tracks.
pub fn trk_nhit() -> Var<StandardRecord> {
    Var::new(|r: &StandardRecord| Ok(best_track(r)?.map_or(NO_TRACK, |t| f64::from(t.nhit))))
}

/// Muon-ID score.
pub fn remid() -> Var<StandardRecord> {
    Var::simple(|r: &StandardRecord| r.sel.remid.pid)
}

/// True neutrino energy.
pub fn true_e() -> Var<StandardRecord> {
    Var::new(|r: &StandardRecord| Ok(nu(r)?.e))
}

/// Forward 3D prongs at `source`.
pub fn n_forward_prongs(source: VertexSource) -> Var<StandardRecord> {
    Var::new(move |r: &StandardRecord| {
        Ok(source.prongs(r)?.iter().filter(|p| is_forward_prong(p)).count() as f64)
    })
}

/// Slice-level identification and reconstruction columns.
pub fn slice_var_defs() -> VarDefs {
    vec![
        ("subrun", Var::simple(|r: &StandardRecord| f64::from(r.hdr.subrun))),
        ("event", Var::simple(|r: &StandardRecord| f64::from(r.hdr.evt))),
        ("slc.calE", Var::simple(|r: &StandardRecord| r.slc.cal_e)),
        ("slc.nhit", Var::simple(|r: &StandardRecord| f64::from(r.slc.nhit))),
        ("slc.ncontplanes", Var::simple(|r: &StandardRecord| f64::from(r.slc.ncontplanes))),
        ("slc.meantime", Var::simple(|r: &StandardRecord| r.slc.meantime)),
        ("vtx.x", Var::new(|r: &StandardRecord| Ok(elastic(r)?.vtx.x))),
        ("vtx.y", Var::new(|r: &StandardRecord| Ok(elastic(r)?.vtx.y))),
        ("vtx.z", Var::new(|r: &StandardRecord| Ok(elastic(r)?.vtx.z))),
    ]
}

/// Truth columns shared by every exporter.
pub fn truth_var_defs() -> VarDefs {
    vec![
        ("mode", Var::new(|r: &StandardRecord| Ok(f64::from(nu(r)?.mode)))),
        ("trueE", true_e()),
        ("trueLepE", Var::new(|r: &StandardRecord| Ok(kinematics::lepton(nu(r)?)?.e))),
        ("trueHadE", Var::new(|r: &StandardRecord| kinematics::hadronic_energy(nu(r)?))),
    ]
}

fn hadronic_component(k: usize) -> Var<StandardRecord> {
    Var::new(move |r: &StandardRecord| Ok(kinematics::hadronic_momentum(nu(r)?)?[k]))
}

fn total_component(k: usize, filter: ParticleFilter) -> Var<StandardRecord> {
    Var::new(move |r: &StandardRecord| Ok(kinematics::total_momentum(&nu(r)?.prim, filter)[k]))
}

/// Truth columns plus the hadronic-system and final-state momentum sums.
pub fn extended_truth_var_defs() -> VarDefs {
    vec![
        ("mode", Var::new(|r: &StandardRecord| Ok(f64::from(nu(r)?.mode)))),
        ("interaction", Var::new(|r: &StandardRecord| Ok(f64::from(nu(r)?.interaction)))),
        ("flavor", Var::new(|r: &StandardRecord| Ok(f64::from(nu(r)?.flavor)))),
        ("trueE", true_e()),
        ("trueLepMom", Var::new(|r: &StandardRecord| Ok(kinematics::lepton(nu(r)?)?.mag()))),
        ("trueLepE", Var::new(|r: &StandardRecord| Ok(kinematics::lepton(nu(r)?)?.e))),
        ("trueLepCos", Var::new(|r: &StandardRecord| Ok(kinematics::lepton(nu(r)?)?.costh()))),
        ("trueHadE", Var::new(|r: &StandardRecord| kinematics::hadronic_energy(nu(r)?))),
        ("trueHadTotMomX", hadronic_component(0)),
        ("trueHadTotMomY", hadronic_component(1)),
        ("trueHadTotMomZ", hadronic_component(2)),
        (
            "trueHadTotMom",
            Var::new(|r: &StandardRecord| {
                Ok(kinematics::norm(kinematics::hadronic_momentum(nu(r)?)?))
            }),
        ),
        ("trueTotMomX_all", total_component(0, ParticleFilter::All)),
        ("trueTotMomY_all", total_component(1, ParticleFilter::All)),
        ("trueTotMomZ_all", total_component(2, ParticleFilter::All)),
        (
            "trueTotMom_all",
            Var::new(|r: &StandardRecord| {
                Ok(kinematics::norm(kinematics::total_momentum(&nu(r)?.prim, ParticleFilter::All)))
            }),
        ),
        ("trueTotMomX_no_neutrons", total_component(0, ParticleFilter::NoNeutrons)),
        ("trueTotMomY_no_neutrons", total_component(1, ParticleFilter::NoNeutrons)),
        ("trueTotMomZ_no_neutrons", total_component(2, ParticleFilter::NoNeutrons)),
    ]
}

/// Reconstructed numu and nue energies for `tune`.
pub fn reco_var_defs(tune: EnergyTune) -> VarDefs {
    let numu = move |r: &StandardRecord| match tune {
        EnergyTune::Ana2018 => r.energy.numu.ana2018,
        EnergyTune::Ana2020 => r.energy.numu.ana2020,
    };
    let nue_e = move |r: &StandardRecord| match tune {
        EnergyTune::Ana2018 => r.energy.nue.e2018,
        EnergyTune::Ana2020 => r.energy.nue.e2020,
    };
    vec![
        ("numuRecoMuonE", Var::simple(move |r: &StandardRecord| numu(r).mu_e)),
        ("numuRecoHadE", Var::simple(move |r: &StandardRecord| numu(r).had_e)),
        ("numuRecoE", Var::simple(move |r: &StandardRecord| numu(r).e)),
        ("nueRecoLepE", Var::simple(|r: &StandardRecord| r.energy.nue.em_e)),
        ("nueRecoHadE", Var::simple(|r: &StandardRecord| r.energy.nue.had_e)),
        ("nueRecoE", Var::simple(nue_e)),
    ]
}

/// Neutral-current energy columns.
pub fn nux_var_defs() -> VarDefs {
    vec![("Nus20Energy", Var::simple(|r: &StandardRecord| r.energy.nus.e2020))]
}

/// Track, particle-ID and run columns.
pub fn extra_var_defs() -> VarDefs {
    vec![
        ("trkLen", trk_length()),
        ("remID", remid()),
        ("cvn.numuid", Var::simple(|r: &StandardRecord| r.sel.cvn.numuid)),
        ("cvn.nueid", Var::simple(|r: &StandardRecord| r.sel.cvn.nueid)),
        ("cvn.nutauid", Var::simple(|r: &StandardRecord| r.sel.cvn.nutauid)),
        ("cvn.ncid", Var::simple(|r: &StandardRecord| r.sel.cvn.ncid)),
        ("trkNHit", trk_nhit()),
        ("run", Var::simple(|r: &StandardRecord| f64::from(r.hdr.run))),
        ("hadCalE", Var::simple(|r: &StandardRecord| r.energy.numu.hadcal_e)),
        ("hadTrkE", Var::simple(|r: &StandardRecord| r.energy.numu.hadtrk_e)),
    ]
}

fn png2d<F>(f: F) -> MultiVar<StandardRecord>
where
    F: Fn(&Prong2D) -> f64 + Send + Sync + 'static,
{
    MultiVar::new(move |r: &StandardRecord| {
        let png2d = r.vtx.elastic.as_ref().map(|v| v.fuzzyk.png2d.as_slice()).unwrap_or_default();
        Ok(png2d.iter().map(&f).collect())
    })
}

fn png3d<F>(f: F) -> MultiVar<StandardRecord>
where
    F: Fn(&Prong) -> f64 + Send + Sync + 'static,
{
    MultiVar::new(move |r: &StandardRecord| {
        Ok(VertexSource::Elastic.prongs(r)?.iter().map(&f).collect())
    })
}

/// Per-prong columns of the 2D prongs at the elastic vertex.
pub fn png2d_var_defs() -> MultiVarDefs {
    vec![
        ("png2d.calE", png2d(|p| p.cal_e)),
        ("png2d.len", png2d(|p| p.len)),
        ("png2d.nhit", png2d(|p| f64::from(p.nhit))),
        ("png2d.view", png2d(|p| f64::from(p.view))),
    ]
}

/// Per-prong columns of the 3D prongs at the elastic vertex.
pub fn png3d_var_defs() -> MultiVarDefs {
    vec![
        ("png.calE", png3d(|p| p.cal_e)),
        ("png.len", png3d(|p| p.len)),
        ("png.nhit", png3d(|p| f64::from(p.nhit))),
        ("png.dir.x", png3d(|p| p.dir.x)),
        ("png.dir.y", png3d(|p| p.dir.y)),
        ("png.dir.z", png3d(|p| p.dir.z)),
    ]
}
