//! Event and spill record types.
//!
//! Field names follow the standard-record branch names (`mc.nu[0].prim`,
//! `vtx.elastic.fuzzyk.png`, ...) so a serialized record reads like a flat
//! dump of one CAF entry. Every branch defaults when absent from the input.

use nx_core::Exposure;
use serde::{Deserialize, Serialize};

/// Spill header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpillInfo {
    /// Run number
    pub run: u32,
    /// Subrun number
    pub subrun: u32,
    /// Delivered protons-on-target
    pub spillpot: f64,
    /// Beam-quality verdict
    pub isgoodspill: bool,
    /// Data-concentrator modules missing from the readout
    pub nmissingdcms: u32,
    /// Readout incomplete
    pub eventincomplete: bool,
    /// Simulated spill
    pub ismc: bool,
}

impl Exposure for SpillInfo {
    fn pot(&self) -> f64 {
        self.spillpot
    }
}

/// Three-vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vec3 {
    /// x
    pub x: f64,
    /// y
    pub y: f64,
    /// z
    pub z: f64,
}

/// Four-momentum (GeV)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FourMomentum {
    /// Energy
    #[serde(rename = "E")]
    pub e: f64,
    /// x component
    pub px: f64,
    /// y component
    pub py: f64,
    /// z component
    pub pz: f64,
}

impl FourMomentum {
    /// Three-momentum magnitude.
    pub fn mag(&self) -> f64 {
        (self.px * self.px + self.py * self.py + self.pz * self.pz).sqrt()
    }

    /// Cosine of the angle to the beam (z) axis; 1 for a null vector, as
    /// `TVector3::CosTheta` returns.
    pub fn costh(&self) -> f64 {
        let p = self.mag();
        if p > 0.0 { self.pz / p } else { 1.0 }
    }
}

/// Final-state particle of a truth interaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrueParticle {
    /// PDG species code
    pub pdg: i32,
    /// Four-momentum
    pub p: FourMomentum,
}

/// Central-value reweighting factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reweight {
    /// Flux (PPFX) central value
    pub ppfx_cv: f64,
    /// Cross-section tune central value
    pub xsec_cv_2020: f64,
}

impl Default for Reweight {
    fn default() -> Self {
        Self { ppfx_cv: 1.0, xsec_cv_2020: 1.0 }
    }
}

/// Truth neutrino interaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrueNu {
    /// Scattering mode (QE, RES, DIS, COH, ...)
    pub mode: i32,
    /// Interaction code
    pub interaction: i32,
    /// Flavor code
    pub flavor: i32,
    /// Neutrino PDG code
    pub pdg: i32,
    /// Charged current
    pub iscc: bool,
    /// Neutrino energy (GeV)
    #[serde(rename = "E")]
    pub e: f64,
    /// Neutrino four-momentum
    pub p: FourMomentum,
    /// Final-state primaries; the lepton comes first
    pub prim: Vec<TrueParticle>,
    /// Reweighting factors
    pub rwgt: Reweight,
}

/// Truth branch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TruthBranch {
    /// Neutrino interactions matched to the slice
    pub nu: Vec<TrueNu>,
}

impl TruthBranch {
    /// Number of matched neutrinos.
    pub fn nnu(&self) -> usize {
        self.nu.len()
    }
}

/// Event header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    /// Run number
    pub run: u32,
    /// Subrun number
    pub subrun: u32,
    /// Event number
    pub evt: u32,
}

/// Slice (reconstructed interaction candidate)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Slice {
    /// Calorimetric energy (GeV)
    #[serde(rename = "calE")]
    pub cal_e: f64,
    /// Mean hit time (ns)
    pub meantime: f64,
    /// Hit count
    pub nhit: u32,
    /// Contiguous planes
    pub ncontplanes: u32,
}

/// Muon-ID selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemId {
    /// Muon-likeness score
    pub pid: f64,
    /// Index of the best muon track in `trk.kalman.tracks`
    pub bestidx: usize,
}

/// CVN classifier scores
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CvnScores {
    /// numu CC
    pub numuid: f64,
    /// nue CC
    pub nueid: f64,
    /// nutau CC
    pub nutauid: f64,
    /// neutral current
    pub ncid: f64,
}

/// Containment distances (cells / planes to the detector edge)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Containment {
    /// Cells from the Kalman track end to the edge, forward
    pub kalfwdcell: i32,
    /// Cells from the Kalman track start to the edge, backward
    pub kalbakcell: i32,
    /// Cells to the edge along the cosmic-track direction, forward
    pub cosfwdcell: i32,
    /// Cells to the edge along the cosmic-track direction, backward
    pub cosbakcell: i32,
    /// Planes to the front face
    pub planestofront: i32,
    /// Planes to the back face
    pub planestoback: i32,
}

/// Selection branch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    /// Muon ID
    pub remid: RemId,
    /// CVN scores
    pub cvn: CvnScores,
    /// Loose-preselection CVN scores
    pub cvnloosepreselptp: CvnScores,
    /// Containment
    pub contain: Containment,
}

/// One tune of the numu energy estimator
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumuEstimate {
    /// Muon energy
    #[serde(rename = "muE")]
    pub mu_e: f64,
    /// Hadronic energy
    #[serde(rename = "hadE")]
    pub had_e: f64,
    /// Neutrino energy
    #[serde(rename = "E")]
    pub e: f64,
}

/// numu energy branch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumuEnergy {
    /// 2018 analysis tune
    pub ana2018: NumuEstimate,
    /// 2020 analysis tune
    pub ana2020: NumuEstimate,
    /// Calorimetric hadronic energy
    #[serde(rename = "hadcalE")]
    pub hadcal_e: f64,
    /// Hadronic energy on the muon track
    #[serde(rename = "hadtrkE")]
    pub hadtrk_e: f64,
    /// Track-based CC energy
    #[serde(rename = "trkccE")]
    pub trkcc_e: f64,
}

/// nue energy branch
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NueEnergy {
    /// Electromagnetic (lepton) energy
    #[serde(rename = "emE")]
    pub em_e: f64,
    /// Hadronic energy
    #[serde(rename = "hadE")]
    pub had_e: f64,
    /// 2018 neutrino energy
    #[serde(rename = "E2018")]
    pub e2018: f64,
    /// 2020 neutrino energy
    #[serde(rename = "E2020")]
    pub e2020: f64,
}

/// Neutral-current (NuX) energy branch
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NusEnergy {
    /// 2020 NC energy
    #[serde(rename = "E2020")]
    pub e2020: f64,
}

/// Energy estimators
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyBranch {
    /// numu
    pub numu: NumuEnergy,
    /// nue
    pub nue: NueEnergy,
    /// NC
    pub nus: NusEnergy,
}

/// Reconstructed track
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Track {
    /// Length (cm)
    pub len: f64,
    /// Hit count
    pub nhit: u32,
}

/// Kalman tracks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KalmanTracks {
    /// Tracks in the slice
    pub tracks: Vec<Track>,
}

/// Track branch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackBranch {
    /// Kalman tracker output
    pub kalman: KalmanTracks,
}

/// Truth matched to a prong
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProngTruth {
    /// Best-matched particle PDG
    pub pdg: i32,
    /// Best-matched particle four-momentum
    pub p: FourMomentum,
}

/// 3D fuzzy-k prong
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prong {
    /// Calorimetric energy
    #[serde(rename = "calE")]
    pub cal_e: f64,
    /// Length (cm)
    pub len: f64,
    /// Hit count
    pub nhit: u32,
    /// Unit direction
    pub dir: Vec3,
    /// Matched truth
    pub truth: ProngTruth,
}

/// 2D (single-view) fuzzy-k prong
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prong2D {
    /// Calorimetric energy
    #[serde(rename = "calE")]
    pub cal_e: f64,
    /// Length (cm)
    pub len: f64,
    /// Hit count
    pub nhit: u32,
    /// Detector view (0 = x, 1 = y)
    pub view: u8,
}

/// Fuzzy-k prong clustering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyK {
    /// 3D prongs
    pub png: Vec<Prong>,
    /// 2D prongs
    pub png2d: Vec<Prong2D>,
}

impl FuzzyK {
    /// Number of 3D prongs.
    pub fn npng(&self) -> usize {
        self.png.len()
    }
}

/// Reconstructed vertex with its prongs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vertex {
    /// Position (cm)
    pub vtx: Vec3,
    /// Prongs
    pub fuzzyk: FuzzyK,
}

/// Vertex branch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VertexBranch {
    /// Elastic-arms vertex, absent when vertexing failed
    pub elastic: Option<Vertex>,
    /// Test-beam vertices
    pub tbvtx: Vec<Vertex>,
}

/// One reconstructed slice with its truth and selection information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardRecord {
    /// Header
    pub hdr: Header,
    /// Truth
    pub mc: TruthBranch,
    /// Slice
    pub slc: Slice,
    /// Selection scores
    pub sel: Selection,
    /// Energy estimators
    pub energy: EnergyBranch,
    /// Tracks
    pub trk: TrackBranch,
    /// Vertices
    pub vtx: VertexBranch,
}
