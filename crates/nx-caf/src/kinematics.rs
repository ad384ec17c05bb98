//! Derived truth kinematics of the final-state system.

use nx_core::FieldError;

use crate::schema::{FourMomentum, TrueNu, TrueParticle};

/// PDG code of the neutron.
pub const NEUTRON: i32 = 2112;

/// Codes at or above this magnitude are nuclei and bookkeeping entries.
pub const NUCLEUS_THRESHOLD: u32 = 1_000_000_000;

/// Which final-state particles enter a momentum sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleFilter {
    /// Every particle with a physical species code.
    All,
    /// As `All`, minus neutrons (antineutrons are kept).
    NoNeutrons,
}

impl ParticleFilter {
    /// `true` if a particle with code `pdg` is summed.
    pub fn accepts(self, pdg: i32) -> bool {
        let physical = pdg.unsigned_abs() < NUCLEUS_THRESHOLD;
        match self {
            ParticleFilter::All => physical,
            ParticleFilter::NoNeutrons => physical && pdg != NEUTRON,
        }
    }
}

/// Summed three-momentum `[px, py, pz]` of the accepted particles.
pub fn total_momentum(prim: &[TrueParticle], filter: ParticleFilter) -> [f64; 3] {
    prim.iter().filter(|p| filter.accepts(p.pdg)).fold([0.0; 3], |acc, p| {
        [acc[0] + p.p.px, acc[1] + p.p.py, acc[2] + p.p.pz]
    })
}

/// Euclidean norm of a three-vector.
pub fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Leading neutrino of a record's truth list.
pub fn leading_nu(nu: &[TrueNu]) -> Result<&TrueNu, FieldError> {
    nu.first().ok_or(FieldError::OutOfBounds { list: "mc.nu", index: 0, len: nu.len() })
}

/// Outgoing lepton (first primary) of an interaction.
pub fn lepton(nu: &TrueNu) -> Result<&FourMomentum, FieldError> {
    nu.prim.first().map(|p| &p.p).ok_or(FieldError::OutOfBounds {
        list: "mc.nu[0].prim",
        index: 0,
        len: nu.prim.len(),
    })
}

/// Hadronic-system three-momentum: neutrino minus lepton.
pub fn hadronic_momentum(nu: &TrueNu) -> Result<[f64; 3], FieldError> {
    let lep = lepton(nu)?;
    Ok([nu.p.px - lep.px, nu.p.py - lep.py, nu.p.pz - lep.pz])
}

/// Hadronic energy by energy conservation: neutrino minus lepton.
pub fn hadronic_energy(nu: &TrueNu) -> Result<f64, FieldError> {
    Ok(nu.e - lepton(nu)?.e)
}
