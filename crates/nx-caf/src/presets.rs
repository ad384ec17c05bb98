//! Compiled-in analysis jobs.
//!
//! Each preset builds its cuts, variables and weights when called, so two
//! presets never share configuration state. The [`PRESETS`] table records the
//! dataset and output file every job was written for.

use std::path::{Path, PathBuf};

use nx_ana::{
    Binning, CsvMaker, Cut, HistAxis, Histogram, HistogramFile, Spectrum, SpectrumId,
    SpectrumLoader, Var,
};
use nx_core::{Error, Result, RunSummary};

use crate::catalogs::{
    EnergyTune, VarDefs, VertexSource, extended_truth_var_defs, extra_var_defs, n_forward_prongs,
    nux_var_defs, png2d_var_defs, png3d_var_defs, reco_var_defs, slice_var_defs, truth_var_defs,
};
use crate::cuts::{
    ND_MC_BEAM_WINDOW, TB_MC_BEAM_WINDOW, is_numu_cc, numu_basic_quality, numu_contain_fd,
    numu_loose_pid, nus_nd_cuts, sanity, slc_time_mc, standard_spill_cuts, true_e_below,
    truth_exists,
};
use crate::reader::CafSource;
use crate::schema::StandardRecord;
use crate::weights::standard_weight;

/// Upper true-energy bound (GeV) of the far-detector numu samples.
pub const FD_MAX_TRUE_E: f64 = 7.0;

/// Digits written by every exporter.
pub const EXPORT_PRECISION: usize = 6;

/// What a preset writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetKind {
    /// One CSV row per selected event
    Export,
    /// Histogram container
    Plot,
}

impl PresetKind {
    /// CLI subcommand running this kind of preset.
    pub fn as_str(self) -> &'static str {
        match self {
            PresetKind::Export => "export",
            PresetKind::Plot => "plot",
        }
    }
}

/// Catalogue entry of a compiled-in job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    /// Name used on the command line
    pub name: &'static str,
    /// Output type
    pub kind: PresetKind,
    /// Data source the job was written for
    pub dataset: &'static str,
    /// Default output file
    pub output: &'static str,
    /// One-line summary
    pub description: &'static str,
}

/// Every compiled-in job.
pub const PRESETS: [Preset; 5] = [
    Preset {
        name: "exporter_lstm_ee_fd_fhc_nonswap",
        kind: PresetKind::Export,
        dataset: "dataset_def_name_newest_snapshot prod_caf_R19-11-18-prod5reco.f_fd_genie_N1810j0211a_nonswap_fhc_nova_v08_period3_v1",
        output: "dataset_lstm_ee_fd_fhc_nonswap.csv",
        description: "FD FHC numu CC training rows with extended truth kinematics",
    },
    Preset {
        name: "exporter_lstm_ee_fd_rhc_nonswap",
        kind: PresetKind::Export,
        dataset: "dataset_def_name_newest_snapshot prod_caf_R19-11-18-prod5reco.f_fd_genie_N1810j0211a_nonswap_rhc_nova_v08_period4_v1",
        output: "dataset_lstm_ee_fd_rhc_nonswap.csv",
        description: "FD RHC numu CC training rows",
    },
    Preset {
        name: "nux_exporter_lstm_ee_nd_nonswap",
        kind: PresetKind::Export,
        dataset: "dataset_def_name_newest_snapshot prod_sumdecaf_R19-11-18-prod5reco.d.h.l_nd_genie_N1810j0211a_nonswap_fhc_nova_v08_full_v1_nus2020",
        output: "dataset_NuX_lstm_ee_nd_nonswap.csv",
        description: "ND neutral-current training rows",
    },
    Preset {
        name: "new_kin_vars_plots",
        kind: PresetKind::Plot,
        dataset: "/pnfs/nova/persistent/production/concat/R20-11-25-prod5.1reco.a/nd/sumdecaf/ndphysics_contain/genie/prod_sumdecaf_R20-11-25-prod5.1reco.a_nd_genie_N1810j0211a_nonswap_fhc_nova_v08_full_v1_145_of_600.root",
        output: "plots.json",
        description: "ND forward-prong multiplicity with and without matched truth",
    },
    Preset {
        name: "tb_plots",
        kind: PresetKind::Plot,
        dataset: "/pnfs/nova/persistent/production/concat/R20-11-25-prod5.1reco.a/nd/sumdecaf/ndphysics_contain/genie/prod_sumdecaf_R20-11-25-prod5.1reco.a_nd_genie_N1810j0211a_nonswap_fhc_nova_v08_full_v1_145_of_600.root",
        output: "tbprotons_plots.json",
        description: "Test-beam forward-prong multiplicity",
    },
];

/// Look up a preset by name.
pub fn find(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name)
}

/// Result of running a preset.
#[derive(Debug, Clone)]
pub enum PresetOutcome {
    /// Rows were written
    Export(RunSummary),
    /// Histograms were written
    Plot {
        /// Run totals
        summary: RunSummary,
        /// Saved histograms
        histograms: HistogramFile,
    },
}

impl PresetOutcome {
    /// Run totals of either kind of job.
    pub fn summary(&self) -> &RunSummary {
        match self {
            PresetOutcome::Export(s) | PresetOutcome::Plot { summary: s, .. } => s,
        }
    }
}

impl Preset {
    /// Run this preset over `source`, writing to `output`.
    pub fn run<S: CafSource>(&self, source: S, output: &Path) -> Result<PresetOutcome> {
        log::info!("running preset {} -> {}", self.name, output.display());
        match self.name {
            "exporter_lstm_ee_fd_fhc_nonswap" => {
                exporter_lstm_ee_fd_fhc_nonswap(source, output)?.go().map(PresetOutcome::Export)
            }
            "exporter_lstm_ee_fd_rhc_nonswap" => {
                exporter_lstm_ee_fd_rhc_nonswap(source, output)?.go().map(PresetOutcome::Export)
            }
            "nux_exporter_lstm_ee_nd_nonswap" => {
                nux_exporter_lstm_ee_nd_nonswap(source, output)?.go().map(PresetOutcome::Export)
            }
            "new_kin_vars_plots" => new_kin_vars_plots(source, output),
            "tb_plots" => tb_plots(source, output),
            other => Err(Error::Configuration(format!("unknown preset '{other}'"))),
        }
    }
}

/// Far-detector numu CC selection of the LSTM energy samples.
pub fn numu_fd_selection() -> Cut<StandardRecord> {
    let reco = Cut::all([&numu_basic_quality(), &numu_contain_fd(), &numu_loose_pid()]);
    Cut::all([&is_numu_cc(), &reco, &true_e_below(FD_MAX_TRUE_E), &sanity()])
}

fn lstm_exporter<S: CafSource>(
    source: S,
    output: impl Into<PathBuf>,
    var_groups: Vec<VarDefs>,
    cut: Cut<StandardRecord>,
) -> Result<CsvMaker<S>> {
    let mut maker = CsvMaker::new(source, output);
    maker.set_precision(EXPORT_PRECISION);
    maker.add_vars(slice_var_defs())?;
    for defs in var_groups {
        maker.add_vars(defs)?;
    }
    maker.add_multi_vars(png2d_var_defs())?;
    maker.add_multi_vars(png3d_var_defs())?;
    maker.set_weight(standard_weight());
    maker.set_spill_cut(standard_spill_cuts());
    maker.set_cut(cut);
    maker.validate()?;
    Ok(maker)
}

/// FD FHC exporter: full truth kinematics, 2018 energies, slice visible energy.
pub fn exporter_lstm_ee_fd_fhc_nonswap<S: CafSource>(
    source: S,
    output: impl Into<PathBuf>,
) -> Result<CsvMaker<S>> {
    let mut reco = reco_var_defs(EnergyTune::Ana2018);
    reco.push(("SlcVisE", Var::simple(|r: &StandardRecord| r.slc.cal_e)));
    lstm_exporter(
        source,
        output,
        vec![extended_truth_var_defs(), reco, extra_var_defs()],
        numu_fd_selection(),
    )
}

/// FD RHC exporter: basic truth, 2018 energies.
pub fn exporter_lstm_ee_fd_rhc_nonswap<S: CafSource>(
    source: S,
    output: impl Into<PathBuf>,
) -> Result<CsvMaker<S>> {
    lstm_exporter(
        source,
        output,
        vec![truth_var_defs(), reco_var_defs(EnergyTune::Ana2018), extra_var_defs()],
        numu_fd_selection(),
    )
}

/// ND neutral-current exporter: basic truth, 2020 energies plus the NC energy.
pub fn nux_exporter_lstm_ee_nd_nonswap<S: CafSource>(
    source: S,
    output: impl Into<PathBuf>,
) -> Result<CsvMaker<S>> {
    let mut reco = reco_var_defs(EnergyTune::Ana2020);
    reco.extend(nux_var_defs());
    lstm_exporter(
        source,
        output,
        vec![truth_var_defs(), reco, extra_var_defs()],
        nus_nd_cuts().and(&sanity()),
    )
}

/// Normalize to the spectrum's own exposure; without exposure keep raw contents.
fn own_exposure_hist(s: &Spectrum) -> Result<Histogram> {
    match s.to_hist(s.pot()) {
        Ok(h) => Ok(h),
        Err(Error::Normalization(msg)) => {
            log::warn!("{msg}; writing un-normalized contents");
            Ok(s.to_hist_raw())
        }
        Err(e) => Err(e),
    }
}

fn write_plots<S: CafSource>(
    loader: SpectrumLoader<S>,
    keys: &[(&str, SpectrumId)],
    output: &Path,
) -> Result<PresetOutcome> {
    let spectra = loader.go()?;
    let mut histograms = HistogramFile::new();
    for &(key, id) in keys {
        let spectrum = spectra
            .get(id)
            .ok_or_else(|| Error::Configuration(format!("spectrum for '{key}' was not filled")))?;
        histograms.write_1d(key, own_exposure_hist(spectrum)?)?;
    }
    histograms.save(output)?;
    Ok(PresetOutcome::Plot { summary: spectra.summary, histograms })
}

/// Forward-prong multiplicity at the ND elastic vertex, with and without the
/// matched-truth requirement.
pub fn new_kin_vars_plots<S: CafSource>(source: S, output: &Path) -> Result<PresetOutcome> {
    let axis = HistAxis::new(
        "LSTM Neutrino Energy (GeV)",
        Binning::simple(100, 0.0, 0.0),
        n_forward_prongs(VertexSource::Elastic),
    );
    let in_time = slc_time_mc(ND_MC_BEAM_WINDOW);
    let with_truth = truth_exists(VertexSource::Elastic).and(&in_time);

    let mut loader = SpectrumLoader::new(source);
    let matched = loader.add_spectrum("nu_energy_lstm", &axis, &with_truth)?;
    let all = loader.add_spectrum("nu_energy_lstm_all", &axis, &in_time)?;
    write_plots(loader, &[("hist_kNuEnergyLSTM", matched), ("hist_kNuEnergyLSTM1", all)], output)
}

/// Test-beam forward-prong multiplicity.
pub fn tb_plots<S: CafSource>(source: S, output: &Path) -> Result<PresetOutcome> {
    let axis = HistAxis::new(
        "Num. 3D prongs passing cuts",
        Binning::simple(10, 0.0, 10.0),
        n_forward_prongs(VertexSource::TestBeam),
    );
    let cut = truth_exists(VertexSource::TestBeam).and(&slc_time_mc(TB_MC_BEAM_WINDOW));

    let mut loader = SpectrumLoader::new(source);
    let npng = loader.add_spectrum("npngPass", &axis, &cut)?;
    write_plots(loader, &[("npngPass", npng)], output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nx_core::MemorySource;

    #[test]
    fn preset_table_is_consistent() {
        for p in &PRESETS {
            assert_eq!(find(p.name), Some(p));
            let ext = Path::new(p.output).extension().and_then(|e| e.to_str());
            match p.kind {
                PresetKind::Export => assert_eq!(ext, Some("csv")),
                PresetKind::Plot => assert_eq!(ext, Some("json")),
            }
        }
        assert!(find("nope").is_none());
    }

    #[test]
    fn exporters_have_valid_layouts() {
        let src = || MemorySource::<crate::schema::SpillInfo, StandardRecord>::new("mem", vec![]);
        let fhc = exporter_lstm_ee_fd_fhc_nonswap(src(), "fhc.csv").unwrap();
        let rhc = exporter_lstm_ee_fd_rhc_nonswap(src(), "rhc.csv").unwrap();
        let nux = nux_exporter_lstm_ee_nd_nonswap(src(), "nux.csv").unwrap();

        let header = fhc.header();
        assert_eq!(header[0], "subrun");
        assert!(header.iter().any(|h| h == "trueTotMomZ_no_neutrons"));
        assert!(header.iter().any(|h| h == "SlcVisE"));
        assert!(header.iter().any(|h| h == "png.dir.z[19]"));
        assert_eq!(header.last().map(String::as_str), Some("weight"));

        assert!(!rhc.header().iter().any(|h| h == "trueLepMom"));
        assert!(nux.header().iter().any(|h| h == "Nus20Energy"));
        assert!(fhc.header().len() > rhc.header().len());
    }
}
