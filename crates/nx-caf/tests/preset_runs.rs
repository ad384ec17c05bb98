//! End-to-end runs of the compiled-in presets over JSON-lines spill files.

use std::io::Write;
use std::path::Path;

use approx::assert_relative_eq;
use nx_ana::HistogramFile;
use nx_caf::presets::{self, PresetOutcome};
use nx_caf::schema::{
    FourMomentum, FuzzyK, Prong, ProngTruth, Prong2D, Track, TrueNu, TrueParticle, Vec3, Vertex,
};
use nx_caf::{JsonlSource, SpillInfo, StandardRecord};
use nx_core::{Error, Spill};

fn write_spills(path: &Path, spills: &[Spill<SpillInfo, StandardRecord>]) {
    let mut f = std::fs::File::create(path).unwrap();
    for spill in spills {
        writeln!(f, "{}", serde_json::to_string(spill).unwrap()).unwrap();
    }
    writeln!(f).unwrap();
}

fn prong(cal_e: f64, dir_z: f64, truth_e: f64) -> Prong {
    Prong {
        cal_e,
        len: 40.0,
        nhit: 8,
        dir: Vec3 { x: 0.0, y: 0.0, z: dir_z },
        truth: ProngTruth { pdg: 2212, p: FourMomentum { e: truth_e, ..FourMomentum::default() } },
    }
}

fn selected_numu_cc() -> StandardRecord {
    let mut r = StandardRecord::default();
    r.hdr.subrun = 3;
    r.hdr.evt = 17;
    r.mc.nu.push(TrueNu {
        pdg: 14,
        iscc: true,
        e: 2.0,
        p: FourMomentum { e: 2.0, px: 0.0, py: 0.0, pz: 2.0 },
        prim: vec![
            TrueParticle { pdg: 13, p: FourMomentum { e: 1.5, px: 0.0, py: 0.3, pz: 1.4 } },
            TrueParticle { pdg: 2112, p: FourMomentum { e: 1.0, px: 0.1, py: 0.0, pz: 0.2 } },
        ],
        ..TrueNu::default()
    });
    r.slc.cal_e = 1.8;
    r.slc.nhit = 60;
    r.slc.ncontplanes = 12;
    r.sel.remid.pid = 0.9;
    r.sel.cvnloosepreselptp.numuid = 0.8;
    let c = &mut r.sel.contain;
    (c.kalfwdcell, c.kalbakcell, c.cosfwdcell, c.cosbakcell) = (20, 20, 20, 20);
    (c.planestofront, c.planestoback) = (10, 10);
    r.energy.numu.trkcc_e = 1.9;
    r.energy.numu.ana2018.e = 2.1;
    r.trk.kalman.tracks.push(Track { len: 450.0, nhit: 30 });
    r.vtx.elastic = Some(Vertex {
        vtx: Vec3 { x: 10.0, y: -20.0, z: 300.0 },
        fuzzyk: FuzzyK {
            png: vec![prong(0.7, 0.95, 900.0), prong(0.2, 0.3, 150.0)],
            png2d: vec![Prong2D { cal_e: 0.1, len: 12.0, nhit: 4, view: 1 }],
        },
    });
    r
}

#[test]
fn fhc_exporter_writes_selected_rows() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("fd.jsonl");
    let output = dir.path().join("out.csv");

    let mut nc = selected_numu_cc();
    nc.mc.nu[0].iscc = false;
    let mut no_vertex = selected_numu_cc();
    no_vertex.vtx.elastic = None;

    let mc = SpillInfo { spillpot: 4.0e13, ismc: true, ..SpillInfo::default() };
    let bad_data = SpillInfo { spillpot: 1.0e13, ..SpillInfo::default() };
    write_spills(
        &input,
        &[
            Spill::new(mc, vec![selected_numu_cc(), nc, no_vertex]),
            Spill::new(bad_data, vec![selected_numu_cc()]),
        ],
    );

    let source = JsonlSource::open(input.to_str().unwrap()).unwrap();
    let outcome = presets::find("exporter_lstm_ee_fd_fhc_nonswap")
        .unwrap()
        .run(source, &output)
        .unwrap();
    let summary = outcome.summary();
    assert_eq!(summary.spills_seen, 2);
    assert_eq!(summary.spills_passed, 1);
    assert_eq!(summary.events_seen, 3);
    assert_eq!(summary.events_passed, 1);
    assert_eq!(summary.events_failed, 1);
    assert_eq!(summary.events_rejected(), 1);
    assert_relative_eq!(summary.pot, 4.0e13);

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 1);
    let col = |name: &str| {
        let i = header.iter().position(|h| h == name).unwrap_or_else(|| panic!("no column {name}"));
        rows[0][i].to_string()
    };

    assert_eq!(header.first().map(String::as_str), Some("subrun"));
    assert_eq!(header.last().map(String::as_str), Some("weight"));
    assert_eq!(col("subrun"), "3.000000");
    assert_eq!(col("event"), "17.000000");
    assert_eq!(col("trueE"), "2.000000");
    assert_eq!(col("trueLepE"), "1.500000");
    assert_eq!(col("trueHadE"), "0.500000");
    assert_eq!(col("numuRecoE"), "2.100000");
    assert_eq!(col("SlcVisE"), "1.800000");
    assert_eq!(col("trkLen"), "4.500000");
    assert_eq!(col("trueTotMomX_all"), "0.100000");
    assert_eq!(col("trueTotMomX_no_neutrons"), "0.000000");
    assert_eq!(col("png.calE[0]"), "0.700000");
    assert_eq!(col("png.calE[1]"), "0.200000");
    assert!(col("png.calE[2]").parse::<f64>().unwrap().is_nan());
    assert_eq!(col("png2d.view[0]"), "1.000000");
    assert_eq!(col("weight"), "1.000000");
}

#[test]
fn tb_plots_counts_forward_prongs() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tb.jsonl");
    let output = dir.path().join("tb.json");

    let tb_record = |png: Vec<Prong>, meantime: f64| {
        let mut r = StandardRecord::default();
        r.slc.meantime = meantime;
        r.vtx.tbvtx.push(Vertex { fuzzyk: FuzzyK { png, png2d: vec![] }, ..Vertex::default() });
        r
    };
    let records = vec![
        tb_record(vec![prong(1.0, 0.99, 300.0), prong(1.0, 0.97, 200.0)], 84_100.0),
        tb_record(vec![prong(1.0, 0.99, 300.0), prong(1.0, 0.1, 200.0)], 84_100.0),
        tb_record(vec![prong(1.0, 0.99, 300.0)], 90_000.0),
        tb_record(vec![prong(1.0, 0.99, 0.0)], 84_100.0),
    ];
    let mut no_vertex = StandardRecord::default();
    no_vertex.slc.meantime = 84_100.0;
    let mut with_missing = records;
    with_missing.push(no_vertex);

    let info = SpillInfo { spillpot: 2.0e13, ismc: true, ..SpillInfo::default() };
    write_spills(&input, &[Spill::new(info, with_missing)]);

    let source = JsonlSource::open(input.to_str().unwrap()).unwrap();
    let outcome = presets::tb_plots(source, &output).unwrap();
    let PresetOutcome::Plot { summary, histograms } = outcome else {
        panic!("tb_plots produced an export outcome");
    };
    assert_eq!(summary.events_seen, 5);
    assert_eq!(summary.events_passed, 2);
    assert_eq!(summary.events_failed, 1);

    let saved = HistogramFile::load(&output).unwrap();
    assert_eq!(saved, histograms);
    let h = saved.get_1d("npngPass").unwrap();
    assert_eq!(h.title, "Num. 3D prongs passing cuts");
    assert_eq!(h.bin_content.len(), 10);
    assert_relative_eq!(h.bin_content[1], 1.0);
    assert_relative_eq!(h.bin_content[2], 1.0);
    assert_relative_eq!(h.integral(), 2.0);
    assert_relative_eq!(h.pot, 2.0e13);
}

#[test]
fn kinematic_plots_without_exposure_are_written_raw() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("nd.jsonl");
    let output = dir.path().join("plots.json");

    let mut r = selected_numu_cc();
    r.slc.meantime = 220_000.0;
    let info = SpillInfo { ismc: true, ..SpillInfo::default() };
    write_spills(&input, &[Spill::new(info, vec![r.clone(), r])]);

    let source = JsonlSource::open(input.to_str().unwrap()).unwrap();
    presets::new_kin_vars_plots(source, &output).unwrap();

    let saved = HistogramFile::load(&output).unwrap();
    for key in ["hist_kNuEnergyLSTM", "hist_kNuEnergyLSTM1"] {
        let h = saved.get_1d(key).unwrap();
        assert_eq!(h.title, "LSTM Neutrino Energy (GeV)");
        assert_eq!(h.bin_content.len(), 100);
        assert_relative_eq!(h.integral(), 2.0);
    }
}

#[test]
fn dataset_definitions_are_not_resolved_locally() {
    for preset in &nx_caf::PRESETS {
        if preset.dataset.starts_with(nx_caf::reader::DATASET_DEF_PREFIX) {
            let err = JsonlSource::open(preset.dataset).unwrap_err();
            assert!(matches!(err, Error::Resource(_)), "{err}");
        }
    }
}
