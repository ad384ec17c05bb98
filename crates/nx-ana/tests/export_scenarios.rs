//! End-to-end exports over synthetic in-memory sources.

use std::path::Path;

use approx::assert_relative_eq;
use nx_ana::{
    Binning, CsvMaker, Cut, Expansion, HistAxis, HistogramFile, MultiVar, SpectrumLoader, Var,
    VarRegistry, Weight,
};
use nx_core::{Error, FieldError, MemorySource, Spill};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Event {
    energy: f64,
    momenta: Vec<f64>,
    lepton: Option<f64>,
}

fn event(energy: f64) -> Event {
    Event { energy, momenta: vec![], lepton: Some(energy / 2.0) }
}

fn energy() -> Var<Event> {
    Var::simple(|r: &Event| r.energy)
}

fn lepton() -> Var<Event> {
    Var::new(|r: &Event| r.lepton.ok_or(FieldError::Missing("lepton")))
}

fn momenta() -> MultiVar<Event> {
    MultiVar::new(|r: &Event| Ok(r.momenta.clone()))
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(false).from_path(path).unwrap();
    rdr.records().map(|r| r.unwrap().iter().map(str::to_string).collect()).collect()
}

#[test]
fn positive_energy_rows_in_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("energy.csv");
    let events = [-1.0, 0.0, 5.0, 10.0].map(event).to_vec();
    let mut maker = CsvMaker::new(MemorySource::single_spill("synthetic", 1e20, events), &out);
    maker.add_var("E", energy()).unwrap();
    maker.set_cut(energy().greater_than(0.0)).set_precision(0);
    let summary = maker.go().unwrap();

    let rows = read_rows(&out);
    assert_eq!(rows, vec![vec!["E", "weight"], vec!["5", "1"], vec!["10", "1"]]);
    assert_eq!(summary.events_seen, 4);
    assert_eq!(summary.events_passed, 2);
    assert_eq!(summary.events_rejected(), 2);
}

#[test]
fn pad_to_width_five() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("momenta.csv");
    let ev = Event { energy: 1.0, momenta: vec![1.0, 2.0, 3.0], lepton: None };
    let mut maker = CsvMaker::new(MemorySource::single_spill("synthetic", 1.0, vec![ev]), &out);
    maker.add_multi_var("p", momenta()).unwrap();
    maker.set_expansion(Expansion::Pad { cap: 5, fill: f64::NAN });
    maker.go().unwrap();

    let rows = read_rows(&out);
    assert_eq!(rows[0], vec!["p[0]", "p[1]", "p[2]", "p[3]", "p[4]", "weight"]);
    let values: Vec<f64> = rows[1][..5].iter().map(|s| s.parse().unwrap()).collect();
    assert_eq!(&values[..3], &[1.0, 2.0, 3.0]);
    assert!(values[3].is_nan() && values[4].is_nan());
}

#[test]
fn duplicate_name_fails_before_any_record() {
    let mut reg = VarRegistry::new();
    reg.register("E", energy()).unwrap();
    assert!(matches!(reg.register("E", energy()), Err(Error::Configuration(_))));

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("dup.csv");
    let touched = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = touched.clone();
    let counting = Var::new(move |r: &Event| {
        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(r.energy)
    });
    let mut maker = CsvMaker::new(MemorySource::single_spill("s", 1.0, vec![event(1.0)]), &out);
    maker.add_var("E", counting).unwrap();
    maker.add_multi_var("E", momenta()).unwrap();
    maker.set_expansion(Expansion::Truncate { cap: 1 });
    maker.add_var("E[0]", energy()).unwrap();
    assert!(matches!(maker.go(), Err(Error::Configuration(_))));
    assert_eq!(touched.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert!(!out.exists());
}

#[test]
fn round_trip_matches_hand_computation() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("round_trip.csv");
    let spills = vec![
        Spill::new(1e20, vec![event(1.0), event(3.0), Event { lepton: None, ..event(4.0) }]),
        Spill::new(2e20, vec![event(6.0), event(8.0)]),
    ];
    let selection = energy().greater_than(2.0).and(&energy().less_than(7.0));
    let had = energy().sub(&lepton());
    let w = Weight::new("half", |r: &Event| Ok(r.energy * 0.5));

    let mut maker = CsvMaker::new(MemorySource::new("synthetic", spills.clone()), &out);
    maker.add_vars(vec![("E", energy()), ("lepE", lepton()), ("hadE", had)]).unwrap();
    maker.set_cut(selection.clone()).set_weight(w).set_precision(3);
    let summary = maker.go().unwrap();

    let expected: Vec<Vec<String>> = spills
        .iter()
        .flat_map(|s| s.records.iter())
        .filter(|r| r.energy > 2.0 && r.energy < 7.0)
        .filter_map(|r| {
            let lep = r.lepton?;
            Some(
                [r.energy, lep, r.energy - lep, r.energy * 0.5]
                    .iter()
                    .map(|v| format!("{v:.3}"))
                    .collect(),
            )
        })
        .collect();
    let rows = read_rows(&out);
    assert_eq!(rows[1..], expected[..]);
    assert_eq!(summary.events_passed, 2);
    assert_eq!(summary.events_failed, 1);
    assert_relative_eq!(summary.pot, 3e20);
}

#[test]
fn spectra_saved_and_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let spills = vec![
        Spill::new(1e20, vec![event(0.5), event(1.5)]),
        Spill::new(3e20, vec![event(1.5), event(9.0)]),
    ];
    let mut loader = SpectrumLoader::new(MemorySource::new("synthetic", spills));
    let axis = HistAxis::new("E (GeV)", Binning::simple(4, 0.0, 4.0), energy());
    let id = loader.add_spectrum("E", &axis, &Cut::pass_all()).unwrap();
    let spectra = loader.go().unwrap();

    let spectrum = spectra.get(id).unwrap();
    assert_relative_eq!(spectrum.pot(), 4e20);
    let h = spectrum.to_hist(2e20).unwrap();
    assert_relative_eq!(h.bin_content[0], 0.5);
    assert_relative_eq!(h.bin_content[1], 1.0);
    assert_relative_eq!(h.overflow, 0.5);

    let mut file = HistogramFile::new();
    file.write_1d("E", h.clone()).unwrap();
    let path = dir.path().join("plots.json");
    file.save(&path).unwrap();
    assert_eq!(HistogramFile::load(&path).unwrap().get_1d("E"), Some(&h));
}

proptest! {
    #[test]
    fn evaluate_width_is_fixed(
        energies in prop::collection::vec(-10.0f64..10.0, 0..20),
        lep in prop::option::of(0.0f64..5.0),
    ) {
        let mut reg = VarRegistry::new();
        reg.register("E", energy()).unwrap();
        reg.register("lepE", lepton()).unwrap();
        reg.register("sum", Var::simple(|r: &Event| r.momenta.iter().sum())).unwrap();
        for e in energies {
            let ev = Event { energy: e, momenta: vec![e, 1.0], lepton: lep };
            match reg.evaluate(&ev) {
                Ok(row) => {
                    prop_assert_eq!(row.len(), reg.len());
                    let names: Vec<&str> = row.iter().map(|(n, _)| *n).collect();
                    prop_assert_eq!(names, vec!["E", "lepE", "sum"]);
                }
                Err(err) => {
                    prop_assert!(lep.is_none());
                    let is_extraction = matches!(err, Error::Extraction { .. });
                    prop_assert!(is_extraction);
                }
            }
        }
    }

    #[test]
    fn double_negation_is_identity(threshold in -5.0f64..5.0, e in -10.0f64..10.0) {
        let p = energy().greater_than(threshold);
        let ev = event(e);
        prop_assert_eq!(p.not().not().pass(&ev).unwrap(), p.pass(&ev).unwrap());
    }
}
