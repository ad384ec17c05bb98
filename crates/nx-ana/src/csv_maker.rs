//! Tabular export: one CSV row per selected event.

use std::path::{Path, PathBuf};

use nx_core::{Error, Result, RunSummary, SpillSource};

use crate::cut::Cut;
use crate::event_loop::{self, EventOutcome, FailurePolicy};
use crate::multi::{Expansion, MultiVar, MultiVarRegistry};
use crate::registry::{VarRegistry, check_unique};
use crate::var::Var;
use crate::weight::Weight;

/// Name of the weight column unless overridden.
pub const DEFAULT_WEIGHT_COLUMN: &str = "weight";

/// Digits after the decimal point unless overridden.
pub const DEFAULT_PRECISION: usize = 6;

/// Writes the variables of every event that passes the cuts to a CSV file.
///
/// Column order is: scalar variables in declaration order, then each
/// multi-variable expanded to `name[0] .. name[cap-1]`, then the weight.
///
/// ```ignore
/// let mut maker = CsvMaker::new(source, "out.csv");
/// maker.add_vars(slice_var_defs())?;
/// maker.set_cut(numu_cc).set_weight(flux);
/// let summary = maker.go()?;
/// ```
pub struct CsvMaker<Src: SpillSource> {
    source: Src,
    output: PathBuf,
    vars: VarRegistry<Src::Record>,
    multi_vars: MultiVarRegistry<Src::Record>,
    cut: Cut<Src::Record>,
    spill_cut: Cut<Src::Info>,
    weight: Weight<Src::Record>,
    weight_column: String,
    precision: usize,
    expansion: Expansion,
    policy: FailurePolicy,
}

impl<Src> CsvMaker<Src>
where
    Src: SpillSource,
    Src::Info: 'static,
    Src::Record: 'static,
{
    /// Exporter from `source` to the CSV file at `output`.
    pub fn new(source: Src, output: impl Into<PathBuf>) -> Self {
        Self {
            source,
            output: output.into(),
            vars: VarRegistry::new(),
            multi_vars: MultiVarRegistry::new(),
            cut: Cut::pass_all(),
            spill_cut: Cut::pass_all(),
            weight: Weight::unit(),
            weight_column: DEFAULT_WEIGHT_COLUMN.to_string(),
            precision: DEFAULT_PRECISION,
            expansion: Expansion::default(),
            policy: FailurePolicy::default(),
        }
    }

    /// Output path.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Add one scalar column.
    pub fn add_var(&mut self, name: impl Into<String>, var: Var<Src::Record>) -> Result<()> {
        self.vars.register(name, var)
    }

    /// Add scalar columns; all or nothing.
    pub fn add_vars<I, N>(&mut self, defs: I) -> Result<()>
    where
        I: IntoIterator<Item = (N, Var<Src::Record>)>,
        N: Into<String>,
    {
        self.vars.register_all(defs)
    }

    /// Add one multi-variable.
    pub fn add_multi_var(
        &mut self,
        name: impl Into<String>,
        var: MultiVar<Src::Record>,
    ) -> Result<()> {
        self.multi_vars.register(name, var)
    }

    /// Add multi-variables; all or nothing.
    pub fn add_multi_vars<I, N>(&mut self, defs: I) -> Result<()>
    where
        I: IntoIterator<Item = (N, MultiVar<Src::Record>)>,
        N: Into<String>,
    {
        self.multi_vars.register_all(defs)
    }

    /// Event selection.
    pub fn set_cut(&mut self, cut: Cut<Src::Record>) -> &mut Self {
        self.cut = cut;
        self
    }

    /// Spill selection; rejected spills contribute no rows and no exposure.
    pub fn set_spill_cut(&mut self, cut: Cut<Src::Info>) -> &mut Self {
        self.spill_cut = cut;
        self
    }

    /// Per-event weight written in the last column.
    pub fn set_weight(&mut self, weight: Weight<Src::Record>) -> &mut Self {
        self.weight = weight;
        self
    }

    /// Header of the weight column.
    pub fn set_weight_column(&mut self, name: impl Into<String>) -> &mut Self {
        self.weight_column = name.into();
        self
    }

    /// Digits after the decimal point.
    pub fn set_precision(&mut self, digits: usize) -> &mut Self {
        self.precision = digits;
        self
    }

    /// How multi-variables map onto columns.
    pub fn set_expansion(&mut self, expansion: Expansion) -> &mut Self {
        self.expansion = expansion;
        self
    }

    /// Behaviour on per-event evaluation errors.
    pub fn set_failure_policy(&mut self, policy: FailurePolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    /// Header row in output order.
    pub fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = self.vars.names().map(str::to_string).collect();
        header.extend(self.multi_vars.column_names(&self.expansion));
        header.push(self.weight_column.clone());
        header
    }

    /// Check the configuration without touching the filesystem.
    pub fn validate(&self) -> Result<()> {
        if self.output.as_os_str().is_empty() {
            return Err(Error::Configuration("empty output path".into()));
        }
        if !self.multi_vars.is_empty() && self.expansion.cap() == 0 {
            return Err(Error::Configuration("multi-variables need a column cap above 0".into()));
        }
        let header = self.header();
        check_unique(header.iter().map(String::as_str))
    }

    /// Run the export. The output file only appears once every row is written.
    pub fn go(self) -> Result<RunSummary> {
        self.validate()?;
        let header = self.header();
        let Self {
            mut source,
            output,
            vars,
            multi_vars,
            cut,
            spill_cut,
            weight,
            precision,
            expansion,
            policy,
            ..
        } = self;

        log::info!(
            "exporting {} column(s) from {} to {}",
            header.len(),
            source.describe(),
            output.display()
        );

        let dir = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
            Error::Resource(format!("cannot create output in {}: {e}", dir.display()))
        })?;
        let mut writer = csv::Writer::from_writer(tmp);
        writer.write_record(&header)?;

        let mut row: Vec<f64> = Vec::with_capacity(header.len());
        let summary = event_loop::run(&mut source, &spill_cut, policy, |record| {
            if !cut.pass(record)? {
                return Ok(EventOutcome::Rejected);
            }
            row.clear();
            vars.evaluate_into(record, &mut row)?;
            multi_vars.evaluate_expanded_into(record, &expansion, &mut row)?;
            row.push(weight.weight(record)?);
            writer.write_record(row.iter().map(|v| format!("{v:.precision$}")))?;
            Ok(EventOutcome::Passed)
        })?;

        let tmp = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        tmp.persist(&output).map_err(|e| {
            Error::Resource(format!("cannot write {}: {}", output.display(), e.error))
        })?;
        log::info!(
            "wrote {} row(s) to {} ({} event(s) seen, POT {:.4e})",
            summary.events_passed,
            output.display(),
            summary.events_seen,
            summary.pot
        );
        Ok(summary)
    }
}
