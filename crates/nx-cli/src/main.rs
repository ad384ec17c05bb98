//! NuExport CLI

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use nx_caf::{JsonlSource, PRESETS, Preset, PresetKind, PresetOutcome};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nuexport")]
#[command(about = "NuExport - CSV and histogram export of neutrino event records")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the CSV rows of an export preset
    Export {
        /// Preset name (see `nuexport list`)
        preset: String,

        /// Spill file or directory. Defaults to the preset's dataset.
        #[arg(short, long)]
        input: Option<String>,

        /// Output CSV. Defaults to the preset's output file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fill and save the histograms of a plot preset
    Plot {
        /// Preset name (see `nuexport list`)
        preset: String,

        /// Spill file or directory. Defaults to the preset's dataset.
        #[arg(short, long)]
        input: Option<String>,

        /// Output JSON container. Defaults to the preset's output file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List compiled-in presets
    List,

    /// Print version
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Export { preset, input, output } => {
            cmd_run(&preset, PresetKind::Export, input.as_deref(), output)
        }
        Commands::Plot { preset, input, output } => {
            cmd_run(&preset, PresetKind::Plot, input.as_deref(), output)
        }
        Commands::List => cmd_list(),
        Commands::Version => {
            println!("nuexport {}", nx_core::VERSION);
            Ok(())
        }
    }
}

fn lookup(name: &str, kind: PresetKind) -> Result<&'static Preset> {
    let Some(preset) = nx_caf::presets::find(name) else {
        bail!("unknown preset '{name}' (see `nuexport list`)");
    };
    if preset.kind != kind {
        bail!("preset '{name}' is run with `nuexport {}`", preset.kind.as_str());
    }
    Ok(preset)
}

fn cmd_run(
    name: &str,
    kind: PresetKind,
    input: Option<&str>,
    output: Option<PathBuf>,
) -> Result<()> {
    let preset = lookup(name, kind)?;
    let input = input.unwrap_or(preset.dataset);
    let output = output.unwrap_or_else(|| PathBuf::from(preset.output));

    tracing::info!(preset = preset.name, input, "opening data source");
    let source = JsonlSource::open(input)?;
    let outcome = preset.run(source, &output)?;
    let summary = outcome.summary();
    tracing::info!(
        passed = summary.events_passed,
        failed = summary.events_failed,
        pot = summary.pot,
        "run complete"
    );

    let mut report = serde_json::json!({
        "preset": preset.name,
        "output": output.display().to_string(),
        "summary": summary,
    });
    if let PresetOutcome::Plot { histograms, .. } = &outcome {
        report["histograms"] = histograms.histograms.keys().cloned().collect();
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_list() -> Result<()> {
    for p in &PRESETS {
        println!("{:<34} {:<7} {} -> {}", p.name, p.kind.as_str(), p.description, p.output);
    }
    Ok(())
}
