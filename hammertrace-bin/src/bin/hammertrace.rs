use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use hammertrace::memory::DramGeometry;
use hammertrace::util::{DEFAULT_CRA_THRESHOLD, DEFAULT_PRA_PROBABILITY};
use hammertrace::{DramConfig, MitigationScheme, apply_mitigation};
use hammertrace_bin::init_logging_with_progress;
use log::info;

/// Rowhammer protection schemes selectable on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scheme {
    /// Not applied
    #[value(name = "X")]
    X,
    /// Probabilistic Row Activation
    #[value(name = "PRA")]
    Pra,
    /// Counter-based Row Activation
    #[value(name = "CRA")]
    Cra,
}

/// Applies a Rowhammer mitigation to a memory trace.
///
/// The augmented trace is written next to the input as `<trace>_<SCHEME>_applied`;
/// its path is printed on stdout for the DRAM simulator.
#[derive(Debug, Parser)]
#[command(
    after_help = "Example:\n  hammertrace config/ddr4-8gb-x8.json -t sample_trace -r CRA"
)]
struct CliArgs {
    /// The DRAM configuration file (JSON).
    config: PathBuf,
    /// The input trace file.
    #[clap(long = "trace", short = 't')]
    trace: PathBuf,
    /// Rowhammer protection scheme.
    #[clap(long = "rowhammer", short = 'r', value_enum, default_value = "X")]
    rowhammer: Scheme,
    /// Trigger probability for PRA.
    #[clap(long = "probability", default_value_t = DEFAULT_PRA_PROBABILITY)]
    probability: f64,
    /// Per-row activation threshold for CRA.
    #[clap(long = "threshold", default_value_t = DEFAULT_CRA_THRESHOLD)]
    threshold: u32,
    /// Seed for PRA (random if omitted).
    #[clap(long = "seed")]
    seed: Option<u64>,
    /// Write the pass report to this file (JSON).
    #[clap(long = "report")]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    let progress = init_logging_with_progress()?;
    let args = CliArgs::parse();

    let config = DramConfig::from_jsonfile(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let geometry = DramGeometry::from_config(&config).context("Invalid DRAM configuration")?;
    info!(
        "DRAM: {} channels, {} ranks, {} bank groups, {} banks, {} rows, {} columns",
        geometry.channels,
        geometry.ranks,
        geometry.bankgroups,
        geometry.banks,
        geometry.rows,
        geometry.columns
    );

    let scheme = match args.rowhammer {
        Scheme::X => MitigationScheme::Disabled,
        Scheme::Pra => MitigationScheme::Probabilistic {
            probability: args.probability,
            seed: args.seed.unwrap_or_else(rand::random),
        },
        Scheme::Cra => MitigationScheme::Counting {
            threshold: args.threshold,
        },
    };

    let mitigated = apply_mitigation(&geometry, &args.trace, scheme, Some(progress))?;
    if let (Some(path), Some(report)) = (&args.report, &mitigated.report) {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, report)?;
        writer.flush()?;
        info!("Report saved to {}", path.display());
    }
    println!("{}", mitigated.trace.display());
    Ok(())
}
