use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use hammertrace::generator::{HammerPlan, HammerTraceGenerator};
use hammertrace::memory::{DRAMAddr, DramGeometry};
use hammertrace::util::Rng;
use hammertrace::DramConfig;
use hammertrace_bin::init_logging_with_progress;
use log::info;
use serde::Serialize;

/// Generates a double-sided Rowhammer trace for a DRAM configuration.
///
/// The trace alternates between an aggressor row adjacent to a random victim
/// and a second row of the same bank that keeps the aggressor's row buffer closed.
#[derive(Debug, Parser, Serialize, Clone)]
struct CliArgs {
    /// The DRAM configuration file (JSON).
    config: PathBuf,
    /// Total number of requests.
    #[clap(long = "num-reqs", short = 'n', default_value = "10000000")]
    num_reqs: u64,
    /// Inter-arrival time in cycles. Defaults to tRC + 2 (tRAS + tRP + 2) from the
    /// configuration's timing section to avoid row buffer hits.
    #[clap(long = "interarrival", short = 'i')]
    interarrival: Option<u64>,
    /// Output directory.
    #[clap(long = "output-dir", short = 'o', default_value = ".")]
    output_dir: PathBuf,
    /// Seed for victim and breaker selection (random if omitted).
    #[clap(long = "seed")]
    seed: Option<u64>,
    /// Also write the chosen rows to this file (JSON).
    #[clap(long = "plan")]
    plan: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct GeneratedTrace {
    args: CliArgs,
    seed: u64,
    interarrival: u64,
    trace: PathBuf,
    plan: HammerPlan,
}

fn describe(name: &str, addr: &DRAMAddr, geometry: &DramGeometry) -> Result<()> {
    info!("{:<10} {} hex addr: 0x{:x}", name, addr, addr.to_linear(geometry)?);
    Ok(())
}

fn main() -> Result<()> {
    init_logging_with_progress()?;
    let args = CliArgs::parse();
    if args.num_reqs == 0 {
        bail!("The number of requests must be positive");
    }
    if !args.output_dir.is_dir() {
        bail!("Output directory {} does not exist", args.output_dir.display());
    }

    let config = DramConfig::from_jsonfile(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let geometry = DramGeometry::from_config(&config).context("Invalid DRAM configuration")?;
    let interarrival = match args.interarrival {
        Some(cycles) => cycles,
        None => config
            .interarrival_time()
            .context("Pass --interarrival or add tRAS and tRP to the configuration")?,
    };
    if interarrival == 0 {
        bail!("The inter-arrival time must be positive");
    }
    info!(
        "Config: {} #requests: {} inter-arrival time: {}",
        args.config.display(),
        args.num_reqs,
        interarrival
    );

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut generator = HammerTraceGenerator::new(&geometry, Rng::from_seed(seed));
    let plan = generator.plan()?;
    describe("Victim:", &plan.victim, &geometry)?;
    describe("Aggressor:", &plan.aggressor, &geometry)?;
    describe("Breaker:", &plan.breaker, &geometry)?;

    let config_name = args
        .config
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config".to_string());
    let trace = args.output_dir.join(format!("trace_{config_name}"));
    info!("Write to file: {} (no extension)", trace.display());
    let out = BufWriter::new(File::create(&trace)?);
    generator.write_trace(&plan, args.num_reqs, interarrival, out)?;

    if let Some(path) = &args.plan {
        let mut writer = BufWriter::new(File::create(path)?);
        let summary = GeneratedTrace {
            args: args.clone(),
            seed,
            interarrival,
            trace: trace.clone(),
            plan,
        };
        serde_json::to_writer_pretty(&mut writer, &summary)?;
        writer.flush()?;
        info!("Plan saved to {}", path.display());
    }
    println!("{}", trace.display());
    Ok(())
}
