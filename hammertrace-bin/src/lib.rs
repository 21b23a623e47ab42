//! # Hammertrace command line tools
//!
//! - `hammertrace`: applies a Rowhammer mitigation scheme to a trace and prints
//!   the path of the trace to simulate.
//! - `trace_gen`: writes a synthetic double-sided Rowhammer trace for a DRAM
//!   configuration.
//!
//! Both read the DRAM configuration from a JSON file (see `config/`).

use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

/// Initializes `env_logger` (default level `info`) routed through a progress bar container.
pub fn init_logging_with_progress() -> anyhow::Result<MultiProgress> {
    let logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).build();
    let level = logger.filter();
    let progress = MultiProgress::new();
    LogWrapper::new(progress.clone(), logger).try_init()?;
    log::set_max_level(level);
    Ok(progress)
}
