//! # Hammertrace
//!
//! Hammertrace prepares memory access traces for a cycle-accurate DRAM
//! simulator by modelling a Rowhammer mitigation in the trace itself: every
//! access judged to be an aggressor is followed by activations of its two
//! neighbor rows.
//!
//! ## Quickstart
//!
//! ```sh
//! cargo run --release --bin=hammertrace -- config/ddr4-8gb-x8.json -t sample_trace -r CRA
//! ```
//!
//! writes `sample_trace_CRA_applied` next to the input and prints its path.
//!
//! ## Crates
//!
//! - `hammertrace-core`: address mapping, trace I/O, the [`Pipeline`] and the
//!   [`AggressorDetector`] trait, re-exported here.
//! - `hammertrace-pra`: probabilistic row activation ([`Pra`]).
//! - `hammertrace-cra`: counter-based row activation ([`Cra`]).
//!
//! [`MitigationScheme`] selects one of them at run time.

pub use hammertrace_core::*;
pub use hammertrace_cra::Cra;
pub use hammertrace_pra::Pra;

use hammertrace_core::detector::AggressorDetector;
use hammertrace_core::memory::DramGeometry;
use hammertrace_core::util::{DEFAULT_CRA_THRESHOLD, DEFAULT_PRA_PROBABILITY, Rng};
use indicatif::MultiProgress;
use log::info;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while selecting and running a mitigation scheme.
#[derive(Debug, Error)]
pub enum Error {
    /// The scheme name is not one of `X`, `PRA` or `CRA`.
    #[error("Undefined Rowhammer mitigation scheme {0:?}")]
    UnknownScheme(String),
    /// The probabilistic detector could not be built.
    #[error(transparent)]
    Pra(#[from] hammertrace_pra::Error),
    /// The counting detector could not be built.
    #[error(transparent)]
    Cra(#[from] hammertrace_cra::Error),
    /// The trace could not be processed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Rowhammer mitigation applied to a trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MitigationScheme {
    /// No mitigation, the trace is used as is
    Disabled,
    /// Probabilistic row activation
    Probabilistic {
        /// Trigger probability per access
        probability: f64,
        /// Seed of the random number generator
        seed: u64,
    },
    /// Counter-based row activation
    Counting {
        /// Accesses per row between two triggers
        threshold: u32,
    },
}

impl MitigationScheme {
    /// Probabilistic scheme with the default probability.
    pub fn probabilistic(seed: u64) -> Self {
        MitigationScheme::Probabilistic {
            probability: DEFAULT_PRA_PROBABILITY,
            seed,
        }
    }

    /// Counting scheme with the default threshold.
    pub fn counting() -> Self {
        MitigationScheme::Counting {
            threshold: DEFAULT_CRA_THRESHOLD,
        }
    }

    /// Builds the detector for this scheme, or `None` if mitigation is disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheme parameters are invalid.
    pub fn detector(
        &self,
        geometry: &DramGeometry,
    ) -> Result<Option<Box<dyn AggressorDetector>>, Error> {
        let detector: Box<dyn AggressorDetector> = match *self {
            MitigationScheme::Disabled => return Ok(None),
            MitigationScheme::Probabilistic { probability, seed } => {
                Box::new(Pra::new(probability, Rng::from_seed(seed))?)
            }
            MitigationScheme::Counting { threshold } => Box::new(Cra::new(geometry, threshold)?),
        };
        Ok(Some(detector))
    }
}

/// Parses the scheme names `X`, `PRA` and `CRA` with default parameters.
///
/// `PRA` is seeded with a random seed.
impl FromStr for MitigationScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" => Ok(MitigationScheme::Disabled),
            "PRA" => Ok(MitigationScheme::probabilistic(rand::random())),
            "CRA" => Ok(MitigationScheme::counting()),
            _ => Err(Error::UnknownScheme(s.to_string())),
        }
    }
}

impl Display for MitigationScheme {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            MitigationScheme::Disabled => write!(f, "X"),
            MitigationScheme::Probabilistic { probability, seed } => {
                write!(f, "PRA (p = {}, seed = 0x{:x})", probability, seed)
            }
            MitigationScheme::Counting { threshold } => write!(f, "CRA (threshold = {})", threshold),
        }
    }
}

/// Outcome of [`apply_mitigation`].
#[derive(Debug)]
pub struct Mitigated {
    /// Trace to hand to the DRAM simulator
    pub trace: PathBuf,
    /// Pass report, `None` if mitigation is disabled
    pub report: Option<PipelineReport>,
}

/// Applies `scheme` to the trace file at `trace`.
///
/// With [`MitigationScheme::Disabled`] the input trace is returned unchanged.
/// Otherwise the augmented trace is written to [`applied_trace_path`].
///
/// # Errors
///
/// Returns an error if the detector cannot be built or the trace cannot be processed.
pub fn apply_mitigation(
    geometry: &DramGeometry,
    trace: &Path,
    scheme: MitigationScheme,
    progress: Option<MultiProgress>,
) -> Result<Mitigated, Error> {
    let Some(detector) = scheme.detector(geometry)? else {
        info!("Rowhammer mitigation disabled");
        return Ok(Mitigated {
            trace: trace.to_path_buf(),
            report: None,
        });
    };
    info!("Applying {} with address mapping {}", scheme, geometry.mapping);
    let mut pipeline = Pipeline::new(*geometry, detector);
    if let Some(progress) = progress {
        pipeline = pipeline.with_progress(progress);
    }
    let (trace, report) = pipeline.convert_trace(trace)?;
    Ok(Mitigated {
        trace,
        report: Some(report),
    })
}

#[cfg(test)]
mod tests {
    use super::{Error, MitigationScheme};
    use hammertrace_core::util::{DEFAULT_CRA_THRESHOLD, DEFAULT_PRA_PROBABILITY};

    #[test]
    fn test_parse_scheme() {
        assert_eq!(
            "X".parse::<MitigationScheme>().ok(),
            Some(MitigationScheme::Disabled)
        );
        assert_eq!(
            "CRA".parse::<MitigationScheme>().ok(),
            Some(MitigationScheme::Counting {
                threshold: DEFAULT_CRA_THRESHOLD
            })
        );
        assert!(matches!(
            "PRA".parse::<MitigationScheme>(),
            Ok(MitigationScheme::Probabilistic { probability, .. }) if probability == DEFAULT_PRA_PROBABILITY
        ));
        assert!(matches!(
            "TRR".parse::<MitigationScheme>(),
            Err(Error::UnknownScheme(s)) if s == "TRR"
        ));
    }
}
