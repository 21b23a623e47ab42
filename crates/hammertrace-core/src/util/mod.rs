//! Utility functions and types used throughout Hammertrace.
//!
//! This module provides:
//! - Constants shared by the detectors and the pipeline ([`NEIGHBOR_ACTIVATION`], defaults)
//! - Progress reporting utilities ([`NamedProgress`])
//! - Random number generation ([`Rng`])

mod constants;
mod named_progress;
mod rng;

pub use self::constants::*;
pub use self::named_progress::NamedProgress;
pub use self::rng::Rng;
