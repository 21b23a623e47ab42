//! Probabilistic row activation (PRA).
//!
//! Every access independently triggers a neighbor row activation with a fixed
//! probability `p`. The policy keeps no per-row history, so triggers do not
//! depend on which rows the trace touches.
//!
//! Implements the [`hammertrace_core::detector::AggressorDetector`] trait.
//!
//! # References
//!
//! Kim et al., "Flipping Bits in Memory Without Accessing Them: An Experimental
//! Study of DRAM Disturbance Errors", ISCA 2014.

#![warn(missing_docs)]

mod pra;

pub use pra::{Error, Pra};
