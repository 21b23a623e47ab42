//! # Hammertrace Core
//!
//! `hammertrace-core` is the foundational library of Hammertrace, the Rowhammer
//! mitigation stage in front of a cycle-accurate DRAM simulator. It rewrites
//! memory access traces, inserting neighbor row activations wherever a
//! detection policy judges an access to be a Rowhammer aggressor.
//!
//! ## Architecture Overview
//!
//! - [`memory`] - Translates linear addresses into [`memory::DRAMAddr`] and back,
//!   following one of the supported [`memory::AddressMapping`] field orderings.
//!
//! - [`detector::AggressorDetector`] - Defines the interface of detection policies.
//!   Implementations live in the `hammertrace-pra` and `hammertrace-cra` crates.
//!
//! - [`MitigationInjector`] - Synthesizes activations of the rows adjacent to an aggressor.
//!
//! - [`Pipeline`] - Streams a trace through the address decoder, a detector and
//!   the injector and writes the augmented trace.
//!
//! ## Configuration
//!
//! DRAM organization is read from JSON into [`DramConfig`] and validated into
//! a [`memory::DramGeometry`]. Invalid configurations are rejected with a
//! [`ConfigError`] before any trace is touched.

#![warn(missing_docs)]

mod config;
pub mod detector;
pub mod generator;
pub mod memory;
mod mitigation;
mod pipeline;
pub mod trace;
pub mod util;

pub use crate::config::{ConfigError, DramConfig, DramTiming, log2_exact};
pub use crate::mitigation::{MitigationError, MitigationInjector};
pub use crate::pipeline::{Aggressor, Pipeline, PipelineError, PipelineReport, applied_trace_path};
