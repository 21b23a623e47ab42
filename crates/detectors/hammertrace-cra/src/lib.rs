//! Counter-based row activation (CRA).
//!
//! Keeps one activation counter per physical row and triggers a neighbor row
//! activation every time a row reaches the configured threshold.
//!
//! Implements the [`hammertrace_core::detector::AggressorDetector`] trait.
//!
//! # Memory
//!
//! The counter table holds one `u32` per row of the whole memory
//! (`channels * ranks * bankgroups * banks * rows` entries) and is allocated
//! up front. See [`CounterTable::entries`].

#![warn(missing_docs)]

mod counter_table;
mod cra;

pub use counter_table::CounterTable;
pub use cra::{Cra, Error};
