//! The `memory` module translates between linear addresses and structured DRAM addresses.
//!
//! The `memory` module provides the following abstractions:
//! - `DRAMAddr`: A structured address (channel, rank, bank group, bank, row, column).
//! - `DramGeometry`: The validated field counts, throwaway bits and field ordering.
//! - `AddressMapping`: One of the supported field orderings.
//! - `Field`: A single component of a structured address.
//!
//! Decoding never fails; encoding checks that every component is within range.
mod dram_addr;
mod geometry;
mod mapping;

pub use self::dram_addr::{AddressError, DRAMAddr};
pub use self::geometry::DramGeometry;
pub use self::mapping::{AddressMapping, Field, UnknownMapping};
