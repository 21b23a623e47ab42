//! DRAM configuration loaded from JSON.
//!
//! [`DramConfig`] mirrors the configuration file as written by the user. It is
//! validated into an immutable [`DramGeometry`](crate::memory::DramGeometry)
//! before any address is translated.

use crate::memory::UnknownMapping;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when loading or validating a DRAM configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    /// The configuration file is not valid JSON for [`DramConfig`].
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
    /// The `address_mapping` scheme is not supported.
    #[error(transparent)]
    UnknownMapping(#[from] UnknownMapping),
    /// A count that determines a field width is not a positive power of two.
    #[error("{what} must be a positive power of two, got {value}")]
    NotPowerOfTwo {
        /// Name of the offending parameter
        what: &'static str,
        /// Configured value
        value: usize,
    },
    /// Fewer columns than one burst covers.
    #[error("columns ({columns}) must not be smaller than the burst length ({burst_length})")]
    ColumnsBelowBurst {
        /// Configured columns
        columns: usize,
        /// Configured burst length
        burst_length: usize,
    },
    /// A parameter needed to derive another one is absent.
    #[error("{0} is required to derive {1}")]
    MissingParameter(&'static str, &'static str),
    /// The rank size computed from the geometry is below one megabyte.
    #[error("rank size is below 1 MB, cannot derive the number of ranks")]
    RankTooSmall,
    /// `tRAS + tRP + 2` exceeds `u64::MAX`.
    #[error("tRAS + tRP + 2 overflows")]
    TimingOverflow,
    /// Field widths and throwaway bits exceed a 64-bit address.
    #[error("address layout needs {bits} bits, at most 64 are supported")]
    AddressTooWide {
        /// Total number of bits required
        bits: u32,
    },
}

/// DRAM timing parameters in memory clock cycles.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DramTiming {
    /// Row active time
    #[serde(rename = "tRAS")]
    pub t_ras: u64,
    /// Row precharge time
    #[serde(rename = "tRP")]
    pub t_rp: u64,
}

/// DRAM organization and address mapping parameters.
///
/// `ranks` and `throwaway_bits` may be omitted; they are then derived from the
/// bus and device widths, the channel size and the burst length.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DramConfig {
    /// Number of channels
    pub channels: usize,
    /// Number of ranks per channel
    #[serde(default)]
    pub ranks: Option<usize>,
    /// Number of bank groups per rank
    pub bankgroups: usize,
    /// Number of banks per bank group
    pub banks_per_group: usize,
    /// Number of rows per bank
    pub rows: usize,
    /// Number of columns per row
    pub columns: usize,
    /// Burst length
    #[serde(rename = "BL")]
    pub burst_length: usize,
    /// Data bus width in bits
    #[serde(default)]
    pub bus_width: Option<usize>,
    /// Device data width in bits
    #[serde(default)]
    pub device_width: Option<usize>,
    /// Channel capacity in MB
    #[serde(default)]
    pub channel_size: Option<usize>,
    /// Low-order address bits below request granularity
    #[serde(default)]
    pub throwaway_bits: Option<u32>,
    /// Field ordering scheme, e.g. `chrarocobabg`
    pub address_mapping: String,
    /// Timing section, only needed to derive the inter-arrival time of generated traces
    #[serde(default)]
    pub timing: Option<DramTiming>,
}

/// Result type for DRAM configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

impl DramConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_jsonfile<P: AsRef<Path>>(filepath: P) -> Result<DramConfig> {
        let mut file = File::open(filepath.as_ref())?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let config: DramConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Returns the configured or derived number of ranks.
    ///
    /// Without an explicit `ranks`, a rank is sized as
    /// `columns * device_width / 8 * rows * banks * (bus_width / device_width)` bytes,
    /// and the channel holds as many ranks as fit (at least one).
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter needed for the derivation is missing or the
    /// rank is smaller than one megabyte.
    pub fn rank_count(&self) -> Result<usize> {
        if let Some(ranks) = self.ranks {
            return Ok(ranks);
        }
        let bus_width = self
            .bus_width
            .ok_or(ConfigError::MissingParameter("bus_width", "ranks"))?;
        let device_width = self
            .device_width
            .filter(|&w| w > 0)
            .ok_or(ConfigError::MissingParameter("device_width", "ranks"))?;
        let channel_size = self
            .channel_size
            .ok_or(ConfigError::MissingParameter("channel_size", "ranks"))?;

        let devices_per_rank = (bus_width / device_width) as u128;
        let page_size = (self.columns * device_width / 8) as u128;
        let banks = (self.bankgroups * self.banks_per_group) as u128;
        let rank_bytes = page_size * self.rows as u128 * banks * devices_per_rank;
        let megs_per_rank = (rank_bytes >> 20) as usize;
        if megs_per_rank == 0 {
            return Err(ConfigError::RankTooSmall);
        }
        if megs_per_rank > channel_size {
            Ok(1)
        } else {
            Ok(channel_size / megs_per_rank)
        }
    }

    /// Returns the configured or derived number of throwaway bits.
    ///
    /// Without an explicit value, this is `log2` of the bytes moved per request
    /// (`bus_width / 8 * BL`).
    ///
    /// # Errors
    ///
    /// Returns an error if `bus_width` is missing or the request size is not a
    /// power of two.
    pub fn throwaway_bit_count(&self) -> Result<u32> {
        if let Some(bits) = self.throwaway_bits {
            return Ok(bits);
        }
        let bus_width = self
            .bus_width
            .ok_or(ConfigError::MissingParameter("bus_width", "throwaway_bits"))?;
        log2_exact("request size", bus_width / 8 * self.burst_length)
    }

    /// Returns the inter-arrival time of generated accesses, `tRAS + tRP + 2`.
    ///
    /// One row cycle (`tRC = tRAS + tRP`) plus a margin of two cycles keeps
    /// alternating accesses to the same bank from hitting an open row buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the `timing` section is missing or yields zero.
    pub fn interarrival_time(&self) -> Result<u64> {
        let timing = self
            .timing
            .ok_or(ConfigError::MissingParameter("timing", "the inter-arrival time"))?;
        timing
            .t_ras
            .checked_add(timing.t_rp)
            .and_then(|trc| trc.checked_add(2))
            .ok_or(ConfigError::TimingOverflow)
    }
}

/// `log2` of a positive power of two.
///
/// # Errors
///
/// Returns [`ConfigError::NotPowerOfTwo`] for any other value.
pub fn log2_exact(what: &'static str, value: usize) -> Result<u32> {
    if value.is_power_of_two() {
        Ok(value.trailing_zeros())
    } else {
        Err(ConfigError::NotPowerOfTwo { what, value })
    }
}
