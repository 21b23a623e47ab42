use crate::config::{ConfigError, DramConfig, log2_exact};
use crate::memory::{AddressMapping, Field};
use serde::Serialize;

/// Validated DRAM address layout.
///
/// Holds the per-field counts (all powers of two), the throwaway bits and the
/// field ordering used to translate between linear and structured addresses.
/// Built once from a [`DramConfig`] and never modified afterwards.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct DramGeometry {
    /// Field ordering scheme
    pub mapping: AddressMapping,
    /// Low-order bits excluded from the mapping
    pub throwaway_bits: u32,
    /// Number of channels
    pub channels: usize,
    /// Number of ranks per channel
    pub ranks: usize,
    /// Number of bank groups per rank
    pub bankgroups: usize,
    /// Number of banks per bank group
    pub banks: usize,
    /// Number of rows per bank
    pub rows: usize,
    /// Number of addressable columns per row, i.e. `columns / BL`
    pub columns: usize,
}

impl DramGeometry {
    /// Validates a configuration into a geometry.
    ///
    /// # Errors
    ///
    /// Returns an error if the mapping scheme is unknown, any count is not a
    /// positive power of two, there are fewer columns than one burst, or the
    /// layout does not fit into 64 bits.
    pub fn from_config(config: &DramConfig) -> Result<DramGeometry, ConfigError> {
        let mapping = AddressMapping::parse(&config.address_mapping)?;
        let ranks = config.rank_count()?;
        let throwaway_bits = config.throwaway_bit_count()?;

        log2_exact("channels", config.channels)?;
        log2_exact("ranks", ranks)?;
        log2_exact("bankgroups", config.bankgroups)?;
        log2_exact("banks_per_group", config.banks_per_group)?;
        log2_exact("rows", config.rows)?;
        let column_bits = log2_exact("columns", config.columns)?;
        let burst_bits = log2_exact("BL", config.burst_length)?;
        if column_bits < burst_bits {
            return Err(ConfigError::ColumnsBelowBurst {
                columns: config.columns,
                burst_length: config.burst_length,
            });
        }

        let geometry = DramGeometry {
            mapping,
            throwaway_bits,
            channels: config.channels,
            ranks,
            bankgroups: config.bankgroups,
            banks: config.banks_per_group,
            rows: config.rows,
            columns: 1 << (column_bits - burst_bits),
        };
        let bits = geometry.address_bits();
        if bits > u64::BITS {
            return Err(ConfigError::AddressTooWide { bits });
        }
        Ok(geometry)
    }

    /// Returns the number of distinct values of `field`.
    pub fn count(&self, field: Field) -> usize {
        match field {
            Field::Channel => self.channels,
            Field::Rank => self.ranks,
            Field::BankGroup => self.bankgroups,
            Field::Bank => self.banks,
            Field::Row => self.rows,
            Field::Column => self.columns,
        }
    }

    /// Returns the bit width of `field` in a linear address.
    pub fn width(&self, field: Field) -> u32 {
        self.count(field).trailing_zeros()
    }

    /// Total number of significant bits of a linear address, throwaway bits included.
    pub fn address_bits(&self) -> u32 {
        self.throwaway_bits + Field::ALL.iter().map(|&f| self.width(f)).sum::<u32>()
    }

    /// Number of distinct physical rows, i.e. `channels * ranks * bankgroups * banks * rows`.
    ///
    /// Returns `None` if the product overflows `usize`.
    pub fn row_slots(&self) -> Option<usize> {
        [self.ranks, self.bankgroups, self.banks, self.rows]
            .into_iter()
            .try_fold(self.channels, |acc, n| acc.checked_mul(n))
    }
}
