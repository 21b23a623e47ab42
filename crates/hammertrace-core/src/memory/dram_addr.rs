use crate::memory::{DramGeometry, Field};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// Errors that can occur when encoding a DRAM address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// A field value does not fit its configured range.
    #[error("{field} {value} is out of range (count {count})")]
    OutOfRange {
        /// Offending field
        field: Field,
        /// Value that was passed
        value: usize,
        /// Number of valid values of the field
        count: usize,
    },
}

/// DRAM address with channel, rank, bank group, bank, row and column components.
///
/// Represents the physical organization of a linear memory address, decoded
/// according to a [`DramGeometry`].
#[derive(
    Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub struct DRAMAddr {
    /// Channel number
    pub channel: usize,
    /// Rank number
    pub rank: usize,
    /// Bank group number
    pub bankgroup: usize,
    /// Bank number within the bank group
    pub bank: usize,
    /// Row number
    pub row: usize,
    /// Column number
    pub column: usize,
}

impl Display for DRAMAddr {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        write!(
            fmt,
            "(channel: {}, rank: {}, bankgroup: {}, bank: {}, row: {}, column: {})",
            self.channel, self.rank, self.bankgroup, self.bank, self.row, self.column
        )
    }
}

impl DRAMAddr {
    /// Creates a new DRAM address.
    pub fn new(
        channel: usize,
        rank: usize,
        bankgroup: usize,
        bank: usize,
        row: usize,
        column: usize,
    ) -> Self {
        DRAMAddr {
            channel,
            rank,
            bankgroup,
            bank,
            row,
            column,
        }
    }

    /// Returns the value of a single field.
    pub fn get(&self, field: Field) -> usize {
        match field {
            Field::Channel => self.channel,
            Field::Rank => self.rank,
            Field::BankGroup => self.bankgroup,
            Field::Bank => self.bank,
            Field::Row => self.row,
            Field::Column => self.column,
        }
    }

    fn slot(&mut self, field: Field) -> &mut usize {
        match field {
            Field::Channel => &mut self.channel,
            Field::Rank => &mut self.rank,
            Field::BankGroup => &mut self.bankgroup,
            Field::Bank => &mut self.bank,
            Field::Row => &mut self.row,
            Field::Column => &mut self.column,
        }
    }

    /// Returns a copy of this address in a different row.
    pub fn with_row(&self, row: usize) -> DRAMAddr {
        DRAMAddr { row, ..*self }
    }

    /// Decodes a linear address into DRAM components.
    ///
    /// Fields are extracted from the least significant end upwards, starting
    /// right above the throwaway bits. Bits above the mapped layout are ignored.
    pub fn from_linear(addr: u64, geometry: &DramGeometry) -> DRAMAddr {
        let mut out = DRAMAddr::default();
        let mut pos = geometry.throwaway_bits;
        for field in geometry.mapping.fields().into_iter().rev() {
            let width = geometry.width(field);
            *out.slot(field) = modulo_width(addr, width, pos) as usize;
            pos += width;
        }
        out
    }

    /// Encodes DRAM components into a linear address.
    ///
    /// This is the inverse of [`DRAMAddr::from_linear`]; the throwaway bits are zero.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::OutOfRange`] if a component is not below its
    /// configured count, since it would spill into the neighbouring field.
    pub fn to_linear(&self, geometry: &DramGeometry) -> Result<u64, AddressError> {
        let mut res: u64 = 0;
        for field in geometry.mapping.fields() {
            let value = self.get(field);
            let count = geometry.count(field);
            if value >= count {
                return Err(AddressError::OutOfRange {
                    field,
                    value,
                    count,
                });
            }
            res = res.checked_shl(geometry.width(field)).unwrap_or(0) | value as u64;
        }
        Ok(res.checked_shl(geometry.throwaway_bits).unwrap_or(0))
    }
}

/// Extracts `width` bits of `addr` starting at bit `pos`.
fn modulo_width(addr: u64, width: u32, pos: u32) -> u64 {
    let shifted = addr.checked_shr(pos).unwrap_or(0);
    match 1u64.checked_shl(width) {
        Some(bound) => shifted & (bound - 1),
        None => shifted,
    }
}
