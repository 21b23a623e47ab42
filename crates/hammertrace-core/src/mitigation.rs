//! Neighbor row activation.
//!
//! When a detector flags an access, the rows directly above and below the
//! aggressor are activated on the following cycles, refreshing their charge
//! before disturbance errors can accumulate.

use crate::memory::{AddressError, DRAMAddr, DramGeometry};
use crate::trace::AccessRecord;
use crate::util::NEIGHBOR_ACTIVATION;
use thiserror::Error;

/// Errors that can occur while synthesizing neighbor activations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MitigationError {
    /// A neighbor row address could not be encoded.
    #[error(transparent)]
    AddressError(#[from] AddressError),
    /// An activation would be issued after the last representable cycle.
    #[error("neighbor activation after cycle {cycle} overflows the cycle counter")]
    CycleOverflow {
        /// Cycle of the triggering access
        cycle: u64,
    },
}

/// Synthesizes neighbor row activations for detected aggressors.
#[derive(Debug, Clone, Copy)]
pub struct MitigationInjector<'a> {
    geometry: &'a DramGeometry,
}

impl<'a> MitigationInjector<'a> {
    /// Creates an injector for addresses laid out by `geometry`.
    pub fn new(geometry: &'a DramGeometry) -> Self {
        MitigationInjector { geometry }
    }

    /// Returns the activation records for the neighbors of `aggressor`.
    ///
    /// Emits `row - 1` unless the aggressor is in row 0 and `row + 1` unless it
    /// is in the last row, in that order. The n-th record is issued at
    /// `cycle + n`.
    ///
    /// # Errors
    ///
    /// Returns an error if `aggressor` does not fit the geometry or an
    /// activation cycle exceeds `u64::MAX`. No records are returned in that case.
    pub fn neighbor_activations(
        &self,
        aggressor: &DRAMAddr,
        cycle: u64,
    ) -> Result<Vec<AccessRecord>, MitigationError> {
        let below = aggressor.row.checked_sub(1);
        let above = Some(aggressor.row + 1).filter(|&row| row < self.geometry.rows);
        let mut out = Vec::with_capacity(2);
        for row in [below, above].into_iter().flatten() {
            let address = aggressor.with_row(row).to_linear(self.geometry)?;
            let at = cycle
                .checked_add(out.len() as u64 + 1)
                .ok_or(MitigationError::CycleOverflow { cycle })?;
            out.push(AccessRecord::new(address, NEIGHBOR_ACTIVATION, at));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::{MitigationError, MitigationInjector};
    use crate::config::DramConfig;
    use crate::memory::{AddressError, DRAMAddr, DramGeometry, Field};
    use crate::util::NEIGHBOR_ACTIVATION;

    fn geometry() -> DramGeometry {
        let config = DramConfig {
            channels: 1,
            ranks: Some(1),
            bankgroups: 2,
            banks_per_group: 2,
            rows: 16,
            columns: 64,
            burst_length: 8,
            throwaway_bits: Some(6),
            address_mapping: "chrababgroco".to_string(),
            ..Default::default()
        };
        DramGeometry::from_config(&config).expect("valid config")
    }

    #[test]
    fn test_interior_row() {
        let geometry = geometry();
        let injector = MitigationInjector::new(&geometry);
        let aggressor = DRAMAddr::new(0, 0, 1, 1, 5, 3);
        let records = injector
            .neighbor_activations(&aggressor, 30)
            .expect("in range");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].cycle, 31);
        assert_eq!(records[1].cycle, 32);
        assert!(records.iter().all(|r| r.operation == NEIGHBOR_ACTIVATION));
        assert_eq!(
            DRAMAddr::from_linear(records[0].address, &geometry),
            aggressor.with_row(4)
        );
        assert_eq!(
            DRAMAddr::from_linear(records[1].address, &geometry),
            aggressor.with_row(6)
        );
    }

    #[test]
    fn test_boundary_rows() {
        let geometry = geometry();
        let injector = MitigationInjector::new(&geometry);

        let first = DRAMAddr::new(0, 0, 0, 1, 0, 0);
        let records = injector.neighbor_activations(&first, 7).expect("in range");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cycle, 8);
        assert_eq!(
            DRAMAddr::from_linear(records[0].address, &geometry).row,
            1
        );

        let last = DRAMAddr::new(0, 0, 0, 1, 15, 0);
        let records = injector.neighbor_activations(&last, 7).expect("in range");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cycle, 8);
        assert_eq!(
            DRAMAddr::from_linear(records[0].address, &geometry).row,
            14
        );
    }

    #[test]
    fn test_out_of_range_aggressor() {
        let geometry = geometry();
        let injector = MitigationInjector::new(&geometry);
        let aggressor = DRAMAddr::new(0, 0, 4, 0, 3, 0);
        assert_eq!(
            injector.neighbor_activations(&aggressor, 0),
            Err(MitigationError::AddressError(AddressError::OutOfRange {
                field: Field::BankGroup,
                value: 4,
                count: 2
            }))
        );
    }

    #[test]
    fn test_cycle_overflow() {
        let geometry = geometry();
        let injector = MitigationInjector::new(&geometry);
        let aggressor = DRAMAddr::new(0, 0, 1, 1, 5, 3);
        assert_eq!(
            injector.neighbor_activations(&aggressor, u64::MAX),
            Err(MitigationError::CycleOverflow { cycle: u64::MAX })
        );
        // the second neighbor no longer fits
        assert_eq!(
            injector.neighbor_activations(&aggressor, u64::MAX - 1),
            Err(MitigationError::CycleOverflow {
                cycle: u64::MAX - 1
            })
        );
        // row 0 only has one neighbor
        let first = aggressor.with_row(0);
        let records = injector
            .neighbor_activations(&first, u64::MAX - 1)
            .expect("one activation fits");
        assert_eq!(records[0].cycle, u64::MAX);
    }
}
