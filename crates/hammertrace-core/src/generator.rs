//! Synthetic Rowhammer traces.
//!
//! [`HammerTraceGenerator`] picks a victim row at random, places the aggressor
//! in a directly adjacent row and a third "row hit breaker" row elsewhere in the
//! same bank. The generated trace alternates between aggressor and breaker so
//! that every aggressor access opens the row again instead of hitting an
//! already open row buffer.

use crate::memory::{AddressError, DRAMAddr, DramGeometry};
use crate::trace::AccessRecord;
use crate::util::Rng;
use rand::Rng as _;
use serde::Serialize;
use std::io::{self, Write};
use thiserror::Error;

/// Errors that can occur while generating a trace.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The bank has too few rows to place victim, aggressor and breaker apart.
    #[error("at least 3 rows are required, got {0}")]
    TooFewRows(usize),
    /// Writing the trace failed.
    #[error(transparent)]
    IoError(#[from] io::Error),
    /// An address could not be encoded.
    #[error(transparent)]
    AddressError(#[from] AddressError),
    /// The cycle of the last request exceeds `u64::MAX`.
    #[error("{requests} requests spaced {interarrival} cycles apart overflow the cycle counter")]
    CycleOverflow {
        /// Requested number of records
        requests: u64,
        /// Requested inter-arrival time
        interarrival: u64,
    },
}

/// Victim, aggressor and breaker rows of a generated attack.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct HammerPlan {
    /// Row expected to flip
    pub victim: DRAMAddr,
    /// Row hammered by the trace, adjacent to the victim
    pub aggressor: DRAMAddr,
    /// Row interleaved with the aggressor to close its row buffer
    pub breaker: DRAMAddr,
}

/// Generator for alternating aggressor/breaker access traces.
pub struct HammerTraceGenerator<'a> {
    geometry: &'a DramGeometry,
    rng: Rng,
}

impl<'a> HammerTraceGenerator<'a> {
    /// Creates a generator for `geometry` drawing from `rng`.
    pub fn new(geometry: &'a DramGeometry, rng: Rng) -> Self {
        HammerTraceGenerator { geometry, rng }
    }

    /// Draws a new attack plan.
    ///
    /// The aggressor is in the row above the victim, or below it if the victim
    /// is the last row.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::TooFewRows`] for banks with fewer than three rows.
    pub fn plan(&mut self) -> Result<HammerPlan, GeneratorError> {
        let g = self.geometry;
        if g.rows < 3 {
            return Err(GeneratorError::TooFewRows(g.rows));
        }
        let victim = DRAMAddr::new(
            self.rng.random_range(0..g.channels),
            self.rng.random_range(0..g.ranks),
            self.rng.random_range(0..g.bankgroups),
            self.rng.random_range(0..g.banks),
            self.rng.random_range(0..g.rows),
            self.rng.random_range(0..g.columns),
        );
        let aggressor_row = if victim.row + 1 == g.rows {
            victim.row - 1
        } else {
            victim.row + 1
        };
        let breaker_row = loop {
            let row = self.rng.random_range(0..g.rows);
            if row != victim.row && row != aggressor_row {
                break row;
            }
        };
        Ok(HammerPlan {
            victim,
            aggressor: victim.with_row(aggressor_row),
            breaker: victim.with_row(breaker_row),
        })
    }

    /// Writes `requests` `READ` records for `plan` to `out`.
    ///
    /// Records alternate between aggressor and breaker, starting with the
    /// aggressor at cycle 0 and spaced `interarrival` cycles apart.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails, the plan does not fit the geometry or
    /// the last cycle does not fit into a `u64`. Nothing is written in the
    /// latter two cases.
    pub fn write_trace<W: Write>(
        &self,
        plan: &HammerPlan,
        requests: u64,
        interarrival: u64,
        mut out: W,
    ) -> Result<(), GeneratorError> {
        let aggressor = plan.aggressor.to_linear(self.geometry)?;
        let breaker = plan.breaker.to_linear(self.geometry)?;
        requests
            .saturating_sub(1)
            .checked_mul(interarrival)
            .ok_or(GeneratorError::CycleOverflow {
                requests,
                interarrival,
            })?;
        let mut cycle = 0;
        for i in 0..requests {
            let address = if i % 2 == 0 { aggressor } else { breaker };
            writeln!(out, "{}", AccessRecord::new(address, "READ", cycle))?;
            cycle = cycle.saturating_add(interarrival);
        }
        out.flush()?;
        Ok(())
    }
}
