use crate::counter_table::CounterTable;
use hammertrace_core::detector::AggressorDetector;
use hammertrace_core::memory::{DRAMAddr, DramGeometry};
use log::debug;
use thiserror::Error;

/// Errors that can occur when constructing a [`Cra`] detector.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The threshold is zero.
    #[error("threshold must be at least 1")]
    ZeroThreshold,
    /// The counter table would have more entries than fit into memory.
    #[error("counter table size overflows usize")]
    TableTooLarge,
}

/// Counter-based row activation detector.
///
/// Counts the accesses to every row. The access that brings a row's counter to
/// the threshold triggers; the next access to that row starts a new count at 1.
/// Counters therefore always stay within `0..=threshold`.
#[derive(Debug, Clone)]
pub struct Cra {
    threshold: u32,
    counters: CounterTable,
    recent: Option<DRAMAddr>,
}

impl Cra {
    /// Creates a detector for `geometry` triggering every `threshold` accesses per row.
    ///
    /// # Errors
    ///
    /// Returns an error if `threshold` is zero or the counter table would not fit
    /// into the address space.
    pub fn new(geometry: &DramGeometry, threshold: u32) -> Result<Self, Error> {
        if threshold == 0 {
            return Err(Error::ZeroThreshold);
        }
        let counters = CounterTable::new(geometry).ok_or(Error::TableTooLarge)?;
        debug!(
            "CRA: threshold {}, {} row counters ({} bytes)",
            threshold,
            counters.entries(),
            counters.entries() * size_of::<u32>()
        );
        Ok(Cra {
            threshold,
            counters,
            recent: None,
        })
    }

    /// Returns the current counter of the row containing `addr`.
    pub fn counter(&self, addr: &DRAMAddr) -> u32 {
        self.counters.get(addr)
    }
}

impl AggressorDetector for Cra {
    fn name(&self) -> &'static str {
        "CRA"
    }

    fn update(&mut self, addr: &DRAMAddr) {
        let counter = self.counters.get_mut(addr);
        if *counter == self.threshold {
            // mitigated on the previous trigger, start over
            *counter = 0;
        }
        *counter += 1;
        self.recent = Some(*addr);
    }

    fn should_mitigate(&mut self) -> bool {
        self.recent
            .is_some_and(|recent| self.counters.get(&recent) == self.threshold)
    }

    fn tracks_rows(&self) -> bool {
        true
    }
}
