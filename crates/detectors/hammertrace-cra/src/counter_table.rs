use hammertrace_core::memory::{DRAMAddr, DramGeometry};

/// Dense per-row activation counters.
///
/// One counter per physical row, stored flat and indexed row-major over
/// (channel, rank, bankgroup, bank, row). The column of an address is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterTable {
    dims: [usize; 5],
    counters: Vec<u32>,
}

impl CounterTable {
    /// Allocates a zeroed table for every row of `geometry`.
    ///
    /// Returns `None` if the number of rows overflows `usize`.
    pub fn new(geometry: &DramGeometry) -> Option<Self> {
        let entries = geometry.row_slots()?;
        Some(CounterTable {
            dims: [
                geometry.channels,
                geometry.ranks,
                geometry.bankgroups,
                geometry.banks,
                geometry.rows,
            ],
            counters: vec![0; entries],
        })
    }

    /// Number of counters in the table.
    pub fn entries(&self) -> usize {
        self.counters.len()
    }

    /// Flat index of the row containing `addr`.
    ///
    /// # Panics
    ///
    /// Panics if a component of `addr` exceeds the table dimensions.
    fn index(&self, addr: &DRAMAddr) -> usize {
        let coords = [addr.channel, addr.rank, addr.bankgroup, addr.bank, addr.row];
        coords.iter().zip(self.dims).fold(0, |idx, (&c, dim)| {
            assert!(c < dim, "{} outside of counter table {:?}", addr, self.dims);
            idx * dim + c
        })
    }

    /// Returns the counter of the row containing `addr`.
    pub fn get(&self, addr: &DRAMAddr) -> u32 {
        self.counters[self.index(addr)]
    }

    /// Returns a mutable reference to the counter of the row containing `addr`.
    pub fn get_mut(&mut self, addr: &DRAMAddr) -> &mut u32 {
        let idx = self.index(addr);
        &mut self.counters[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::CounterTable;
    use hammertrace_core::DramConfig;
    use hammertrace_core::memory::{DRAMAddr, DramGeometry};

    fn geometry() -> DramGeometry {
        let config = DramConfig {
            channels: 2,
            ranks: Some(2),
            bankgroups: 2,
            banks_per_group: 4,
            rows: 8,
            columns: 64,
            burst_length: 8,
            throwaway_bits: Some(6),
            address_mapping: "rocorababgch".to_string(),
            ..Default::default()
        };
        DramGeometry::from_config(&config).expect("valid config")
    }

    #[test]
    fn test_size() {
        let table = CounterTable::new(&geometry()).expect("fits usize");
        assert_eq!(table.entries(), 2 * 2 * 2 * 4 * 8);
    }

    #[test]
    fn test_rows_are_distinct() {
        let geometry = geometry();
        let mut table = CounterTable::new(&geometry).expect("fits usize");
        let mut n = 0;
        for channel in 0..geometry.channels {
            for rank in 0..geometry.ranks {
                for bankgroup in 0..geometry.bankgroups {
                    for bank in 0..geometry.banks {
                        for row in 0..geometry.rows {
                            n += 1;
                            *table.get_mut(&DRAMAddr::new(channel, rank, bankgroup, bank, row, 0)) = n;
                        }
                    }
                }
            }
        }
        assert_eq!(table.get(&DRAMAddr::new(0, 0, 0, 0, 0, 0)), 1);
        assert_eq!(table.get(&DRAMAddr::new(1, 1, 1, 3, 7, 0)), n);
        assert_eq!(table.get(&DRAMAddr::new(0, 0, 0, 1, 0, 0)), 9);
    }

    #[test]
    fn test_column_is_ignored() {
        let mut table = CounterTable::new(&geometry()).expect("fits usize");
        *table.get_mut(&DRAMAddr::new(1, 0, 1, 2, 5, 0)) = 3;
        assert_eq!(table.get(&DRAMAddr::new(1, 0, 1, 2, 5, 7)), 3);
    }

    #[test]
    #[should_panic]
    fn test_out_of_table() {
        let table = CounterTable::new(&geometry()).expect("fits usize");
        table.get(&DRAMAddr::new(0, 0, 0, 0, 8, 0));
    }
}
