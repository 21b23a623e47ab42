use hammertrace_core::detector::AggressorDetector;
use hammertrace_core::memory::DRAMAddr;
use hammertrace_core::util::Rng;
use log::debug;
use rand::Rng as _;
use thiserror::Error;

/// Errors that can occur when constructing a [`Pra`] detector.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// The trigger probability is not in `(0, 1]`.
    #[error("probability must be in (0, 1], got {0}")]
    InvalidProbability(f64),
}

/// Probabilistic row activation detector.
///
/// Each access is a Bernoulli trial: a number is drawn uniformly from
/// `1..=round(1/p)` and the access triggers iff the draw is 1.
#[derive(Debug)]
pub struct Pra {
    upper: u64,
    rng: Rng,
}

impl Pra {
    /// Creates a new detector triggering with `probability`, drawing from `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProbability`] unless `0 < probability <= 1`.
    pub fn new(probability: f64, rng: Rng) -> Result<Self, Error> {
        if !(probability > 0.0 && probability <= 1.0) {
            return Err(Error::InvalidProbability(probability));
        }
        let upper = (1.0 / probability).round() as u64;
        debug!(
            "PRA: p = {}, drawing from 1..={} (seed 0x{:x})",
            probability,
            upper,
            rng.seed()
        );
        Ok(Pra { upper, rng })
    }
}

impl AggressorDetector for Pra {
    fn name(&self) -> &'static str {
        "PRA"
    }

    fn update(&mut self, _addr: &DRAMAddr) {}

    fn should_mitigate(&mut self) -> bool {
        self.rng.random_range(1..=self.upper) == 1
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, Pra};
    use hammertrace_core::detector::AggressorDetector;
    use hammertrace_core::memory::DRAMAddr;
    use hammertrace_core::util::Rng;

    fn trigger_rate(pra: &mut Pra, accesses: usize, addr: impl Fn(usize) -> DRAMAddr) -> f64 {
        let mut triggers = 0;
        for i in 0..accesses {
            pra.update(&addr(i));
            if pra.should_mitigate() {
                triggers += 1;
            }
        }
        triggers as f64 / accesses as f64
    }

    #[test]
    fn test_invalid_probability() {
        let rng = || Rng::from_seed(0);
        assert_eq!(Pra::new(0.0, rng()).unwrap_err(), Error::InvalidProbability(0.0));
        assert!(Pra::new(-0.5, rng()).is_err());
        assert!(Pra::new(1.5, rng()).is_err());
        assert!(Pra::new(f64::NAN, rng()).is_err());
        assert!(Pra::new(1.0, rng()).is_ok());
    }

    #[test]
    fn test_probability_one_always_triggers() {
        let mut pra = Pra::new(1.0, Rng::from_seed(3)).expect("valid probability");
        assert_eq!(trigger_rate(&mut pra, 1000, |_| DRAMAddr::default()), 1.0);
    }

    #[test]
    fn test_rate_converges() {
        const N: usize = 1_000_000;
        let mut pra = Pra::new(0.001, Rng::from_seed(0x1234)).expect("valid probability");
        let rate = trigger_rate(&mut pra, N, |_| DRAMAddr::default());
        // ~6 standard deviations at N = 10^6
        assert!((rate - 0.001).abs() < 0.0002, "rate {rate}");

        let mut pra = Pra::new(0.01, Rng::from_seed(0x1234)).expect("valid probability");
        let rate = trigger_rate(&mut pra, N, |i| DRAMAddr::new(0, 0, 0, 0, i % 4096, 0));
        assert!((rate - 0.01).abs() < 0.001, "rate {rate}");
    }

    #[test]
    fn test_independent_of_address() {
        let mut same_row = Pra::new(0.05, Rng::from_seed(99)).expect("valid probability");
        let mut many_rows = Pra::new(0.05, Rng::from_seed(99)).expect("valid probability");
        for i in 0..10_000 {
            same_row.update(&DRAMAddr::default());
            many_rows.update(&DRAMAddr::new(0, 0, 0, 0, i, 0));
            assert_eq!(same_row.should_mitigate(), many_rows.should_mitigate());
        }
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let draw = |seed| {
            let mut pra = Pra::new(0.1, Rng::from_seed(seed)).expect("valid probability");
            (0..256).map(|_| pra.should_mitigate()).collect::<Vec<_>>()
        };
        assert_eq!(draw(5), draw(5));
        assert_ne!(draw(5), draw(6));
    }
}
