//! Rowhammer aggressor detection traits.
//!
//! This module defines the [`AggressorDetector`] trait that all detection policies
//! implement. The pipeline feeds every access of the input trace through
//! [`update`](AggressorDetector::update) and asks
//! [`should_mitigate`](AggressorDetector::should_mitigate) whether neighbor rows
//! of that access must be activated.

use crate::memory::DRAMAddr;

/// Trait for implementing Rowhammer aggressor detection policies.
///
/// Implementors decide, access by access, whether the most recent access is
/// treated as an aggressor. Synthesized neighbor activations are never passed
/// to a detector, so only accesses from the input trace build up pressure.
///
/// # Examples
///
/// See the detector implementations `hammertrace-pra` and `hammertrace-cra`.
pub trait AggressorDetector {
    /// Short policy name, used to name the augmented trace (e.g. `PRA`).
    fn name(&self) -> &'static str;

    /// Folds one access into the detector state.
    fn update(&mut self, addr: &DRAMAddr);

    /// Decides whether the access passed to the last [`update`](Self::update)
    /// warrants a mitigation.
    fn should_mitigate(&mut self) -> bool;

    /// Whether this policy attributes mitigations to particular rows.
    ///
    /// Only such policies report newly found aggressor addresses.
    fn tracks_rows(&self) -> bool {
        false
    }
}

impl<D: AggressorDetector + ?Sized> AggressorDetector for Box<D> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn update(&mut self, addr: &DRAMAddr) {
        (**self).update(addr)
    }

    fn should_mitigate(&mut self) -> bool {
        (**self).should_mitigate()
    }

    fn tracks_rows(&self) -> bool {
        (**self).tracks_rows()
    }
}
