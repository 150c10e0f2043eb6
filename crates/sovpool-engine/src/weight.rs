//! # Merit Weight
//!
//! Fixed weight per assurance tier. The table is total over
//! [`AssuranceLevel`]; unknown labels never reach it because parsing the
//! label fails first.

use sovpool_core::AssuranceLevel;

/// Maps an assurance tier to the weight its signature contributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeritWeightCalculator;

impl MeritWeightCalculator {
    /// IAL1 = 1, IAL2 = 5, IAL3 = 20.
    pub const fn weight(&self, level: AssuranceLevel) -> u64 {
        match level {
            AssuranceLevel::Ial1Unverified => 1,
            AssuranceLevel::Ial2Verified => 5,
            AssuranceLevel::Ial3Sovereign => 20,
        }
    }
}
