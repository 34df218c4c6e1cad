// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Term-based bonus schedule and effective-value computation.

use alloy::primitives::{U256, U512};

use crate::error::AllocationError;

/// Bonus multipliers are expressed over this denominator to avoid fractional
/// arithmetic (10250 / 10000 = 102.5%).
pub const BONUS_DENOMINATOR: u64 = 10_000;

/// Early-participation factors are percentages; 100 is a no-op.
pub const EARLY_BONUS_DENOMINATOR: u64 = 100;

/// Factor applied when no early-participation bonus is in effect.
pub const NO_EARLY_BONUS_FACTOR: u64 = 100;

/// Lock terms recognized by the lockdrop contract, plus the synthetic
/// signaling term.
///
/// The contract emits terms as a `uint8` index (0 = three months through
/// 5 = thirty-six months); `Signaling` never appears on-chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    ThreeMonths,
    SixMonths,
    NineMonths,
    TwelveMonths,
    TwentyFourMonths,
    ThirtySixMonths,
    Signaling,
}

impl Term {
    /// Map the contract's term index. Unrecognized indices yield `None`,
    /// which downstream forfeits the event's effective value (historical
    /// policy: an invalid term is not an error).
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::ThreeMonths),
            1 => Some(Self::SixMonths),
            2 => Some(Self::NineMonths),
            3 => Some(Self::TwelveMonths),
            4 => Some(Self::TwentyFourMonths),
            5 => Some(Self::ThirtySixMonths),
            _ => None,
        }
    }

    /// Base bonus multiplier over [`BONUS_DENOMINATOR`].
    pub fn multiplier(&self) -> u64 {
        match self {
            Self::ThreeMonths => 10_250,
            Self::SixMonths => 10_500,
            Self::NineMonths => 10_750,
            Self::TwelveMonths => 11_000,
            Self::TwentyFourMonths => 11_500,
            Self::ThirtySixMonths => 12_000,
            // Signaling currently carries the lowest lock bonus.
            Self::Signaling => 10_250,
        }
    }
}

/// Early-participation bonus factor schedule, in percent.
///
/// Returned factors are always at least 100 (no-op).
pub trait EarlyBonus {
    fn factor(&self, lock_time: u64, lock_start: u64) -> u64;
}

/// No early-participation bonus; every lock gets the base multiplier only.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEarlyBonus;

impl EarlyBonus for NoEarlyBonus {
    fn factor(&self, _lock_time: u64, _lock_start: u64) -> u64 {
        NO_EARLY_BONUS_FACTOR
    }
}

/// Early-participation factor decaying from `start_factor` down to 100 in
/// `steps` equal windows across `duration` seconds from the lockdrop start.
#[derive(Clone, Copy, Debug)]
pub struct SteppedDecay {
    /// Factor granted to locks created at the very start, in percent.
    pub start_factor: u64,
    /// Length of the decay window in seconds.
    pub duration: u64,
    /// Number of equal decay steps.
    pub steps: u64,
}

impl EarlyBonus for SteppedDecay {
    fn factor(&self, lock_time: u64, lock_start: u64) -> u64 {
        if self.duration == 0 || self.steps == 0 || self.start_factor <= NO_EARLY_BONUS_FACTOR {
            return NO_EARLY_BONUS_FACTOR;
        }
        let elapsed = lock_time.saturating_sub(lock_start);
        if elapsed >= self.duration {
            return NO_EARLY_BONUS_FACTOR;
        }
        let window = elapsed * self.steps / self.duration;
        let decayed =
            self.start_factor - (self.start_factor - NO_EARLY_BONUS_FACTOR) * window / self.steps;
        decayed.max(NO_EARLY_BONUS_FACTOR)
    }
}

/// Compute the bonus-adjusted effective value of a contribution.
///
/// `result = amount * multiplier * early_factor / (10_000 * 100)`, with a
/// single floor division at the end. An unrecognized term (`None`) yields
/// zero. The product is widened to 512 bits so no intermediate wraps; only
/// a result that itself exceeds 256 bits is an error.
pub fn effective_value(
    amount: U256,
    term: Option<Term>,
    early_factor: u64,
) -> Result<U256, AllocationError> {
    let Some(term) = term else {
        return Ok(U256::ZERO);
    };
    let scale = term.multiplier() as u128 * early_factor as u128;
    // amount < 2^256 and scale < 2^128, so the 512-bit product is exact.
    let wide = U512::from(amount) * U512::from(scale)
        / U512::from(BONUS_DENOMINATOR as u128 * EARLY_BONUS_DENOMINATOR as u128);
    if wide > U512::from(U256::MAX) {
        return Err(AllocationError::Overflow("effective value"));
    }
    Ok(wide.to::<U256>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL_TERMS: [Term; 6] = [
        Term::ThreeMonths,
        Term::SixMonths,
        Term::NineMonths,
        Term::TwelveMonths,
        Term::TwentyFourMonths,
        Term::ThirtySixMonths,
    ];

    #[test]
    fn three_month_lock_of_one_million() {
        let value =
            effective_value(U256::from(1_000_000u64), Some(Term::ThreeMonths), 100).unwrap();
        assert_eq!(value, U256::from(1_025_000u64));
    }

    #[test]
    fn twelve_month_lock_of_one_million() {
        let value =
            effective_value(U256::from(1_000_000u64), Some(Term::TwelveMonths), 100).unwrap();
        assert_eq!(value, U256::from(1_100_000u64));
    }

    #[test]
    fn effective_value_floors_per_event() {
        // 100 * 10250 / 10000 = 102.5 -> 102; 200 -> 205.
        assert_eq!(
            effective_value(U256::from(100u64), Some(Term::ThreeMonths), 100).unwrap(),
            U256::from(102u64)
        );
        assert_eq!(
            effective_value(U256::from(200u64), Some(Term::ThreeMonths), 100).unwrap(),
            U256::from(205u64)
        );
    }

    #[test]
    fn unknown_term_forfeits_value() {
        assert_eq!(effective_value(U256::from(1_000_000u64), None, 100).unwrap(), U256::ZERO);
        assert_eq!(Term::from_index(6), None);
        assert_eq!(Term::from_index(255), None);
    }

    #[test]
    fn signaling_matches_three_month_bonus() {
        let amount = U256::from(12_345_678u64);
        assert_eq!(
            effective_value(amount, Some(Term::Signaling), 100).unwrap(),
            effective_value(amount, Some(Term::ThreeMonths), 100).unwrap()
        );
    }

    #[test]
    fn early_factor_scales_linearly() {
        // 150% early factor on a 3mo lock: 1_000_000 * 10250 * 150 / 1_000_000.
        let value =
            effective_value(U256::from(1_000_000u64), Some(Term::ThreeMonths), 150).unwrap();
        assert_eq!(value, U256::from(1_537_500u64));
    }

    #[test]
    fn extreme_amount_widens_instead_of_wrapping() {
        // The full 256-bit range is decodable from the event, and at any bonus
        // above 1.0 the maximum amount has no representable effective value.
        let err = effective_value(U256::MAX, Some(Term::ThreeMonths), 100).unwrap_err();
        assert!(matches!(err, AllocationError::Overflow(_)));

        // Half the range times 1.025 still fits, and must come out larger
        // than the input rather than wrapped down to a sliver.
        let amount = U256::MAX / U256::from(2u8);
        let value = effective_value(amount, Some(Term::ThreeMonths), 100).unwrap();
        assert!(value > amount);
    }

    #[test]
    fn monotone_in_term_rank() {
        let amount = U256::from(1_000_000_000u64);
        for pair in ALL_TERMS.windows(2) {
            assert!(
                effective_value(amount, Some(pair[0]), 100).unwrap()
                    <= effective_value(amount, Some(pair[1]), 100).unwrap(),
                "{:?} > {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn stepped_decay_reaches_floor() {
        let decay = SteppedDecay { start_factor: 150, duration: 1_000, steps: 5 };
        assert_eq!(decay.factor(0, 0), 150);
        assert_eq!(decay.factor(100, 0), 150); // still in the first window
        assert_eq!(decay.factor(500, 0), 130);
        assert_eq!(decay.factor(999, 0), 110);
        assert_eq!(decay.factor(1_000, 0), 100);
        assert_eq!(decay.factor(5_000, 0), 100);
        // Clock skew before the start still grants the full factor.
        assert_eq!(decay.factor(0, 100), 150);
    }

    #[test]
    fn degenerate_decay_is_a_noop() {
        assert_eq!(SteppedDecay { start_factor: 150, duration: 0, steps: 5 }.factor(1, 0), 100);
        assert_eq!(SteppedDecay { start_factor: 100, duration: 10, steps: 5 }.factor(1, 0), 100);
    }

    proptest! {
        #[test]
        fn monotone_in_amount(amount in 0u128..u128::MAX / 2, delta in 0u128..u128::MAX / 2) {
            for term in ALL_TERMS {
                let lo = effective_value(U256::from(amount), Some(term), 100).unwrap();
                let hi = effective_value(
                    U256::from(amount) + U256::from(delta),
                    Some(term),
                    100,
                ).unwrap();
                prop_assert!(lo <= hi);
            }
        }

        #[test]
        fn never_less_than_amount_for_valid_terms(amount in 0u128..u128::MAX / 2) {
            for term in ALL_TERMS {
                let value = effective_value(U256::from(amount), Some(term), 100).unwrap();
                prop_assert!(value >= U256::from(amount));
            }
        }
    }
}
