// 5.0: funding accrual. an external randomness oracle pushes a seed, the seed is folded into
// the market's funding band, and the cumulative index advances by rate * whole hours.
// 5.0 has the state struct. 5.1+ has the accrual logic. everything here is pure.

use crate::types::{Bps, Timestamp, SECONDS_PER_HOUR};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingState {
    /// Running sum of hourly rate * hours, in bps·hours
    pub cumulative_index: i128,
    /// Advances only by consumed whole hours
    pub last_accrual: Timestamp,
    /// Rate applied by the most recent accrual, bps per hour
    pub last_rate: i64,
}

impl FundingState {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            cumulative_index: 0,
            last_accrual: timestamp,
            last_rate: 0,
        }
    }

    pub fn apply(&mut self, accrual: &FundingAccrual) {
        self.cumulative_index = accrual.new_index;
        self.last_accrual = accrual.new_last_accrual;
        self.last_rate = accrual.rate;
    }
}

/// Outcome of one funding push that actually moved the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingAccrual {
    pub rate: i64,
    pub hours: u64,
    pub previous_index: i128,
    pub new_index: i128,
    pub new_last_accrual: Timestamp,
}

/// Why a funding push left the market untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundingSkip {
    /// `now` is not after the last accrual
    NoTimeElapsed,
    /// less than an hour elapsed; the remainder waits for a later push
    SubHour { elapsed_secs: u64 },
}

// 5.1: projects any seed into [-cap, +cap]. deterministic, not a random source itself.
pub fn rate_from_seed(seed: u128, cap: Bps) -> i64 {
    let cap = cap.value() as u128;
    let band = 2 * cap + 1;
    ((seed % band) as i64) - cap as i64
}

pub fn whole_hours(elapsed_secs: u64) -> u64 {
    elapsed_secs / SECONDS_PER_HOUR
}

// 5.2: whole-hour quantized accrual. sub-hour remainders stay on the clock.
pub fn accrue(
    state: &FundingState,
    seed: u128,
    now: Timestamp,
    cap: Bps,
) -> Result<FundingAccrual, FundingSkip> {
    let elapsed = now.seconds_since(state.last_accrual);
    if elapsed == 0 {
        return Err(FundingSkip::NoTimeElapsed);
    }

    let rate = rate_from_seed(seed, cap);
    let hours = whole_hours(elapsed);
    if hours == 0 {
        return Err(FundingSkip::SubHour { elapsed_secs: elapsed });
    }

    let delta = (rate as i128).saturating_mul(hours as i128);
    Ok(FundingAccrual {
        rate,
        hours,
        previous_index: state.cumulative_index,
        new_index: state.cumulative_index.saturating_add(delta),
        new_last_accrual: state.last_accrual.plus_secs(hours * SECONDS_PER_HOUR),
    })
}

/// Distance the index moved since a snapshot, direction discarded.
pub fn index_movement(current: i128, snapshot: i128) -> u128 {
    current.abs_diff(snapshot)
}

pub fn rate_as_fraction(rate_bps: i64) -> Decimal {
    Decimal::new(rate_bps, 4)
}

// hourly bps -> APR fraction. 8760 hours a year
pub fn annualized_rate(rate_bps: i64) -> Decimal {
    rate_as_fraction(rate_bps) * dec!(8760)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn state_at(secs: u64) -> FundingState {
        FundingState::new(Timestamp::from_secs(secs))
    }

    #[test]
    fn seed_maps_into_band() {
        let cap = Bps(50);
        assert_eq!(rate_from_seed(0, cap), -50);
        assert_eq!(rate_from_seed(50, cap), 0);
        assert_eq!(rate_from_seed(100, cap), 50);
        assert_eq!(rate_from_seed(101, cap), -50); // wraps
        assert_eq!(rate_from_seed(u128::MAX, cap), (u128::MAX % 101) as i64 - 50);
    }

    #[test]
    fn zero_cap_always_zero_rate() {
        assert_eq!(rate_from_seed(12345, Bps(0)), 0);
    }

    #[test]
    fn no_elapsed_time_is_skipped() {
        let state = state_at(1_000);
        assert_eq!(
            accrue(&state, 7, Timestamp::from_secs(1_000), Bps(50)),
            Err(FundingSkip::NoTimeElapsed)
        );
        // out of order pushes are ignored, not rejected
        assert_eq!(
            accrue(&state, 7, Timestamp::from_secs(10), Bps(50)),
            Err(FundingSkip::NoTimeElapsed)
        );
    }

    #[test]
    fn sub_hour_is_skipped() {
        let state = state_at(0);
        assert_eq!(
            accrue(&state, 7, Timestamp::from_secs(3_599), Bps(50)),
            Err(FundingSkip::SubHour { elapsed_secs: 3_599 })
        );
    }

    #[test]
    fn two_hours_with_remainder() {
        let state = state_at(0);
        // seed 60 with cap 50 -> rate +10
        let accrual = accrue(&state, 60, Timestamp::from_secs(7_200 + 1_800), Bps(50)).unwrap();

        assert_eq!(accrual.rate, 10);
        assert_eq!(accrual.hours, 2);
        assert_eq!(accrual.new_index, 20);
        // only consumed hours advance the clock; the 30 min remainder stays
        assert_eq!(accrual.new_last_accrual, Timestamp::from_secs(7_200));
    }

    #[test]
    fn remainder_is_picked_up_later() {
        let mut state = state_at(0);
        let first = accrue(&state, 60, Timestamp::from_secs(5_400), Bps(50)).unwrap();
        state.apply(&first);
        assert_eq!(state.last_accrual, Timestamp::from_secs(3_600));

        // 30 more minutes completes the second hour
        let second = accrue(&state, 60, Timestamp::from_secs(7_200), Bps(50)).unwrap();
        state.apply(&second);
        assert_eq!(second.hours, 1);
        assert_eq!(state.cumulative_index, 20);
        assert_eq!(state.last_rate, 10);
    }

    #[test]
    fn negative_rates_move_index_down() {
        let state = state_at(0);
        let accrual = accrue(&state, 0, Timestamp::from_secs(3 * 3_600), Bps(50)).unwrap();
        assert_eq!(accrual.new_index, -150);
    }

    #[test]
    fn index_movement_is_directionless() {
        assert_eq!(index_movement(20, -10), 30);
        assert_eq!(index_movement(-10, 20), 30);
    }

    #[test]
    fn rate_views() {
        assert_eq!(rate_as_fraction(10), dec!(0.001));
        assert_eq!(annualized_rate(1), dec!(0.8760));
    }
}
