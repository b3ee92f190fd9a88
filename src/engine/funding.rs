//! Funding index accrual.

use super::core::{rejected, Ledger};
use super::results::{FundingOutcome, LedgerError};
use crate::events::{EventPayload, FundingAccruedEvent};
use crate::governance::Governance;
use crate::types::{AccountId, MarketId, Timestamp};
use crate::vault::MarginVault;

impl<V: MarginVault, G: Governance> Ledger<V, G> {
    /// Push a funding seed. Accrues whole hours since the last accrual;
    /// less than an hour, or a `now` in the past, is a silent no-op.
    pub fn push_funding(
        &mut self,
        caller: AccountId,
        market: MarketId,
        seed: u128,
        now: Timestamp,
    ) -> Result<FundingOutcome, LedgerError> {
        let book = self
            .books
            .get_mut(&market)
            .ok_or(LedgerError::MarketNotFound(market))
            .map_err(|e| rejected("push_funding", e))?;

        let outcome = book
            .push_funding(caller, seed, now)
            .map_err(|e| rejected("push_funding", e))?;

        if let FundingOutcome::Accrued(accrual) = &outcome {
            self.emit_event(EventPayload::FundingAccrued(FundingAccruedEvent {
                market,
                rate_bps_per_hour: accrual.rate,
                hours: accrual.hours,
                cumulative_index: accrual.new_index,
                accrued_through: accrual.new_last_accrual,
            }));
        }
        Ok(outcome)
    }
}
