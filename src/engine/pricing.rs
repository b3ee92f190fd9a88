//! Mark price updates.

use super::core::{rejected, Ledger};
use super::results::LedgerError;
use crate::events::{EventPayload, MarkPriceUpdatedEvent};
use crate::governance::Governance;
use crate::types::{AccountId, MarketId, Price};
use crate::vault::MarginVault;

impl<V: MarginVault, G: Governance> Ledger<V, G> {
    /// Overwrite the mark price. Only the market's registered price oracle may call this.
    pub fn set_mark_price(
        &mut self,
        caller: AccountId,
        market: MarketId,
        price: Price,
    ) -> Result<(), LedgerError> {
        let book = self
            .books
            .get_mut(&market)
            .ok_or(LedgerError::MarketNotFound(market))
            .map_err(|e| rejected("set_mark_price", e))?;

        let old_price = book
            .set_mark_price(caller, price)
            .map_err(|e| rejected("set_mark_price", e))?;

        self.emit_event(EventPayload::MarkPriceUpdated(MarkPriceUpdatedEvent {
            market,
            old_price,
            new_price: price,
        }));
        Ok(())
    }
}
