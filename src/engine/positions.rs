//! Opening and closing positions.

use super::core::{rejected, Ledger};
use super::results::{CloseResult, LedgerError, OpenRequest};
use crate::events::{EventPayload, PositionClosedEvent, PositionOpenedEvent};
use crate::governance::Governance;
use crate::position::Position;
use crate::types::{AccountId, MarketId};
use crate::vault::MarginVault;

impl<V: MarginVault, G: Governance> Ledger<V, G> {
    /// Open a position for `caller`. Entry is the current mark price and
    /// the funding snapshot is the current cumulative index. The margin is
    /// locked in the vault before the position is stored.
    pub fn open(
        &mut self,
        caller: AccountId,
        market: MarketId,
        request: OpenRequest,
    ) -> Result<Position, LedgerError> {
        let book = self
            .books
            .get_mut(&market)
            .ok_or(LedgerError::MarketNotFound(market))
            .map_err(|e| rejected("open", e))?;

        let position = book
            .open(caller, &request, &self.vault, self.current_time)
            .map_err(|e| rejected("open", e))?;

        self.emit_event(EventPayload::PositionOpened(PositionOpenedEvent {
            market,
            account: caller,
            side: position.side,
            size: position.size,
            entry_price: position.entry_price,
            quoted_price: request.quoted_price,
            margin: position.margin,
            leverage: position.leverage,
            funding_snapshot: position.funding_snapshot,
        }));
        Ok(position)
    }

    /// Close `size_to_close` of `account`'s position at the current mark.
    /// The margin share is floored; a full close deletes the position.
    pub fn close(
        &mut self,
        caller: AccountId,
        market: MarketId,
        account: AccountId,
        size_to_close: u64,
    ) -> Result<CloseResult, LedgerError> {
        let book = self
            .books
            .get_mut(&market)
            .ok_or(LedgerError::MarketNotFound(market))
            .map_err(|e| rejected("close", e))?;

        let result = book
            .close(account, size_to_close, &self.vault, self.current_time)
            .map_err(|e| rejected("close", e))?;
        let exit_price = book.market().mark_price;

        self.emit_event(EventPayload::PositionClosed(PositionClosedEvent {
            market,
            account,
            closed_by: caller,
            closed_size: result.closed_size,
            remaining_size: result.remaining.as_ref().map_or(0, |p| p.size),
            exit_price,
            margin_released: result.margin_released,
            pnl: result.pnl(),
            equity_released: result.equity_released,
        }));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::{ErrorKind, Ledger, LedgerConfig, OpenRequest};
    use crate::events::EventPayload;
    use crate::market::MarketConfig;
    use crate::types::{AccountId, Leverage, MarketId, PairId, Price, Side};

    const ORACLE: AccountId = AccountId(10);
    const ALICE: AccountId = AccountId(100);

    fn ledger() -> (Ledger, MarketId) {
        let mut ledger = Ledger::new(LedgerConfig::default());
        let id = ledger
            .create_market(
                AccountId(1),
                PairId(1),
                MarketConfig::btc_perp(),
                Price(1_000),
                ORACLE,
                AccountId(11),
            )
            .unwrap();
        (ledger, id)
    }

    #[test]
    fn open_on_missing_market() {
        let (mut ledger, _) = ledger();
        let missing = MarketId::new(AccountId(2), PairId(1));
        let err = ledger
            .open(ALICE, missing, OpenRequest::new(Side::Long, 1, Leverage(100), 1_000))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn quoted_price_is_recorded_not_used() {
        let (mut ledger, id) = ledger();
        let request = OpenRequest::new(Side::Short, 10, Leverage(1_000), 2_000).quoted_at(Price(1));
        let position = ledger.open(ALICE, id, request).unwrap();

        assert_eq!(position.entry_price, Price(1_000));
        match &ledger.events().last().unwrap().payload {
            EventPayload::PositionOpened(e) => {
                assert_eq!(e.quoted_price, Some(Price(1)));
                assert_eq!(e.entry_price, Price(1_000));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn close_records_exit_and_pnl() {
        let (mut ledger, id) = ledger();
        ledger
            .open(ALICE, id, OpenRequest::new(Side::Long, 10, Leverage(1_000), 2_000))
            .unwrap();
        ledger.set_mark_price(ORACLE, id, Price(1_100)).unwrap();

        let result = ledger.close(ALICE, id, ALICE, 10).unwrap();
        assert_eq!(result.price_pnl, 1_000);
        assert_eq!(result.equity_released, 3_000);
        assert!(ledger.get_position(id, ALICE).is_none());

        match &ledger.events().last().unwrap().payload {
            EventPayload::PositionClosed(e) => {
                assert_eq!(e.exit_price, Price(1_100));
                assert_eq!(e.remaining_size, 0);
                assert_eq!(e.pnl, 1_000);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn rejected_close_emits_nothing() {
        let (mut ledger, id) = ledger();
        let before = ledger.events().len();
        assert!(ledger.close(ALICE, id, ALICE, 1).is_err());
        assert_eq!(ledger.events().len(), before);
    }
}
