//! Liquidation of under-margined positions.

use super::core::{rejected, Ledger};
use super::results::{LedgerError, LiquidationResult};
use crate::events::{EventPayload, PositionLiquidatedEvent};
use crate::governance::Governance;
use crate::types::{AccountId, MarketId};
use crate::vault::MarginVault;

impl<V: MarginVault, G: Governance> Ledger<V, G> {
    /// Liquidate `victim` if its health is negative. Anyone may call this.
    /// The position is deleted whatever its equity; the vault is notified
    /// but no reward or insurance settlement happens here.
    pub fn liquidate(
        &mut self,
        caller: AccountId,
        market: MarketId,
        victim: AccountId,
    ) -> Result<LiquidationResult, LedgerError> {
        let book = self
            .books
            .get_mut(&market)
            .ok_or(LedgerError::MarketNotFound(market))
            .map_err(|e| rejected("liquidate", e))?;

        let result = book
            .liquidate(caller, victim, &self.vault)
            .map_err(|e| rejected("liquidate", e))?;

        self.emit_event(EventPayload::PositionLiquidated(PositionLiquidatedEvent {
            market,
            account: victim,
            liquidator: caller,
            size: result.size,
            liquidation_price: result.liquidation_price,
            health: result.health,
            equity: result.equity,
        }));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::{ErrorKind, Ledger, LedgerConfig, OpenRequest};
    use crate::governance::Council;
    use crate::market::MarketConfig;
    use crate::types::{AccountId, Bps, Leverage, PairId, Price, Side};
    use crate::vault::InMemoryVault;

    const ADMIN: AccountId = AccountId(1);
    const ALICE: AccountId = AccountId(100);
    const KEEPER: AccountId = AccountId(200);

    #[test]
    fn liquidation_needs_negative_health() {
        let mut ledger = Ledger::with_seams(
            LedgerConfig::default(),
            InMemoryVault::new(),
            Council::new([ADMIN]),
        );
        ledger.vault().deposit(ALICE, 10_000);
        let id = ledger
            .create_market(
                ADMIN,
                PairId(1),
                MarketConfig::btc_perp(),
                Price(100),
                AccountId(10),
                AccountId(11),
            )
            .unwrap();
        ledger
            .open(ALICE, id, OpenRequest::new(Side::Long, 100, Leverage(1_000), 2_000))
            .unwrap();

        let err = ledger.liquidate(KEEPER, id, ALICE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let strict = MarketConfig {
            initial_margin: Bps(5_000),
            maintenance_margin: Bps(5_000),
            ..MarketConfig::btc_perp()
        };
        ledger.update_risk_params(ADMIN, id, strict).unwrap();

        let result = ledger.liquidate(KEEPER, id, ALICE).unwrap();
        assert_eq!(result.health, -3_000);
        assert_eq!(result.liquidator, KEEPER);
        assert!(ledger.get_position(id, ALICE).is_none());

        let notices = ledger.vault().liquidations();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].victim, ALICE);
        // margin stays locked: settlement is not implemented
        assert_eq!(ledger.vault().balance(ALICE).locked, 2_000);
    }
}
