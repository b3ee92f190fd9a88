// 4.0: open position tracking. one record per (market, account), no averaging in.
// 4.1 has the pro-rata close math at the bottom.

use crate::margin::{funding_pnl, price_pnl};
use crate::market::MarketState;
use crate::types::{to_signed, AccountId, Leverage, MarketId, Price, Side, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub market: MarketId,
    pub account: AccountId,
    pub side: Side,
    /// Base units. Never zero while the record exists.
    pub size: u64,
    pub entry_price: Price,
    /// Locked quote units
    pub margin: u128,
    pub leverage: Leverage,
    /// Cumulative funding index at open
    pub funding_snapshot: i128,
    pub opened_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Positions of one market, keyed by account. Iteration order is unspecified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionStore {
    positions: HashMap<AccountId, Position>,
}

impl PositionStore {
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
        }
    }

    pub fn get(&self, account: AccountId) -> Option<&Position> {
        self.positions.get(&account)
    }

    pub fn contains(&self, account: AccountId) -> bool {
        self.positions.contains_key(&account)
    }

    /// Stores a record. Zero-size records are dropped instead of stored.
    pub fn insert(&mut self, position: Position) -> Option<Position> {
        if position.size == 0 {
            return self.positions.remove(&position.account);
        }
        self.positions.insert(position.account, position)
    }

    pub fn remove(&mut self, account: AccountId) -> Option<Position> {
        self.positions.remove(&account)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &Position)> {
        self.positions.iter()
    }

    pub fn total_margin(&self) -> u128 {
        self.positions
            .values()
            .fold(0u128, |acc, p| acc.saturating_add(p.margin))
    }
}

// 4.1: what closing `close_size` of a position releases, and what is left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosePlan {
    pub closed_size: u64,
    pub margin_share: u128,
    pub price_pnl: u128,
    pub funding_pnl: u128,
    /// margin_share + pnl for the closed portion
    pub equity_released: i128,
    /// None when the whole position is closed
    pub remaining: Option<Position>,
}

impl ClosePlan {
    pub fn pnl(&self) -> u128 {
        self.price_pnl.saturating_add(self.funding_pnl)
    }

    pub fn is_full_close(&self) -> bool {
        self.remaining.is_none()
    }
}

// floor(margin * close / size). truncation stays with the ledger, not the trader.
pub fn margin_share(margin: u128, close_size: u64, size: u64) -> u128 {
    if size == 0 {
        return 0;
    }
    match margin.checked_mul(close_size as u128) {
        Some(scaled) => scaled / size as u128,
        // margin too large to scale directly; split into whole and fractional parts
        None => {
            let whole = margin / size as u128;
            let rest = margin % size as u128;
            whole * close_size as u128 + rest * close_size as u128 / size as u128
        }
    }
}

/// Caller guarantees `0 < close_size <= position.size`.
pub fn plan_close(
    position: &Position,
    close_size: u64,
    market: &MarketState,
    timestamp: Timestamp,
) -> ClosePlan {
    debug_assert!(close_size > 0 && close_size <= position.size);

    let mark = market.mark_price;
    let share = margin_share(position.margin, close_size, position.size);
    let price = price_pnl(mark, position.entry_price, close_size);
    let funding = funding_pnl(
        mark,
        close_size,
        position.side,
        market.cumulative_funding(),
        position.funding_snapshot,
    );
    let equity_released = to_signed(share)
        .saturating_add(to_signed(price))
        .saturating_add(to_signed(funding));

    let remaining_size = position.size - close_size;
    let remaining = (remaining_size > 0).then(|| Position {
        size: remaining_size,
        margin: position.margin - share,
        updated_at: timestamp,
        ..position.clone()
    });

    ClosePlan {
        closed_size: close_size,
        margin_share: share,
        price_pnl: price,
        funding_pnl: funding,
        equity_released,
        remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketConfig;
    use crate::types::PairId;

    fn market_id() -> MarketId {
        MarketId::new(AccountId(1), PairId(1))
    }

    fn market(mark: u64) -> MarketState {
        MarketState::new(
            market_id(),
            MarketConfig::btc_perp(),
            Price(mark),
            AccountId(10),
            AccountId(11),
            Timestamp::from_secs(0),
        )
    }

    fn test_position(size: u64, margin: u128) -> Position {
        Position {
            market: market_id(),
            account: AccountId(5),
            side: Side::Long,
            size,
            entry_price: Price(100),
            margin,
            leverage: Leverage(1_000),
            funding_snapshot: 0,
            opened_at: Timestamp::from_secs(0),
            updated_at: Timestamp::from_secs(0),
        }
    }

    #[test]
    fn margin_share_floors() {
        // 7 * 1 / 3 = 2.33 -> 2
        assert_eq!(margin_share(7, 1, 3), 2);
        assert_eq!(margin_share(7, 3, 3), 7);
        assert_eq!(margin_share(10, 1, 4), 2);
    }

    #[test]
    fn margin_share_survives_huge_margin() {
        let margin = u128::MAX - 1;
        assert_eq!(margin_share(margin, 2, 2), margin);
        assert_eq!(margin_share(margin, 1, 2), margin / 2);
    }

    #[test]
    fn partial_close_shrinks_pro_rata() {
        let pos = test_position(3, 7);
        let plan = plan_close(&pos, 1, &market(100), Timestamp::from_secs(5));

        assert_eq!(plan.margin_share, 2);
        assert_eq!(plan.equity_released, 2);
        let rest = plan.remaining.unwrap();
        assert_eq!(rest.size, 2);
        assert_eq!(rest.margin, 5);
        assert_eq!(rest.entry_price, Price(100)); // unchanged on reduction
        assert_eq!(rest.updated_at, Timestamp::from_secs(5));
    }

    #[test]
    fn full_close_leaves_nothing() {
        let pos = test_position(3, 7);
        let plan = plan_close(&pos, 3, &market(100), Timestamp::from_secs(5));

        assert!(plan.is_full_close());
        assert_eq!(plan.margin_share, 7);
        assert_eq!(plan.equity_released, 7);
    }

    #[test]
    fn close_adds_price_magnitude() {
        let pos = test_position(10, 1_000);
        // price fell 20 ticks: a long still gets +20 per unit
        let plan = plan_close(&pos, 5, &market(80), Timestamp::from_secs(5));

        assert_eq!(plan.price_pnl, 100);
        assert_eq!(plan.equity_released, 500 + 100);
    }

    #[test]
    fn store_drops_zero_size_records() {
        let mut store = PositionStore::new();
        store.insert(test_position(3, 7));
        assert!(store.contains(AccountId(5)));

        store.insert(test_position(0, 0));
        assert!(!store.contains(AccountId(5)));
        assert!(store.is_empty());
    }

    #[test]
    fn store_totals_margin() {
        let mut store = PositionStore::new();
        store.insert(test_position(3, 7));
        let mut other = test_position(1, 5);
        other.account = AccountId(6);
        store.insert(other);

        assert_eq!(store.len(), 2);
        assert_eq!(store.total_margin(), 12);
    }
}
