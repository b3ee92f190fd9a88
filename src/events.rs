// 11.0: every accepted state change produces an event. used for audit trails and
// notifying external systems. rejected calls and no-op funding pushes produce nothing.

use crate::market::MarketConfig;
use crate::types::{AccountId, Leverage, MarketId, Price, Side, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    // Market events
    MarketCreated(MarketCreatedEvent),
    RiskParamsUpdated(RiskParamsUpdatedEvent),

    // Oracle events
    MarkPriceUpdated(MarkPriceUpdatedEvent),
    FundingAccrued(FundingAccruedEvent),

    // Position events
    PositionOpened(PositionOpenedEvent),
    PositionClosed(PositionClosedEvent),
    PositionLiquidated(PositionLiquidatedEvent),
}

impl EventPayload {
    pub fn market(&self) -> MarketId {
        match self {
            EventPayload::MarketCreated(e) => e.market,
            EventPayload::RiskParamsUpdated(e) => e.market,
            EventPayload::MarkPriceUpdated(e) => e.market,
            EventPayload::FundingAccrued(e) => e.market,
            EventPayload::PositionOpened(e) => e.market,
            EventPayload::PositionClosed(e) => e.market,
            EventPayload::PositionLiquidated(e) => e.market,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketCreatedEvent {
    pub market: MarketId,
    pub config: MarketConfig,
    pub initial_price: Price,
    pub price_oracle: AccountId,
    pub funding_oracle: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskParamsUpdatedEvent {
    pub market: MarketId,
    pub updated_by: AccountId,
    pub old_config: MarketConfig,
    pub new_config: MarketConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkPriceUpdatedEvent {
    pub market: MarketId,
    pub old_price: Price,
    pub new_price: Price,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingAccruedEvent {
    pub market: MarketId,
    pub rate_bps_per_hour: i64,
    pub hours: u64,
    pub cumulative_index: i128,
    pub accrued_through: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionOpenedEvent {
    pub market: MarketId,
    pub account: AccountId,
    pub side: Side,
    pub size: u64,
    pub entry_price: Price,
    /// Price the caller quoted, if any. Never used for valuation.
    pub quoted_price: Option<Price>,
    pub margin: u128,
    pub leverage: Leverage,
    pub funding_snapshot: i128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionClosedEvent {
    pub market: MarketId,
    pub account: AccountId,
    pub closed_by: AccountId,
    pub closed_size: u64,
    pub remaining_size: u64,
    pub exit_price: Price,
    pub margin_released: u128,
    pub pnl: u128,
    pub equity_released: i128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionLiquidatedEvent {
    pub market: MarketId,
    pub account: AccountId,
    pub liquidator: AccountId,
    pub size: u64,
    pub liquidation_price: Price,
    pub health: i128,
    pub equity: i128,
}

/// Bounded in-memory event log. Oldest events are dropped past capacity.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: Vec<Event>,
    next_id: u64,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Vec::new(),
            next_id: 1,
            capacity,
        }
    }

    pub fn push(&mut self, timestamp: Timestamp, payload: EventPayload) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        self.events.push(Event::new(id, timestamp, payload));

        if self.events.len() > self.capacity {
            let drain_count = self.events.len() - self.capacity;
            self.events.drain(0..drain_count);
        }

        id
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn recent(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub fn last_id(&self) -> Option<EventId> {
        (self.next_id > 1).then(|| EventId(self.next_id - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PairId;

    fn price_event(new_price: u64) -> EventPayload {
        EventPayload::MarkPriceUpdated(MarkPriceUpdatedEvent {
            market: MarketId::new(AccountId(1), PairId(1)),
            old_price: Price(1),
            new_price: Price(new_price),
        })
    }

    #[test]
    fn ids_are_sequential() {
        let mut log = EventLog::new(10);
        log.push(Timestamp::from_secs(1), price_event(2));
        log.push(Timestamp::from_secs(2), price_event(3));

        assert_eq!(log.events()[0].id, EventId(1));
        assert_eq!(log.events()[1].id, EventId(2));
        assert_eq!(log.last_id(), Some(EventId(2)));
    }

    #[test]
    fn log_is_bounded() {
        let mut log = EventLog::new(2);
        for price in 0..5 {
            log.push(Timestamp::from_secs(price), price_event(price));
        }

        assert_eq!(log.events().len(), 2);
        assert_eq!(log.events()[0].id, EventId(4));
        assert_eq!(log.recent(1)[0].id, EventId(5));
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut log = EventLog::new(0);
        let id = log.push(Timestamp::from_secs(1), price_event(2));

        assert_eq!(id, EventId(1));
        assert!(log.events().is_empty());
        assert_eq!(log.last_id(), Some(EventId(1)));
    }

    #[test]
    fn payload_knows_its_market() {
        let market = MarketId::new(AccountId(1), PairId(1));
        assert_eq!(price_event(5).market(), market);
    }
}
