// 8.0 engine/core.rs: single-writer ledger. holds every market book, the vault and governance
// seams, the event log and a logical clock.

use super::book::MarketBook;
use super::config::LedgerConfig;
use super::results::{InvalidArgument, LedgerError};
use crate::events::{
    Event, EventLog, EventPayload, MarketCreatedEvent, RiskParamsUpdatedEvent,
};
use crate::governance::{Governance, NoGovernance};
use crate::margin::HealthReport;
use crate::market::{MarketConfig, MarketState};
use crate::oracle::Role;
use crate::position::Position;
use crate::types::{AccountId, MarketId, PairId, Price, Timestamp};
use crate::vault::{MarginVault, NoopVault};
use std::collections::HashMap;

/** 8.1: main ledger struct. all state lives here */
#[derive(Debug)]
pub struct Ledger<V: MarginVault = NoopVault, G: Governance = NoGovernance> {
    pub(super) config: LedgerConfig,
    pub(super) books: HashMap<MarketId, MarketBook>,
    pub(super) vault: V,
    pub(super) governance: G,
    pub(super) events: EventLog,
    pub(super) current_time: Timestamp,
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_seams(config, NoopVault, NoGovernance)
    }
}

impl<V: MarginVault, G: Governance> Ledger<V, G> {
    pub fn with_seams(config: LedgerConfig, vault: V, governance: G) -> Self {
        let events = EventLog::new(config.max_events);
        Self {
            config,
            books: HashMap::new(),
            vault,
            governance,
            events,
            current_time: Timestamp::default(),
        }
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, secs: u64) {
        self.current_time = self.current_time.plus_secs(secs);
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    pub fn governance(&self) -> &G {
        &self.governance
    }

    /// Creates a market under the caller's namespace. The caller becomes its admin.
    pub fn create_market(
        &mut self,
        admin: AccountId,
        pair: PairId,
        config: MarketConfig,
        initial_price: Price,
        price_oracle: AccountId,
        funding_oracle: AccountId,
    ) -> Result<MarketId, LedgerError> {
        let id = MarketId::new(admin, pair);
        if self.books.contains_key(&id) {
            return Err(rejected("create_market", LedgerError::MarketExists(id)));
        }
        config
            .validate()
            .map_err(|e| rejected("create_market", InvalidArgument::from(e).into()))?;

        let state = MarketState::new(
            id,
            config,
            initial_price,
            price_oracle,
            funding_oracle,
            self.current_time,
        );
        self.books.insert(id, MarketBook::new(state));
        tracing::debug!(market = %id, "market created");

        self.emit_event(EventPayload::MarketCreated(MarketCreatedEvent {
            market: id,
            config,
            initial_price,
            price_oracle,
            funding_oracle,
        }));

        Ok(id)
    }

    pub fn get_market(&self, market: MarketId) -> Result<&MarketState, LedgerError> {
        self.book(market).map(MarketBook::market)
    }

    pub fn markets(&self) -> impl Iterator<Item = &MarketState> {
        self.books.values().map(MarketBook::market)
    }

    pub fn get_mark_price(&self, market: MarketId) -> Result<Price, LedgerError> {
        Ok(self.book(market)?.market().mark_price)
    }

    pub fn get_cumulative_funding(&self, market: MarketId) -> Result<i128, LedgerError> {
        Ok(self.book(market)?.market().cumulative_funding())
    }

    /// Never fails: a missing market or position is just `None`.
    pub fn get_position(&self, market: MarketId, account: AccountId) -> Option<&Position> {
        self.books.get(&market)?.position(account)
    }

    pub fn position_health(
        &self,
        market: MarketId,
        account: AccountId,
    ) -> Result<HealthReport, LedgerError> {
        self.book(market)?.health(account)
    }

    /// Governance-gated risk parameter change.
    pub fn update_risk_params(
        &mut self,
        caller: AccountId,
        market: MarketId,
        config: MarketConfig,
    ) -> Result<(), LedgerError> {
        if !self.books.contains_key(&market) {
            return Err(rejected("update_risk_params", LedgerError::MarketNotFound(market)));
        }
        if !self.governance.may_update(caller, market) {
            return Err(rejected(
                "update_risk_params",
                LedgerError::PermissionDenied {
                    market,
                    caller,
                    role: Role::Governance,
                },
            ));
        }

        let old_config = self
            .book_mut(market)?
            .replace_config(config)
            .map_err(|e| rejected("update_risk_params", e))?;

        self.emit_event(EventPayload::RiskParamsUpdated(RiskParamsUpdatedEvent {
            market,
            updated_by: caller,
            old_config,
            new_config: config,
        }));
        Ok(())
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        self.events.recent(count)
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub(super) fn book(&self, market: MarketId) -> Result<&MarketBook, LedgerError> {
        self.books
            .get(&market)
            .ok_or(LedgerError::MarketNotFound(market))
    }

    pub(super) fn book_mut(&mut self, market: MarketId) -> Result<&mut MarketBook, LedgerError> {
        self.books
            .get_mut(&market)
            .ok_or(LedgerError::MarketNotFound(market))
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        if self.config.trace_events {
            tracing::info!(market = %payload.market(), event = ?payload, "ledger event");
        }
        self.events.push(self.current_time, payload);
    }
}

// logs a rejected call and hands the error back unchanged
pub(crate) fn rejected(operation: &'static str, err: LedgerError) -> LedgerError {
    tracing::debug!(operation, kind = %err.kind(), error = %err, "call rejected");
    err
}
