// 8.2 engine/shared.rs: thread-safe ledger. the registry lock is held only long enough to find
// or insert a book; each call then holds its market's mutex for its whole duration. calls on
// different markets run in parallel, calls on the same market serialize.
// no event log here, transitions go to tracing only.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use super::book::MarketBook;
use super::core::rejected;
use super::results::{
    CloseResult, FundingOutcome, InvalidArgument, LedgerError, LiquidationResult, OpenRequest,
};
use crate::governance::{Governance, NoGovernance};
use crate::margin::HealthReport;
use crate::market::{MarketConfig, MarketState};
use crate::oracle::Role;
use crate::position::Position;
use crate::types::{AccountId, MarketId, PairId, Price, Timestamp};
use crate::vault::{MarginVault, NoopVault};

type BookHandle = Arc<Mutex<MarketBook>>;

#[derive(Debug)]
pub struct SharedLedger<V: MarginVault = NoopVault, G: Governance = NoGovernance> {
    books: RwLock<HashMap<MarketId, BookHandle>>,
    vault: V,
    governance: G,
    clock: AtomicU64,
}

impl SharedLedger {
    pub fn new() -> Self {
        Self::with_seams(NoopVault, NoGovernance)
    }
}

impl Default for SharedLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: MarginVault, G: Governance> SharedLedger<V, G> {
    pub fn with_seams(vault: V, governance: G) -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
            vault,
            governance,
            clock: AtomicU64::new(0),
        }
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    pub fn set_time(&self, timestamp: Timestamp) {
        self.clock.store(timestamp.as_secs(), Ordering::SeqCst);
    }

    pub fn time(&self) -> Timestamp {
        Timestamp::from_secs(self.clock.load(Ordering::SeqCst))
    }

    pub fn create_market(
        &self,
        admin: AccountId,
        pair: PairId,
        config: MarketConfig,
        initial_price: Price,
        price_oracle: AccountId,
        funding_oracle: AccountId,
    ) -> Result<MarketId, LedgerError> {
        let id = MarketId::new(admin, pair);
        let mut books = self.books.write().unwrap_or_else(|p| p.into_inner());
        if books.contains_key(&id) {
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
            self.time(),
        );
        books.insert(id, Arc::new(Mutex::new(MarketBook::new(state))));
        tracing::debug!(market = %id, "market created");
        Ok(id)
    }

    pub fn market_count(&self) -> usize {
        self.books.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Snapshot of the market's current state.
    pub fn get_market(&self, market: MarketId) -> Result<MarketState, LedgerError> {
        let handle = self.handle(market)?;
        let book = lock(&handle);
        Ok(book.market().clone())
    }

    pub fn get_mark_price(&self, market: MarketId) -> Result<Price, LedgerError> {
        let handle = self.handle(market)?;
        let price = lock(&handle).market().mark_price;
        Ok(price)
    }

    pub fn get_cumulative_funding(&self, market: MarketId) -> Result<i128, LedgerError> {
        let handle = self.handle(market)?;
        let index = lock(&handle).market().cumulative_funding();
        Ok(index)
    }

    pub fn get_position(&self, market: MarketId, account: AccountId) -> Option<Position> {
        let handle = self.handle(market).ok()?;
        let position = lock(&handle).position(account).cloned();
        position
    }

    pub fn position_health(
        &self,
        market: MarketId,
        account: AccountId,
    ) -> Result<HealthReport, LedgerError> {
        let handle = self.handle(market)?;
        let report = lock(&handle).health(account);
        report
    }

    pub fn set_mark_price(
        &self,
        caller: AccountId,
        market: MarketId,
        price: Price,
    ) -> Result<(), LedgerError> {
        self.with_book("set_mark_price", market, |book| {
            book.set_mark_price(caller, price).map(|_| ())
        })
    }

    pub fn push_funding(
        &self,
        caller: AccountId,
        market: MarketId,
        seed: u128,
        now: Timestamp,
    ) -> Result<FundingOutcome, LedgerError> {
        self.with_book("push_funding", market, |book| book.push_funding(caller, seed, now))
    }

    pub fn open(
        &self,
        caller: AccountId,
        market: MarketId,
        request: OpenRequest,
    ) -> Result<Position, LedgerError> {
        let now = self.time();
        self.with_book("open", market, |book| {
            book.open(caller, &request, &self.vault, now)
        })
    }

    pub fn close(
        &self,
        caller: AccountId,
        market: MarketId,
        account: AccountId,
        size_to_close: u64,
    ) -> Result<CloseResult, LedgerError> {
        let now = self.time();
        let result = self.with_book("close", market, |book| {
            book.close(account, size_to_close, &self.vault, now)
        })?;
        tracing::debug!(market = %market, closed_by = %caller, account = %account, "close settled");
        Ok(result)
    }

    pub fn liquidate(
        &self,
        caller: AccountId,
        market: MarketId,
        victim: AccountId,
    ) -> Result<LiquidationResult, LedgerError> {
        self.with_book("liquidate", market, |book| {
            book.liquidate(caller, victim, &self.vault)
        })
    }

    pub fn update_risk_params(
        &self,
        caller: AccountId,
        market: MarketId,
        config: MarketConfig,
    ) -> Result<(), LedgerError> {
        let handle = self
            .handle(market)
            .map_err(|e| rejected("update_risk_params", e))?;
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
        let mut book = lock(&handle);
        book.replace_config(config)
            .map(|_| ())
            .map_err(|e| rejected("update_risk_params", e))
    }

    fn handle(&self, market: MarketId) -> Result<BookHandle, LedgerError> {
        self.books
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(&market)
            .cloned()
            .ok_or(LedgerError::MarketNotFound(market))
    }

    fn with_book<T>(
        &self,
        operation: &'static str,
        market: MarketId,
        f: impl FnOnce(&mut MarketBook) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let handle = self.handle(market).map_err(|e| rejected(operation, e))?;
        let mut book = lock(&handle);
        f(&mut book).map_err(|e| rejected(operation, e))
    }
}

// a panic mid-call can only happen before the book is mutated, so a poisoned book is still valid
fn lock(handle: &BookHandle) -> MutexGuard<'_, MarketBook> {
    handle.lock().unwrap_or_else(|p| p.into_inner())
}
