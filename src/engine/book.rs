//! Per-market lifecycle.
//!
//! A `MarketBook` owns one market and every position on it. All calls
//! that touch the same market go through the same book, so holding the
//! book exclusively (`&mut`) for the length of a call is the lock. Each
//! operation validates everything first, then calls the vault's fallible
//! hook, then mutates; a rejected call changes nothing.

use tracing::{debug, trace};

use super::results::{
    CloseResult, FundingOutcome, InvalidArgument, InvalidState, LedgerError, LiquidationResult,
    OpenRequest,
};
use crate::funding::accrue;
use crate::liquidation::{classify, LiquidationNotice, LiquidationStatus};
use crate::margin::{health_report, notional, required_initial_margin, HealthReport};
use crate::market::{MarketConfig, MarketState};
use crate::oracle::{authorize, Role};
use crate::position::{plan_close, Position, PositionStore};
use crate::types::{AccountId, Price, Timestamp};
use crate::vault::MarginVault;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketBook {
    market: MarketState,
    positions: PositionStore,
}

impl MarketBook {
    pub fn new(market: MarketState) -> Self {
        Self {
            market,
            positions: PositionStore::new(),
        }
    }

    pub fn market(&self) -> &MarketState {
        &self.market
    }

    pub fn positions(&self) -> &PositionStore {
        &self.positions
    }

    pub fn position(&self, account: AccountId) -> Option<&Position> {
        self.positions.get(account)
    }

    fn require_position(&self, account: AccountId) -> Result<&Position, LedgerError> {
        self.positions
            .get(account)
            .ok_or(LedgerError::PositionNotFound {
                market: self.market.id,
                account,
            })
    }

    pub fn health(&self, account: AccountId) -> Result<HealthReport, LedgerError> {
        let position = self.require_position(account)?;
        Ok(health_report(position, &self.market))
    }

    /// Overwrites the mark price. No staleness or sanity check. Returns the old price.
    pub fn set_mark_price(&mut self, caller: AccountId, price: Price) -> Result<Price, LedgerError> {
        authorize(&self.market, caller, Role::PriceOracle)?;

        let old = self.market.mark_price;
        self.market.mark_price = price;
        debug!(market = %self.market.id, old = %old, new = %price, "mark price set");
        Ok(old)
    }

    pub fn push_funding(
        &mut self,
        caller: AccountId,
        seed: u128,
        now: Timestamp,
    ) -> Result<FundingOutcome, LedgerError> {
        authorize(&self.market, caller, Role::FundingOracle)?;

        let cap = self.market.config.max_funding_per_hour;
        match accrue(&self.market.funding, seed, now, cap) {
            Ok(accrual) => {
                self.market.funding.apply(&accrual);
                debug!(
                    market = %self.market.id,
                    rate = accrual.rate,
                    hours = accrual.hours,
                    index = accrual.new_index,
                    "funding accrued"
                );
                Ok(FundingOutcome::Accrued(accrual))
            }
            Err(skip) => {
                trace!(market = %self.market.id, ?skip, "funding push skipped");
                Ok(FundingOutcome::Skipped(skip))
            }
        }
    }

    pub fn open(
        &mut self,
        caller: AccountId,
        request: &OpenRequest,
        vault: &dyn MarginVault,
        now: Timestamp,
    ) -> Result<Position, LedgerError> {
        let config = &self.market.config;

        if request.size == 0 {
            return Err(InvalidArgument::ZeroSize.into());
        }
        if request.leverage.is_zero() {
            return Err(InvalidArgument::ZeroLeverage.into());
        }
        if request.leverage > config.max_leverage {
            return Err(InvalidArgument::LeverageAboveMax {
                requested: request.leverage,
                max: config.max_leverage,
            }
            .into());
        }

        let mark = self.market.mark_price;
        let required = required_initial_margin(
            notional(mark, request.size),
            request.leverage,
            config.initial_margin,
        );
        if request.margin < required {
            return Err(InvalidArgument::InsufficientMargin {
                provided: request.margin,
                required,
            }
            .into());
        }

        if self.positions.contains(caller) {
            return Err(LedgerError::PositionExists {
                market: self.market.id,
                account: caller,
            });
        }

        vault
            .lock(caller, request.margin)
            .map_err(InvalidArgument::from)?;

        let position = Position {
            market: self.market.id,
            account: caller,
            side: request.side,
            size: request.size,
            entry_price: mark,
            margin: request.margin,
            leverage: request.leverage,
            funding_snapshot: self.market.cumulative_funding(),
            opened_at: now,
            updated_at: now,
        };
        self.positions.insert(position.clone());

        debug!(
            market = %self.market.id,
            account = %caller,
            side = %position.side,
            size = position.size,
            entry = %position.entry_price,
            margin = position.margin,
            "position opened"
        );
        Ok(position)
    }

    pub fn close(
        &mut self,
        account: AccountId,
        size_to_close: u64,
        vault: &dyn MarginVault,
        now: Timestamp,
    ) -> Result<CloseResult, LedgerError> {
        let position = self.require_position(account)?;

        if size_to_close == 0 {
            return Err(InvalidArgument::ZeroCloseSize.into());
        }
        if size_to_close > position.size {
            return Err(InvalidArgument::CloseExceedsPosition {
                requested: size_to_close,
                size: position.size,
            }
            .into());
        }

        let plan = plan_close(position, size_to_close, &self.market, now);
        // magnitudes keep this non-negative today; the guard stays for signed PnL
        if plan.equity_released < 0 {
            return Err(InvalidState::NegativeEquity {
                equity: plan.equity_released,
            }
            .into());
        }

        vault.unlock(account, plan.margin_share);
        let pnl = plan.pnl();
        if pnl > 0 {
            vault.payout(account, pnl);
        }

        match &plan.remaining {
            Some(rest) => {
                self.positions.insert(rest.clone());
            }
            None => {
                self.positions.remove(account);
            }
        }

        debug!(
            market = %self.market.id,
            account = %account,
            closed = plan.closed_size,
            margin_released = plan.margin_share,
            pnl,
            deleted = plan.is_full_close(),
            "position closed"
        );

        Ok(CloseResult {
            closed_size: plan.closed_size,
            margin_released: plan.margin_share,
            price_pnl: plan.price_pnl,
            funding_pnl: plan.funding_pnl,
            equity_released: plan.equity_released,
            remaining: plan.remaining,
        })
    }

    /// Deletes the victim's position when its health is negative. Whatever
    /// the equity, settlement is left to the vault's `on_liquidation`.
    pub fn liquidate(
        &mut self,
        liquidator: AccountId,
        victim: AccountId,
        vault: &dyn MarginVault,
    ) -> Result<LiquidationResult, LedgerError> {
        let position = self.require_position(victim)?;
        let report = health_report(position, &self.market);

        let (health, equity) = match classify(&report) {
            LiquidationStatus::Healthy { health } => {
                return Err(InvalidState::PositionHealthy { health }.into());
            }
            LiquidationStatus::Liquidatable { health, equity } => (health, equity),
        };

        let notice = LiquidationNotice {
            market: self.market.id,
            victim,
            liquidator,
            side: position.side,
            size: position.size,
            mark_price: self.market.mark_price,
            locked_margin: position.margin,
            equity,
            health,
        };

        self.positions.remove(victim);
        vault.on_liquidation(&notice);

        debug!(
            market = %self.market.id,
            victim = %victim,
            liquidator = %liquidator,
            health,
            equity,
            "position liquidated"
        );

        Ok(LiquidationResult {
            market: notice.market,
            account: victim,
            liquidator,
            size: notice.size,
            liquidation_price: notice.mark_price,
            locked_margin: notice.locked_margin,
            health,
            equity,
        })
    }

    /// Swaps in a new risk config. Authorization is the caller's job. Returns the old config.
    pub fn replace_config(&mut self, config: MarketConfig) -> Result<MarketConfig, LedgerError> {
        config.validate().map_err(InvalidArgument::from)?;
        let old = std::mem::replace(&mut self.market.config, config);
        debug!(market = %self.market.id, ?old, new = ?config, "risk params replaced");
        Ok(old)
    }
}
