//! Margin and health calculation.
//!
//! Initial margin is the stricter of the leverage bound
//! (`notional / leverage_bps`) and the percentage floor
//! (`notional * initial_bps / 10_000`). Maintenance margin is a flat
//! percentage of notional at the mark price.
//!
//! Price and funding PnL are magnitudes: they measure how far the
//! price or funding index moved, scaled by size, and ignore which side
//! the position is on. A long and a short of the same size see the same
//! contribution. Health is `margin + price_pnl + funding_pnl - maintenance`
//! and a position is liquidatable only while health is negative.

use crate::funding::index_movement;
use crate::market::MarketState;
use crate::position::Position;
use crate::types::{scale_bps, to_signed, Bps, Leverage, Price, Side};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

pub fn notional(price: Price, size: u64) -> u128 {
    price.ticks() as u128 * size as u128
}

pub fn required_initial_margin(notional: u128, leverage: Leverage, initial: Bps) -> u128 {
    let by_leverage = if leverage.is_zero() {
        notional
    } else {
        notional / leverage.bps() as u128
    };
    let by_floor = initial.apply(notional);
    by_leverage.max(by_floor)
}

pub fn maintenance_margin(notional: u128, maintenance: Bps) -> u128 {
    maintenance.apply(notional)
}

pub fn price_pnl(mark_price: Price, entry_price: Price, size: u64) -> u128 {
    mark_price.abs_diff(entry_price) as u128 * size as u128
}

// side is taken so callers read naturally; the magnitude does not depend on it
pub fn funding_pnl(
    mark_price: Price,
    size: u64,
    _side: Side,
    cumulative_now: i128,
    cumulative_at_open: i128,
) -> u128 {
    scale_bps(
        notional(mark_price, size),
        index_movement(cumulative_now, cumulative_at_open),
    )
}

/// Health snapshot of one position against its market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    pub notional: u128,
    pub margin: u128,
    pub price_pnl: u128,
    pub funding_pnl: u128,
    pub maintenance: u128,
    pub health: i128,
}

impl HealthReport {
    pub fn is_liquidatable(&self) -> bool {
        self.health < 0
    }

    /// margin + pnl, before the maintenance deduction
    pub fn equity(&self) -> i128 {
        to_signed(self.margin)
            .saturating_add(to_signed(self.price_pnl))
            .saturating_add(to_signed(self.funding_pnl))
    }
}

pub fn health_report(position: &Position, market: &MarketState) -> HealthReport {
    let mark = market.mark_price;
    let notional = notional(mark, position.size);
    let price_pnl = price_pnl(mark, position.entry_price, position.size);
    let funding_pnl = funding_pnl(
        mark,
        position.size,
        position.side,
        market.cumulative_funding(),
        position.funding_snapshot,
    );
    let maintenance = maintenance_margin(notional, market.config.maintenance_margin);

    let health = to_signed(position.margin)
        .saturating_add(to_signed(price_pnl))
        .saturating_add(to_signed(funding_pnl))
        .saturating_sub(to_signed(maintenance));

    HealthReport {
        notional,
        margin: position.margin,
        price_pnl,
        funding_pnl,
        maintenance,
        health,
    }
}

pub fn health(position: &Position, market: &MarketState) -> i128 {
    health_report(position, market).health
}

pub fn is_liquidatable(position: &Position, market: &MarketState) -> bool {
    health(position, market) < 0
}

// reporting only. health as a fraction of notional
pub fn margin_ratio(health: i128, notional: u128) -> Decimal {
    if notional == 0 {
        return Decimal::MAX;
    }
    match (Decimal::from_i128(health), Decimal::from_u128(notional)) {
        (Some(h), Some(n)) => h / n,
        _ => Decimal::ZERO,
    }
}
