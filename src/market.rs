//! Market configuration and state.
//!
//! A market is one trading pair under one admin. It owns its risk
//! configuration and the scalar state the oracles push: mark price and
//! the cumulative funding index. Trading calls never write to it.

use crate::funding::FundingState;
use crate::types::{AccountId, Bps, Leverage, MarketId, Price, Timestamp, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};

/// Risk configuration. Only governance can change it after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Highest leverage a position may request (leverage-bps, 100 = 1x)
    pub max_leverage: Leverage,
    /// Percentage floor for initial margin
    pub initial_margin: Bps,
    /// Health threshold; must not exceed initial margin
    pub maintenance_margin: Bps,
    /// Funding rate band, symmetric around zero, per hour
    pub max_funding_per_hour: Bps,
}

impl MarketConfig {
    /// 50x, 20% initial floor, 10% maintenance, 0.5%/h funding cap
    pub fn btc_perp() -> Self {
        Self {
            max_leverage: Leverage(5_000),
            initial_margin: Bps(2_000),
            maintenance_margin: Bps(1_000),
            max_funding_per_hour: Bps(50),
        }
    }

    pub fn eth_perp() -> Self {
        Self {
            max_leverage: Leverage(2_500),
            initial_margin: Bps(2_500),
            maintenance_margin: Bps(1_250),
            max_funding_per_hour: Bps(75),
        }
    }

    /// Low leverage, wide buffer between initial and maintenance
    pub fn conservative() -> Self {
        Self {
            max_leverage: Leverage(1_000),
            initial_margin: Bps(5_000),
            maintenance_margin: Bps(2_000),
            max_funding_per_hour: Bps(25),
        }
    }

    pub fn validate(&self) -> Result<(), MarketConfigError> {
        if self.max_leverage.is_zero() {
            return Err(MarketConfigError::ZeroMaxLeverage);
        }
        if self.maintenance_margin > self.initial_margin {
            return Err(MarketConfigError::MaintenanceAboveInitial {
                maintenance: self.maintenance_margin,
                initial: self.initial_margin,
            });
        }
        if self.initial_margin.value() as u128 > BPS_DENOMINATOR {
            return Err(MarketConfigError::RatioAboveFull(self.initial_margin));
        }
        if self.max_funding_per_hour.value() as u128 > BPS_DENOMINATOR {
            return Err(MarketConfigError::FundingCapAboveFull(self.max_funding_per_hour));
        }
        Ok(())
    }
}

/// Mutable market state. Exclusively owned by its book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketState {
    pub id: MarketId,
    pub config: MarketConfig,
    pub mark_price: Price,
    pub funding: FundingState,
    /// Only address allowed to push prices
    pub price_oracle: AccountId,
    /// Only address allowed to push funding seeds
    pub funding_oracle: AccountId,
    pub created_at: Timestamp,
}

impl MarketState {
    pub fn new(
        id: MarketId,
        config: MarketConfig,
        initial_price: Price,
        price_oracle: AccountId,
        funding_oracle: AccountId,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            config,
            mark_price: initial_price,
            funding: FundingState::new(timestamp),
            price_oracle,
            funding_oracle,
            created_at: timestamp,
        }
    }

    pub fn cumulative_funding(&self) -> i128 {
        self.funding.cumulative_index
    }

    pub fn admin(&self) -> AccountId {
        self.id.admin
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarketConfigError {
    #[error("max leverage must be positive")]
    ZeroMaxLeverage,

    #[error("maintenance margin {maintenance} exceeds initial margin {initial}")]
    MaintenanceAboveInitial { maintenance: Bps, initial: Bps },

    #[error("margin ratio {0} exceeds 100%")]
    RatioAboveFull(Bps),

    #[error("funding cap {0} per hour exceeds 100%")]
    FundingCapAboveFull(Bps),
}
