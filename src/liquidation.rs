// 6.0: liquidation detection. a position is eligible only while health < 0.
// health == 0 is still safe. payout to the liquidator and socializing negative equity are not
// done here: the ledger hands a LiquidationNotice to the vault and deletes the position.

use crate::margin::{health_report, HealthReport};
use crate::market::MarketState;
use crate::position::Position;
use crate::types::{AccountId, MarketId, Price, Side};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidationStatus {
    Healthy { health: i128 },
    Liquidatable { health: i128, equity: i128 },
}

impl LiquidationStatus {
    pub fn is_liquidatable(&self) -> bool {
        matches!(self, LiquidationStatus::Liquidatable { .. })
    }

    pub fn health(&self) -> i128 {
        match self {
            LiquidationStatus::Healthy { health } => *health,
            LiquidationStatus::Liquidatable { health, .. } => *health,
        }
    }
}

pub fn evaluate_liquidation(position: &Position, market: &MarketState) -> LiquidationStatus {
    classify(&health_report(position, market))
}

pub fn classify(report: &HealthReport) -> LiquidationStatus {
    if report.is_liquidatable() {
        LiquidationStatus::Liquidatable {
            health: report.health,
            equity: report.equity(),
        }
    } else {
        LiquidationStatus::Healthy {
            health: report.health,
        }
    }
}

/// Everything a custody layer needs to settle a liquidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationNotice {
    pub market: MarketId,
    pub victim: AccountId,
    pub liquidator: AccountId,
    pub side: Side,
    pub size: u64,
    pub mark_price: Price,
    pub locked_margin: u128,
    /// Full-position equity. May be any sign.
    pub equity: i128,
    pub health: i128,
}
