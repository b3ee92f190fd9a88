// 8.0.2: result types and errors for ledger operations.
// every failure maps to one of five kinds. a failed call never leaves partial state behind.

use crate::funding::{FundingAccrual, FundingSkip};
use crate::market::MarketConfigError;
use crate::oracle::Role;
use crate::position::Position;
use crate::types::{AccountId, Leverage, MarketId, Price, Side};
use crate::vault::VaultError;
use std::fmt;

/// Arguments for opening a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenRequest {
    pub side: Side,
    pub size: u64,
    pub leverage: Leverage,
    pub margin: u128,
    /// Price the caller saw. Entry is always the current mark price.
    pub quoted_price: Option<Price>,
}

impl OpenRequest {
    pub fn new(side: Side, size: u64, leverage: Leverage, margin: u128) -> Self {
        Self {
            side,
            size,
            leverage,
            margin,
            quoted_price: None,
        }
    }

    pub fn quoted_at(mut self, price: Price) -> Self {
        self.quoted_price = Some(price);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundingOutcome {
    Accrued(FundingAccrual),
    Skipped(FundingSkip),
}

impl FundingOutcome {
    pub fn is_accrued(&self) -> bool {
        matches!(self, FundingOutcome::Accrued(_))
    }

    pub fn hours(&self) -> u64 {
        match self {
            FundingOutcome::Accrued(accrual) => accrual.hours,
            FundingOutcome::Skipped(_) => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseResult {
    pub closed_size: u64,
    pub margin_released: u128,
    pub price_pnl: u128,
    pub funding_pnl: u128,
    pub equity_released: i128,
    /// None once the position is gone
    pub remaining: Option<Position>,
}

impl CloseResult {
    pub fn pnl(&self) -> u128 {
        self.price_pnl.saturating_add(self.funding_pnl)
    }

    pub fn position_deleted(&self) -> bool {
        self.remaining.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidationResult {
    pub market: MarketId,
    pub account: AccountId,
    pub liquidator: AccountId,
    pub size: u64,
    pub liquidation_price: Price,
    pub locked_margin: u128,
    pub health: i128,
    pub equity: i128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    PermissionDenied,
    InvalidArgument,
    InvalidState,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::NotFound => "not_found",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::InvalidState => "invalid_state",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Market {0} already exists")]
    MarketExists(MarketId),

    #[error("Account {account} already has a position on market {market}")]
    PositionExists { market: MarketId, account: AccountId },

    #[error("Market {0} not found")]
    MarketNotFound(MarketId),

    #[error("Account {account} has no position on market {market}")]
    PositionNotFound { market: MarketId, account: AccountId },

    #[error("{caller} is not the {role} for market {market}")]
    PermissionDenied {
        market: MarketId,
        caller: AccountId,
        role: Role,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),

    #[error("Invalid state: {0}")]
    InvalidState(#[from] InvalidState),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::MarketExists(_) | LedgerError::PositionExists { .. } => {
                ErrorKind::AlreadyExists
            }
            LedgerError::MarketNotFound(_) | LedgerError::PositionNotFound { .. } => {
                ErrorKind::NotFound
            }
            LedgerError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            LedgerError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            LedgerError::InvalidState(_) => ErrorKind::InvalidState,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidArgument {
    #[error("side {0:?} is neither long nor short")]
    InvalidSide(String),

    #[error("size must be positive")]
    ZeroSize,

    #[error("leverage must be positive")]
    ZeroLeverage,

    #[error("leverage {requested} exceeds market max {max}")]
    LeverageAboveMax { requested: Leverage, max: Leverage },

    #[error("margin {provided} below required initial margin {required}")]
    InsufficientMargin { provided: u128, required: u128 },

    #[error("collateral unavailable: {0}")]
    InsufficientCollateral(#[from] VaultError),

    #[error("close size must be positive")]
    ZeroCloseSize,

    #[error("close size {requested} exceeds position size {size}")]
    CloseExceedsPosition { requested: u64, size: u64 },

    #[error("market config: {0}")]
    Config(#[from] MarketConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidState {
    #[error("position is healthy (health {health}), not liquidatable")]
    PositionHealthy { health: i128 },

    #[error("closing would release negative equity {equity}")]
    NegativeEquity { equity: i128 },
}
