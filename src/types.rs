// 1.0: all the primitives live here. nothing in the ledger works without these types.
// IDs, prices, sizes, bps, leverage, timestamps. each is a newtype so the compiler catches type mixups.
// ledger arithmetic is integer only. Decimal shows up in the reporting views.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::InvalidArgument;

/// Any principal: trader, admin, oracle, liquidator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acct:{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairId(pub u32);

// 1.1: markets are keyed by (admin, pair). one admin can run many pairs without collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarketId {
    pub admin: AccountId,
    pub pair: PairId,
}

impl MarketId {
    pub fn new(admin: AccountId, pair: PairId) -> Self {
        Self { admin, pair }
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.admin.0, self.pair.0)
    }
}

// Long = exposure to price going up. Short = exposure to price going down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn code(&self) -> u8 {
        match self {
            Side::Long => 0,
            Side::Short => 1,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }
}

impl TryFrom<u8> for Side {
    type Error = InvalidArgument;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Side::Long),
            1 => Ok(Side::Short),
            other => Err(InvalidArgument::InvalidSide(other.to_string())),
        }
    }
}

impl FromStr for Side {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" => Ok(Side::Long),
            "short" => Ok(Side::Short),
            _ => Err(InvalidArgument::InvalidSide(s.to_string())),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

// 1.2: price in integer ticks. zero is representable, the oracle is trusted as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price(pub u64);

impl Price {
    pub fn ticks(&self) -> u64 {
        self.0
    }

    pub fn abs_diff(&self, other: Price) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.3: basis points. 10_000 bps = 100%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Bps(pub u32);

pub const BPS_DENOMINATOR: u128 = 10_000;

impl Bps {
    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn as_fraction(&self) -> Decimal {
        Decimal::new(self.0 as i64, 4)
    }

    /// `amount * self / 10_000`, floored.
    pub fn apply(&self, amount: u128) -> u128 {
        scale_bps(amount, self.0 as u128)
    }
}

/// Exact `floor(amount * factor / 10_000)` without forming the full product.
/// Saturates only when the result itself does not fit.
pub fn scale_bps(amount: u128, factor: u128) -> u128 {
    let whole = (amount / BPS_DENOMINATOR).saturating_mul(factor);
    let rest = amount % BPS_DENOMINATOR;
    // rest < 10_000, so rest * (factor % 10_000) cannot overflow
    let fraction = rest
        .saturating_mul(factor / BPS_DENOMINATOR)
        .saturating_add(rest * (factor % BPS_DENOMINATOR) / BPS_DENOMINATOR);
    whole.saturating_add(fraction)
}

impl fmt::Display for Bps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

// 1.4: leverage in leverage-bps. 100 = 1x, 5000 = 50x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Leverage(pub u32);

impl Leverage {
    pub fn bps(&self) -> u32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn multiplier(&self) -> Decimal {
        Decimal::from(self.0) / dec!(100)
    }
}

impl fmt::Display for Leverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.multiplier())
    }
}

// 1.5: second-resolution timestamp. funding works in whole hours of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

pub const SECONDS_PER_HOUR: u64 = 3_600;

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp().max(0) as u64)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds from `earlier` to `self`, zero when `self` is not later.
    pub fn seconds_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

// lifts an unsigned magnitude into signed health math. saturates instead of wrapping.
pub fn to_signed(amount: u128) -> i128 {
    i128::try_from(amount).unwrap_or(i128::MAX)
}
