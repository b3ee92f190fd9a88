// 9.0 oracle.rs: authorization gate for price and funding pushes.
// prices and seeds come from trusted external oracles. this only checks who is calling.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::LedgerError;
use crate::market::MarketState;
use crate::types::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    PriceOracle,
    FundingOracle,
    Governance,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::PriceOracle => write!(f, "price oracle"),
            Role::FundingOracle => write!(f, "funding oracle"),
            Role::Governance => write!(f, "governance"),
        }
    }
}

pub fn registered(market: &MarketState, role: Role) -> Option<AccountId> {
    match role {
        Role::PriceOracle => Some(market.price_oracle),
        Role::FundingOracle => Some(market.funding_oracle),
        Role::Governance => None,
    }
}

pub fn authorize(market: &MarketState, caller: AccountId, role: Role) -> Result<(), LedgerError> {
    if registered(market, role) == Some(caller) {
        Ok(())
    } else {
        Err(LedgerError::PermissionDenied {
            market: market.id,
            caller,
            role,
        })
    }
}
