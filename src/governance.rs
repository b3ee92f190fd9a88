//! Governance seam.
//!
//! Market risk parameters change only through `Ledger::update_risk_params`,
//! and only when the installed `Governance` approves the caller. The
//! default `NoGovernance` approves nobody, so out of the box there is no
//! path from governance into market configuration.

use std::collections::HashSet;

use crate::types::{AccountId, MarketId};

pub trait Governance: Send + Sync {
    fn may_update(&self, caller: AccountId, market: MarketId) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoGovernance;

impl Governance for NoGovernance {
    fn may_update(&self, _caller: AccountId, _market: MarketId) -> bool {
        false
    }
}

/// Fixed set of accounts allowed to change parameters on any market.
#[derive(Debug, Clone, Default)]
pub struct Council {
    members: HashSet<AccountId>,
}

impl Council {
    pub fn new(members: impl IntoIterator<Item = AccountId>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }

    pub fn is_member(&self, account: AccountId) -> bool {
        self.members.contains(&account)
    }
}

impl Governance for Council {
    fn may_update(&self, caller: AccountId, _market: MarketId) -> bool {
        self.is_member(caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PairId;

    #[test]
    fn default_denies_everyone() {
        let market = MarketId::new(AccountId(1), PairId(1));
        assert!(!NoGovernance.may_update(AccountId(1), market));
    }

    #[test]
    fn council_allows_members_only() {
        let council = Council::new([AccountId(7), AccountId(8)]);
        let market = MarketId::new(AccountId(1), PairId(1));

        assert!(council.may_update(AccountId(7), market));
        assert!(!council.may_update(AccountId(1), market));
    }
}
