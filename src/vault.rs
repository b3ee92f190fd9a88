// 9.2 vault.rs: custody seam. the ledger decides amounts, the vault moves funds.
// NoopVault is the default (nothing is wired to real custody). InMemoryVault is MOCKED:
// just balance changes behind a mutex, no real token transfers.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::liquidation::LiquidationNotice;
use crate::types::AccountId;

/// Custody hooks called by the ledger. Implementations must be shareable
/// across threads because `SharedLedger` calls them without a global lock.
pub trait MarginVault: Send + Sync {
    /// Reserve `amount` of the account's free collateral for a new position.
    fn lock(&self, account: AccountId, amount: u128) -> Result<(), VaultError>;

    /// Return previously locked collateral to the account's free balance.
    fn unlock(&self, account: AccountId, amount: u128);

    /// Credit realized PnL to the account.
    fn payout(&self, account: AccountId, amount: u128);

    /// A position was liquidated and deleted. Reward and insurance handling
    /// are not implemented; implementations may only observe.
    fn on_liquidation(&self, notice: &LiquidationNotice) {
        let _ = notice;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultError {
    #[error("insufficient balance for {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        account: AccountId,
        available: u128,
        requested: u128,
    },
}

/// Accepts every call and moves nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVault;

impl MarginVault for NoopVault {
    fn lock(&self, _account: AccountId, _amount: u128) -> Result<(), VaultError> {
        Ok(())
    }

    fn unlock(&self, _account: AccountId, _amount: u128) {}

    fn payout(&self, _account: AccountId, _amount: u128) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultBalance {
    pub free: u128,
    pub locked: u128,
    /// PnL credited on close
    pub paid_out: u128,
}

#[derive(Debug, Default)]
struct VaultBook {
    balances: HashMap<AccountId, VaultBalance>,
    liquidations: Vec<LiquidationNotice>,
}

/// In-memory test double with real balance checks.
#[derive(Debug, Default)]
pub struct InMemoryVault {
    book: Mutex<VaultBook>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deposit(&self, account: AccountId, amount: u128) {
        let mut book = self.book();
        let balance = book.balances.entry(account).or_default();
        balance.free = balance.free.saturating_add(amount);
    }

    pub fn balance(&self, account: AccountId) -> VaultBalance {
        self.book().balances.get(&account).copied().unwrap_or_default()
    }

    pub fn liquidations(&self) -> Vec<LiquidationNotice> {
        self.book().liquidations.clone()
    }

    fn book(&self) -> std::sync::MutexGuard<'_, VaultBook> {
        self.book.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MarginVault for InMemoryVault {
    fn lock(&self, account: AccountId, amount: u128) -> Result<(), VaultError> {
        let mut book = self.book();
        let balance = book.balances.entry(account).or_default();
        if balance.free < amount {
            return Err(VaultError::InsufficientBalance {
                account,
                available: balance.free,
                requested: amount,
            });
        }
        balance.free -= amount;
        balance.locked += amount;
        Ok(())
    }

    fn unlock(&self, account: AccountId, amount: u128) {
        let mut book = self.book();
        let balance = book.balances.entry(account).or_default();
        let released = amount.min(balance.locked);
        balance.locked -= released;
        balance.free = balance.free.saturating_add(released);
    }

    fn payout(&self, account: AccountId, amount: u128) {
        let mut book = self.book();
        let balance = book.balances.entry(account).or_default();
        balance.free = balance.free.saturating_add(amount);
        balance.paid_out = balance.paid_out.saturating_add(amount);
    }

    fn on_liquidation(&self, notice: &LiquidationNotice) {
        self.book().liquidations.push(notice.clone());
    }
}
