// perps-ledger: perpetual futures position ledger.
// risk-first: margin math and the liquidation gate come before anything else.
// integer fixed-point arithmetic throughout, no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: AccountId, MarketId, Side, Price, Bps, Leverage
//   3.x  margin.rs: notional, IM/MM, price + funding PnL, health
//   4.x  position.rs: position record, store, pro-rata close plan
//   5.x  funding.rs: hourly funding index from oracle seeds
//   6.x  liquidation.rs: liquidation gate and vault notice
//   7.x  config.rs: deployment presets, market templates, environments
//   8.x  engine/: ledger, per-market books, shared (threaded) ledger
//   9.x  oracle.rs: oracle authorization
//   9.2  vault.rs: margin custody seam (mocked)
//   9.3  governance.rs: risk parameter governance seam
//   11.x events.rs: state transition events for audit
//   12.x market.rs: market config + runtime state

// core ledger modules
pub mod engine;
pub mod events;
pub mod funding;
pub mod liquidation;
pub mod margin;
pub mod market;
pub mod position;
pub mod types;

// collaborator seams
pub mod governance;
pub mod oracle;
pub mod vault;

// integration modules
pub mod config;

// re exports for convenience
pub use engine::*;
pub use events::*;
pub use funding::*;
pub use liquidation::*;
pub use margin::*;
pub use market::*;
pub use position::*;
pub use types::*;
pub use config::{ConfigError, DeployError, DeploymentConfig, Environment, MarketTemplate};
pub use governance::{Council, Governance, NoGovernance};
pub use oracle::Role;
pub use vault::{InMemoryVault, MarginVault, NoopVault, VaultBalance, VaultError};
