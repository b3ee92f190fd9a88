// 8.0: ledger engine. coordinates market creation, oracle pushes, position lifecycle
// and liquidation checks. deterministic, no external I/O.

mod book;
mod config;
mod core;
mod funding;
mod liquidations;
mod positions;
mod pricing;
mod results;
mod shared;

pub use book::MarketBook;
pub use config::LedgerConfig;
pub use core::Ledger;
pub use results::{
    CloseResult, ErrorKind, FundingOutcome, InvalidArgument, InvalidState, LedgerError,
    LiquidationResult, OpenRequest,
};
pub use shared::SharedLedger;
