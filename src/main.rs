//! Perpetual ledger simulation.
//!
//! Walks the ledger through its lifecycle: open and close round trips,
//! funding quantization, and a governance-triggered liquidation.

use perps_ledger::*;
use tracing_subscriber::EnvFilter;

const ADMIN: AccountId = AccountId(1);
const PRICE_ORACLE: AccountId = AccountId(10);
const FUNDING_ORACLE: AccountId = AccountId(11);
const ALICE: AccountId = AccountId(100);
const BOB: AccountId = AccountId(101);
const KEEPER: AccountId = AccountId(200);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Perpetual Ledger Simulation");
    println!("Isolated Margin, Directionless PnL, Hourly Funding\n");

    scenario_1_round_trip()?;
    scenario_2_funding_quantization()?;
    scenario_3_governance_liquidation()?;
    scenario_4_threaded_markets()?;

    println!("\nAll simulations completed successfully.");
    Ok(())
}

/// Open, partially close, fully close, with vault balances.
fn scenario_1_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    println!("Scenario 1: Open / Close Round Trip\n");

    let (mut ledger, ids) = DeploymentConfig::development().deploy(
        InMemoryVault::new(),
        NoGovernance,
        ADMIN,
        PRICE_ORACLE,
        FUNDING_ORACLE,
    )?;
    let btc = ids[0];
    ledger.set_time(Timestamp::now());
    ledger.vault().deposit(ALICE, 100_000);

    let request = OpenRequest::new("long".parse()?, 10, Leverage(1_000), 100_000).quoted_at(Price(49_990));
    let position = ledger.open(ALICE, btc, request)?;
    println!(
        "  Alice opens {} {} @ {} with margin {} ({})",
        position.side, position.size, position.entry_price, position.margin, position.leverage
    );

    ledger.set_mark_price(PRICE_ORACLE, btc, Price(51_000))?;
    let health = ledger.position_health(btc, ALICE)?;
    println!(
        "  Mark moves to 51000: pnl {}, health {}, margin ratio {}",
        health.price_pnl,
        health.health,
        margin_ratio(health.health, health.notional).round_dp(4)
    );

    let partial = ledger.close(ALICE, btc, ALICE, 3)?;
    println!(
        "  Close 3: margin released {}, pnl {}, equity {}",
        partial.margin_released,
        partial.pnl(),
        partial.equity_released
    );

    let rest = ledger.close(ALICE, btc, ALICE, 7)?;
    println!("  Close 7: position deleted = {}", rest.position_deleted());

    let balance = ledger.vault().balance(ALICE);
    println!(
        "  Vault: free {}, locked {}, paid out {}\n",
        balance.free, balance.locked, balance.paid_out
    );
    Ok(())
}

/// Funding accrues in whole hours only.
fn scenario_2_funding_quantization() -> Result<(), Box<dyn std::error::Error>> {
    println!("Scenario 2: Funding Quantization\n");

    let mut ledger = Ledger::new(LedgerConfig::default());
    let eth = ledger.create_market(
        ADMIN,
        PairId(2),
        MarketConfig::eth_perp(),
        Price(3_000),
        PRICE_ORACLE,
        FUNDING_ORACLE,
    )?;
    let cap = ledger.get_market(eth)?.config.max_funding_per_hour;

    for (seed, secs) in [(1_000u128, 1_800u64), (1_000, 3_600), (42, 3_600 * 4 + 120), (7, 3_600 * 3)] {
        let outcome = ledger.push_funding(FUNDING_ORACLE, eth, seed, Timestamp::from_secs(secs))?;
        let rate = rate_from_seed(seed, cap);
        println!(
            "  t={:>6}s seed {:>4} rate {:>4} bps/h ({} annualized): {} hour(s), index {}",
            secs,
            seed,
            rate,
            annualized_rate(rate).round_dp(2),
            outcome.hours(),
            ledger.get_cumulative_funding(eth)?
        );
    }
    println!();
    Ok(())
}

/// Health never drops below zero from price moves alone; raising the
/// maintenance ratio through governance is what makes a position liquidatable.
fn scenario_3_governance_liquidation() -> Result<(), Box<dyn std::error::Error>> {
    println!("Scenario 3: Governance-Triggered Liquidation\n");

    let mut ledger = Ledger::with_seams(
        LedgerConfig::default(),
        InMemoryVault::new(),
        Council::new([ADMIN]),
    );
    let btc = ledger.create_market(
        ADMIN,
        PairId(1),
        MarketConfig::btc_perp(),
        Price(100),
        PRICE_ORACLE,
        FUNDING_ORACLE,
    )?;
    ledger.vault().deposit(BOB, 2_000);
    ledger.open(BOB, btc, OpenRequest::new(Side::Short, 100, Leverage(1_000), 2_000))?;

    match ledger.liquidate(KEEPER, btc, BOB) {
        Err(err) => println!("  Keeper tries to liquidate Bob: {} ({})", err, err.kind()),
        Ok(_) => println!("  Keeper liquidated a healthy position"),
    }

    let strict = MarketConfig {
        initial_margin: Bps(5_000),
        maintenance_margin: Bps(5_000),
        ..MarketConfig::btc_perp()
    };
    if let Err(err) = ledger.update_risk_params(BOB, btc, strict) {
        println!("  Bob tries to change risk params: {}", err);
    }
    ledger.update_risk_params(ADMIN, btc, strict)?;
    println!("  Council raises maintenance to {}", strict.maintenance_margin);

    let result = ledger.liquidate(KEEPER, btc, BOB)?;
    println!(
        "  Liquidated {} {} @ {}: health {}, equity {}",
        result.account, result.size, result.liquidation_price, result.health, result.equity
    );
    println!(
        "  Vault saw {} liquidation(s); Bob's margin still locked: {}\n",
        ledger.vault().liquidations().len(),
        ledger.vault().balance(BOB).locked
    );
    Ok(())
}

/// Two markets driven from separate threads.
fn scenario_4_threaded_markets() -> Result<(), Box<dyn std::error::Error>> {
    println!("Scenario 4: Shared Ledger Across Threads\n");

    let ledger = SharedLedger::new();
    let markets: Vec<MarketId> = (1..=2)
        .map(|pair| {
            ledger.create_market(
                ADMIN,
                PairId(pair),
                MarketConfig::btc_perp(),
                Price(1_000),
                PRICE_ORACLE,
                FUNDING_ORACLE,
            )
        })
        .collect::<Result<_, _>>()?;

    std::thread::scope(|scope| {
        for &market in &markets {
            let ledger = &ledger;
            scope.spawn(move || {
                for trader in 0..50u64 {
                    let request = OpenRequest::new(Side::Long, 1, Leverage(1_000), 200);
                    if let Err(err) = ledger.open(AccountId(1_000 + trader), market, request) {
                        tracing::warn!(%market, %err, "open failed");
                    }
                }
            });
        }
    });

    for market in &markets {
        let open = (0..50u64)
            .filter(|t| ledger.get_position(*market, AccountId(1_000 + t)).is_some())
            .count();
        println!("  Market {}: {} positions", market, open);
    }
    Ok(())
}
