//! Concurrency tests
//!
//! Drives `SharedLedger` from many threads. Calls on one market serialize,
//! calls on different markets proceed independently; either way every
//! call lands whole or not at all.

use perps_ledger::*;
use std::sync::Arc;
use std::thread;

const ADMIN: AccountId = AccountId(1);
const PRICE_ORACLE: AccountId = AccountId(10);
const FUNDING_ORACLE: AccountId = AccountId(11);

fn create(ledger: &SharedLedger<InMemoryVault>, pair: u32) -> MarketId {
    ledger
        .create_market(
            ADMIN,
            PairId(pair),
            MarketConfig::btc_perp(),
            Price(1_000),
            PRICE_ORACLE,
            FUNDING_ORACLE,
        )
        .unwrap()
}

#[test]
fn parallel_opens_across_markets() {
    let ledger = Arc::new(SharedLedger::with_seams(InMemoryVault::new(), NoGovernance));
    let markets: Vec<MarketId> = (1..=4).map(|pair| create(&ledger, pair)).collect();
    for trader in 0..100u64 {
        ledger.vault().deposit(AccountId(1_000 + trader), 1_000_000);
    }

    let handles: Vec<_> = markets
        .iter()
        .map(|&market| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for trader in 0..100u64 {
                    let request = OpenRequest::new(Side::Long, 1, Leverage(1_000), 200);
                    ledger.open(AccountId(1_000 + trader), market, request).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for &market in &markets {
        for trader in 0..100u64 {
            assert!(ledger.get_position(market, AccountId(1_000 + trader)).is_some());
        }
    }
    // four markets, 200 each
    assert_eq!(ledger.vault().balance(AccountId(1_000)).locked, 800);
}

#[test]
fn racing_opens_on_one_account_leave_one_position() {
    let ledger = Arc::new(SharedLedger::with_seams(InMemoryVault::new(), NoGovernance));
    let market = create(&ledger, 1);
    let trader = AccountId(500);
    ledger.vault().deposit(trader, 1_000_000);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                ledger.open(trader, market, OpenRequest::new(Side::Short, 10, Leverage(1_000), 2_000))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let won = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(won, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }
    // only the winner locked margin
    assert_eq!(ledger.vault().balance(trader).locked, 2_000);
}

#[test]
fn partial_closes_from_many_threads_sum_up() {
    let ledger = Arc::new(SharedLedger::with_seams(InMemoryVault::new(), NoGovernance));
    let market = create(&ledger, 1);
    let trader = AccountId(500);
    ledger.vault().deposit(trader, 1_000_000);
    ledger
        .open(trader, market, OpenRequest::new(Side::Long, 100, Leverage(1_000), 30_000))
        .unwrap();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for _ in 0..10 {
                    ledger.close(trader, market, trader, 1).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(ledger.get_position(market, trader).is_none());
    let balance = ledger.vault().balance(trader);
    assert_eq!(balance.locked, 0);
    assert_eq!(balance.free, 1_000_000);
}

#[test]
fn oracles_and_traders_interleave() {
    let ledger = Arc::new(SharedLedger::with_seams(InMemoryVault::new(), NoGovernance));
    let market = create(&ledger, 1);

    let oracle = {
        let ledger = Arc::clone(&ledger);
        thread::spawn(move || {
            for step in 1..=50u64 {
                ledger.set_mark_price(PRICE_ORACLE, market, Price(1_000 + step)).unwrap();
                ledger
                    .push_funding(FUNDING_ORACLE, market, step as u128, Timestamp::from_secs(step * 3_600))
                    .unwrap();
            }
        })
    };
    let traders: Vec<_> = (0..4u64)
        .map(|t| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                let account = AccountId(2_000 + t);
                ledger.vault().deposit(account, 1_000_000);
                for _ in 0..25 {
                    ledger
                        .open(account, market, OpenRequest::new(Side::Long, 5, Leverage(1_000), 5_000))
                        .unwrap();
                    let health = ledger.position_health(market, account).unwrap();
                    assert!(health.health > 0);
                    ledger.close(account, market, account, 5).unwrap();
                }
            })
        })
        .collect();

    oracle.join().unwrap();
    for trader in traders {
        trader.join().unwrap();
    }

    assert_eq!(ledger.get_mark_price(market).unwrap(), Price(1_050));
    assert_eq!(
        ledger.get_market(market).unwrap().funding.last_accrual,
        Timestamp::from_secs(50 * 3_600)
    );
}
