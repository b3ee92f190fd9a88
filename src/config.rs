// 7.0 config.rs: deployment settings in one place. ledger options plus the markets to create.
// 7.1 environment presets pick the market templates. risk params per market come from MarketConfig.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::engine::{Ledger, LedgerConfig, LedgerError};
use crate::governance::Governance;
use crate::market::{MarketConfig, MarketConfigError};
use crate::types::{AccountId, MarketId, PairId, Price};
use crate::vault::MarginVault;

/** 7.2: one market to create at deployment */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketTemplate {
    // Market symbol (e.g. "BTC-PERP")
    pub symbol: String,
    pub pair: PairId,
    pub risk: MarketConfig,
    // Mark price the market starts with, in ticks
    pub initial_price: Price,
}

impl MarketTemplate {
    pub fn new(symbol: &str, pair: PairId, risk: MarketConfig, initial_price: Price) -> Self {
        Self {
            symbol: symbol.to_string(),
            pair,
            risk,
            initial_price,
        }
    }
}

// The complete deployment configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub environment: Environment,
    pub ledger: LedgerConfig,
    pub markets: Vec<MarketTemplate>,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl DeploymentConfig {
    // Single BTC market, events mirrored to the log
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            ledger: LedgerConfig {
                trace_events: true,
                ..LedgerConfig::default()
            },
            markets: vec![MarketTemplate::new(
                "BTC-PERP",
                PairId(1),
                MarketConfig::btc_perp(),
                Price(50_000),
            )],
        }
    }

    pub fn testnet() -> Self {
        Self {
            environment: Environment::Testnet,
            ledger: LedgerConfig::default(),
            markets: vec![
                MarketTemplate::new("BTC-PERP", PairId(1), MarketConfig::btc_perp(), Price(50_000)),
                MarketTemplate::new("ETH-PERP", PairId(2), MarketConfig::eth_perp(), Price(3_000)),
            ],
        }
    }

    // Create a configuration preset for mainnet with conservative settings
    pub fn mainnet_conservative() -> Self {
        Self {
            environment: Environment::Mainnet,
            ledger: LedgerConfig {
                max_events: 1_000_000,
                trace_events: false,
            },
            markets: vec![
                MarketTemplate::new("BTC-PERP", PairId(1), MarketConfig::conservative(), Price(50_000)),
                MarketTemplate::new("ETH-PERP", PairId(2), MarketConfig::conservative(), Price(3_000)),
            ],
        }
    }

    // Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger.max_events == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }

        let mut pairs = HashSet::new();
        for template in &self.markets {
            if template.symbol.trim().is_empty() {
                return Err(ConfigError::EmptySymbol(template.pair));
            }
            if !pairs.insert(template.pair) {
                return Err(ConfigError::DuplicatePair(template.pair));
            }
            if template.initial_price.ticks() == 0 {
                return Err(ConfigError::ZeroInitialPrice(template.symbol.clone()));
            }
            template.risk.validate().map_err(|source| ConfigError::Market {
                symbol: template.symbol.clone(),
                source,
            })?;
        }

        Ok(())
    }

    pub fn template(&self, symbol: &str) -> Option<&MarketTemplate> {
        self.markets.iter().find(|t| t.symbol == symbol)
    }

    /// Build a ledger and create every configured market under `admin`.
    pub fn deploy<V: MarginVault, G: Governance>(
        &self,
        vault: V,
        governance: G,
        admin: AccountId,
        price_oracle: AccountId,
        funding_oracle: AccountId,
    ) -> Result<(Ledger<V, G>, Vec<MarketId>), DeployError> {
        self.validate()?;

        let mut ledger = Ledger::with_seams(self.ledger.clone(), vault, governance);
        let mut ids = Vec::with_capacity(self.markets.len());
        for template in &self.markets {
            let id = ledger.create_market(
                admin,
                template.pair,
                template.risk,
                template.initial_price,
                price_oracle,
                funding_oracle,
            )?;
            tracing::info!(symbol = %template.symbol, market = %id, "market deployed");
            ids.push(id);
        }
        Ok((ledger, ids))
    }
}

// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("event log capacity must be positive")]
    ZeroEventCapacity,

    #[error("market with pair {0:?} has no symbol")]
    EmptySymbol(PairId),

    #[error("pair {0:?} configured twice")]
    DuplicatePair(PairId),

    #[error("market {0} starts at price zero")]
    ZeroInitialPrice(String),

    #[error("market {symbol}: {source}")]
    Market {
        symbol: String,
        source: MarketConfigError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeployError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

// Environment presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Testnet,
    Mainnet,
}

impl Environment {
    pub fn config(&self) -> DeploymentConfig {
        match self {
            Environment::Development => DeploymentConfig::development(),
            Environment::Testnet => DeploymentConfig::testnet(),
            Environment::Mainnet => DeploymentConfig::mainnet_conservative(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governance::NoGovernance;
    use crate::types::{Bps, Leverage};
    use crate::vault::NoopVault;

    #[test]
    fn test_environment_presets() {
        for env in [Environment::Development, Environment::Testnet, Environment::Mainnet] {
            let config = env.config();
            assert!(config.validate().is_ok(), "{env:?}");
            assert_eq!(config.environment, env);
        }
    }

    #[test]
    fn test_mainnet_is_conservative() {
        let config = DeploymentConfig::mainnet_conservative();
        for template in &config.markets {
            // 10x max
            assert_eq!(template.risk.max_leverage, Leverage(1_000));
        }
    }

    #[test]
    fn test_duplicate_pair() {
        let mut config = DeploymentConfig::testnet();
        config.markets[1].pair = PairId(1);
        assert_eq!(config.validate(), Err(ConfigError::DuplicatePair(PairId(1))));
    }

    #[test]
    fn test_invalid_market_risk() {
        let mut config = DeploymentConfig::development();
        config.markets[0].risk.maintenance_margin = Bps(9_000);

        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Market { ref symbol, .. }) if symbol == "BTC-PERP"));
    }

    #[test]
    fn test_zero_capacity() {
        let mut config = DeploymentConfig::development();
        config.ledger.max_events = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroEventCapacity));
    }

    #[test]
    fn test_deploy_creates_markets() {
        let config = DeploymentConfig::testnet();
        let (ledger, ids) = config
            .deploy(NoopVault, NoGovernance, AccountId(1), AccountId(10), AccountId(11))
            .unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(ledger.get_mark_price(ids[1]).unwrap(), Price(3_000));
        assert_eq!(ledger.events().len(), 2);
    }

    #[test]
    fn test_deploy_rejects_invalid_config() {
        let mut config = DeploymentConfig::testnet();
        config.markets[0].symbol = String::new();

        let result = config.deploy(NoopVault, NoGovernance, AccountId(1), AccountId(10), AccountId(11));
        assert!(matches!(result, Err(DeployError::Config(ConfigError::EmptySymbol(_)))));
    }

    #[test]
    fn test_config_serialization() {
        let config = DeploymentConfig::testnet();
        let json = serde_json::to_string(&config).unwrap();
        let back: DeploymentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.template("ETH-PERP").unwrap().pair, PairId(2));
    }
}
