use anyhow::{Context, Result};
use dotenvy::dotenv;
use rust_decimal::Decimal;
use service_core::config::Config as CommonConfig;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct EscrowConfig {
    pub common: CommonConfig,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub storage: StorageConfig,
    pub rules: LedgerRules,
}

#[derive(Debug, Clone)]
pub enum StorageConfig {
    Postgres(DatabaseConfig),
    /// Volatile in-process storage, for local development and tests.
    Memory,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Business rules the ledger applies, all overridable per deployment.
#[derive(Debug, Clone)]
pub struct LedgerRules {
    pub currency: String,
    /// Minimum payout a vendor may request, in minor units (Rs 100 default).
    pub minimum_payout_minor: i64,
    /// Rate snapshotted onto new orders.
    pub default_platform_fee_rate: Decimal,
    /// Processing fee taken out of payouts; zero unless configured.
    pub payout_fee_rate: Decimal,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl EscrowConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        // Common settings (the listen port) come through the shared layered
        // loader; everything ledger-specific reads ESCROW_* directly.
        let common = CommonConfig::load("ESCROW")
            .map_err(|e| anyhow::anyhow!("failed to load common config: {e}"))?;

        let storage = match env_or("ESCROW_STORAGE", "postgres").as_str() {
            "memory" => StorageConfig::Memory,
            "postgres" => {
                let url = env::var("ESCROW_DATABASE_URL")
                    .context("ESCROW_DATABASE_URL must be set for postgres storage")?;
                let max_connections = env_or("ESCROW_DB_MAX_CONNECTIONS", "10")
                    .parse()
                    .context("ESCROW_DB_MAX_CONNECTIONS must be an integer")?;
                let min_connections = env_or("ESCROW_DB_MIN_CONNECTIONS", "1")
                    .parse()
                    .context("ESCROW_DB_MIN_CONNECTIONS must be an integer")?;
                StorageConfig::Postgres(DatabaseConfig {
                    url,
                    max_connections,
                    min_connections,
                })
            }
            other => anyhow::bail!("unknown ESCROW_STORAGE mode '{}'", other),
        };

        let rules = LedgerRules {
            currency: env_or("ESCROW_CURRENCY", "INR"),
            minimum_payout_minor: env_or("ESCROW_MIN_PAYOUT_MINOR", "10000")
                .parse()
                .context("ESCROW_MIN_PAYOUT_MINOR must be an integer")?,
            default_platform_fee_rate: Decimal::from_str(&env_or(
                "ESCROW_PLATFORM_FEE_RATE",
                "0.10",
            ))
            .context("ESCROW_PLATFORM_FEE_RATE must be a decimal")?,
            payout_fee_rate: Decimal::from_str(&env_or("ESCROW_PAYOUT_FEE_RATE", "0"))
                .context("ESCROW_PAYOUT_FEE_RATE must be a decimal")?,
        };

        Ok(Self {
            common,
            service_name: "escrow-service".to_string(),
            log_level: env_or("ESCROW_LOG_LEVEL", "info"),
            otlp_endpoint: env::var("ESCROW_OTLP_ENDPOINT").ok(),
            storage,
            rules,
        })
    }

    /// Config for tests and local experiments: in-memory storage, default
    /// rules, port chosen by the OS.
    pub fn for_memory() -> Self {
        Self {
            common: CommonConfig { port: 0 },
            service_name: "escrow-service".to_string(),
            log_level: "debug".to_string(),
            otlp_endpoint: None,
            storage: StorageConfig::Memory,
            rules: LedgerRules {
                currency: "INR".to_string(),
                minimum_payout_minor: 10_000,
                default_platform_fee_rate: Decimal::new(10, 2),
                payout_fee_rate: Decimal::ZERO,
            },
        }
    }
}
