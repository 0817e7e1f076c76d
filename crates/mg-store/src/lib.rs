//! Resource store for URL and contract lookups.
//!
//! Supports two modes:
//! - **Database mode**: PostgreSQL via `sqlx` (production).
//! - **In-memory mode**: `RwLock<HashMap>` tables (tests and development).
//!
//! Insert and lookup surfaces are infallible: storage errors are logged
//! and degrade to `false` / `None` / empty results, so a database outage
//! breaks lookups, not the bot.

mod memory;
mod pg;

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use mg_protocol::{ContractRecord, UrlResource};

use crate::memory::MemoryTables;

/// Handle over the URL and contract tables. Cheap to clone.
#[derive(Clone)]
pub struct ResourceStore {
    /// PostgreSQL connection pool (None in in-memory mode).
    pool: Option<PgPool>,
    /// In-memory tables (used when pool is None).
    memory: Arc<MemoryTables>,
}

impl ResourceStore {
    /// Connect to PostgreSQL and run migrations.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        tracing::info!("running database migrations");
        sqlx::raw_sql(include_str!("../migrations/001_resources.sql"))
            .execute(&pool)
            .await?;
        tracing::info!("migrations complete");

        Ok(Self {
            pool: Some(pool),
            memory: Arc::new(MemoryTables::new()),
        })
    }

    /// An empty in-memory store (for tests).
    pub fn in_memory() -> Self {
        Self {
            pool: None,
            memory: Arc::new(MemoryTables::new()),
        }
    }

    /// An in-memory store seeded with sample records for development.
    pub fn with_sample_data() -> Self {
        let urls = vec![
            UrlResource::new(
                "docs",
                "https://docs.magpie.example.org",
                Some("Developer documentation portal".into()),
            ),
            UrlResource::new(
                "explorer",
                "https://scan.magpie.example.org",
                Some("Block explorer for mainnet".into()),
            ),
            UrlResource::new(
                "faucet",
                "https://faucet.magpie.example.org",
                Some("Testnet token faucet".into()),
            ),
        ];
        let contracts = vec![
            ContractRecord::new(
                "treasury",
                "0x4a7c90f2d3b8a6e15c0b9d8f3e2a71c64d5b8e9f",
                Some("mainnet".into()),
                Some("DAO treasury multisig".into()),
            ),
            ContractRecord::new(
                "staking",
                "0x9b1e83c5a2f7d40e6b3c8a91f5d27e80c4a6b3d2",
                Some("mainnet".into()),
                Some("Staking rewards pool".into()),
            ),
        ];
        Self {
            pool: None,
            memory: Arc::new(MemoryTables::seeded(urls, contracts)),
        }
    }

    /// Whether records survive a restart.
    pub fn is_persistent(&self) -> bool {
        self.pool.is_some()
    }

    /// Store a URL under a unique name. Returns false when the name is
    /// already taken or storage fails; a losing insert changes nothing.
    pub async fn add_url(&self, name: &str, url: &str, description: Option<String>) -> bool {
        let resource = UrlResource::new(name, url, description);
        match &self.pool {
            Some(pool) => match pg::insert_url(pool, &resource).await {
                Ok(inserted) => inserted,
                Err(e) => {
                    tracing::warn!(error = %e, name, "url insert failed");
                    false
                }
            },
            None => self.memory.add_url(resource).await,
        }
    }

    /// Look up a URL by its exact name.
    pub async fn get_url(&self, name: &str) -> Option<UrlResource> {
        match &self.pool {
            Some(pool) => match pg::get_url(pool, name).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(error = %e, name, "url lookup failed");
                    None
                }
            },
            None => self.memory.get_url(name).await,
        }
    }

    /// Case-insensitive substring search over URL names and descriptions,
    /// ordered by name.
    pub async fn search_urls(&self, query: &str) -> Vec<UrlResource> {
        match &self.pool {
            Some(pool) => match pg::search_urls(pool, query).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(error = %e, query, "url search failed");
                    Vec::new()
                }
            },
            None => self.memory.search_urls(query).await,
        }
    }

    /// Store a contract address under a unique name. Same duplicate
    /// semantics as `add_url`.
    pub async fn add_contract(
        &self,
        name: &str,
        address: &str,
        network: Option<String>,
        description: Option<String>,
    ) -> bool {
        let record = ContractRecord::new(name, address, network, description);
        match &self.pool {
            Some(pool) => match pg::insert_contract(pool, &record).await {
                Ok(inserted) => inserted,
                Err(e) => {
                    tracing::warn!(error = %e, name, "contract insert failed");
                    false
                }
            },
            None => self.memory.add_contract(record).await,
        }
    }

    /// Look up a contract by its exact name.
    pub async fn get_contract(&self, name: &str) -> Option<ContractRecord> {
        match &self.pool {
            Some(pool) => match pg::get_contract(pool, name).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(error = %e, name, "contract lookup failed");
                    None
                }
            },
            None => self.memory.get_contract(name).await,
        }
    }

    /// Case-insensitive substring search over contract names and
    /// descriptions, ordered by name.
    pub async fn search_contracts(&self, query: &str) -> Vec<ContractRecord> {
        match &self.pool {
            Some(pool) => match pg::search_contracts(pool, query).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(error = %e, query, "contract search failed");
                    Vec::new()
                }
            },
            None => self.memory.search_contracts(query).await,
        }
    }
}
