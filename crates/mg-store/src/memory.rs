//! In-memory resource tables.
//!
//! Back the store when no database is configured (tests and development).
//! Entries are keyed by exact name; lookups mirror the SQL semantics.

use std::collections::HashMap;

use tokio::sync::RwLock;

use mg_protocol::{ContractRecord, UrlResource};

#[derive(Default)]
pub(crate) struct MemoryTables {
    urls: RwLock<HashMap<String, UrlResource>>,
    contracts: RwLock<HashMap<String, ContractRecord>>,
}

impl MemoryTables {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Tables pre-populated with the given records, keyed by name.
    pub(crate) fn seeded(urls: Vec<UrlResource>, contracts: Vec<ContractRecord>) -> Self {
        Self {
            urls: RwLock::new(urls.into_iter().map(|r| (r.name.clone(), r)).collect()),
            contracts: RwLock::new(contracts.into_iter().map(|r| (r.name.clone(), r)).collect()),
        }
    }

    pub(crate) async fn add_url(&self, resource: UrlResource) -> bool {
        let mut urls = self.urls.write().await;
        if urls.contains_key(&resource.name) {
            return false;
        }
        urls.insert(resource.name.clone(), resource);
        true
    }

    pub(crate) async fn get_url(&self, name: &str) -> Option<UrlResource> {
        self.urls.read().await.get(name).cloned()
    }

    pub(crate) async fn search_urls(&self, query: &str) -> Vec<UrlResource> {
        let needle = query.to_lowercase();
        let urls = self.urls.read().await;
        let mut hits: Vec<UrlResource> = urls
            .values()
            .filter(|r| matches_query(&r.name, r.description.as_deref(), &needle))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.name.cmp(&b.name));
        hits
    }

    pub(crate) async fn add_contract(&self, record: ContractRecord) -> bool {
        let mut contracts = self.contracts.write().await;
        if contracts.contains_key(&record.name) {
            return false;
        }
        contracts.insert(record.name.clone(), record);
        true
    }

    pub(crate) async fn get_contract(&self, name: &str) -> Option<ContractRecord> {
        self.contracts.read().await.get(name).cloned()
    }

    pub(crate) async fn search_contracts(&self, query: &str) -> Vec<ContractRecord> {
        let needle = query.to_lowercase();
        let contracts = self.contracts.read().await;
        let mut hits: Vec<ContractRecord> = contracts
            .values()
            .filter(|r| matches_query(&r.name, r.description.as_deref(), &needle))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.name.cmp(&b.name));
        hits
    }
}

/// Case-insensitive substring match on name or description.
fn matches_query(name: &str, description: Option<&str>, needle: &str) -> bool {
    name.to_lowercase().contains(needle)
        || description.is_some_and(|d| d.to_lowercase().contains(needle))
}
