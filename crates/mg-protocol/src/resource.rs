use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named URL kept in the resource store (docs, dashboards, explorers).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlResource {
    /// Internal row ID (UUIDv7 for time-sortability).
    pub id: Uuid,
    /// Unique lookup name.
    pub name: String,
    /// The stored URL.
    pub url: String,
    /// Optional free-text description, also searched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// Refreshed on any update path; equals `created_at` until then.
    pub updated_at: DateTime<Utc>,
}

impl UrlResource {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            url: url.into(),
            description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An on-chain contract address kept in the resource store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractRecord {
    /// Internal row ID (UUIDv7 for time-sortability).
    pub id: Uuid,
    /// Unique lookup name.
    pub name: String,
    /// Contract address string, stored verbatim.
    pub address: String,
    /// Network the address lives on (e.g. "ethereum", "polygon").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// Optional free-text description, also searched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// Refreshed on any update path; equals `created_at` until then.
    pub updated_at: DateTime<Utc>,
}

impl ContractRecord {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        network: Option<String>,
        description: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            address: address.into(),
            network,
            description,
            created_at: now,
            updated_at: now,
        }
    }
}
