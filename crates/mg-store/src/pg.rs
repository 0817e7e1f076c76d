//! Typed queries over the PostgreSQL pool.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use mg_protocol::{ContractRecord, UrlResource};

/// URL row returned from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct UrlRow {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UrlRow> for UrlResource {
    fn from(row: UrlRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            url: row.url,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Contract row returned from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ContractRow {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub network: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ContractRow> for ContractRecord {
    fn from(row: ContractRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            address: row.address,
            network: row.network,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Insert a URL resource. Returns false when the name is already taken.
pub(crate) async fn insert_url(pool: &PgPool, resource: &UrlResource) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO url_resources (id, name, url, description, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (name) DO NOTHING",
    )
    .bind(resource.id)
    .bind(&resource.name)
    .bind(&resource.url)
    .bind(&resource.description)
    .bind(resource.created_at)
    .bind(resource.updated_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Get a URL resource by its exact name.
pub(crate) async fn get_url(pool: &PgPool, name: &str) -> Result<Option<UrlResource>, sqlx::Error> {
    Ok(
        sqlx::query_as::<_, UrlRow>("SELECT * FROM url_resources WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?
            .map(Into::into),
    )
}

/// Case-insensitive substring search over name and description.
pub(crate) async fn search_urls(pool: &PgPool, query: &str) -> Result<Vec<UrlResource>, sqlx::Error> {
    let pattern = format!("%{query}%");
    Ok(sqlx::query_as::<_, UrlRow>(
        "SELECT * FROM url_resources
         WHERE name ILIKE $1 OR description ILIKE $1
         ORDER BY name",
    )
    .bind(&pattern)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(Into::into)
    .collect())
}

/// Insert a contract record. Returns false when the name is already taken.
pub(crate) async fn insert_contract(
    pool: &PgPool,
    record: &ContractRecord,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO contract_records (id, name, address, network, description, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (name) DO NOTHING",
    )
    .bind(record.id)
    .bind(&record.name)
    .bind(&record.address)
    .bind(&record.network)
    .bind(&record.description)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Get a contract record by its exact name.
pub(crate) async fn get_contract(
    pool: &PgPool,
    name: &str,
) -> Result<Option<ContractRecord>, sqlx::Error> {
    Ok(
        sqlx::query_as::<_, ContractRow>("SELECT * FROM contract_records WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?
            .map(Into::into),
    )
}

/// Case-insensitive substring search over name and description.
pub(crate) async fn search_contracts(
    pool: &PgPool,
    query: &str,
) -> Result<Vec<ContractRecord>, sqlx::Error> {
    let pattern = format!("%{query}%");
    Ok(sqlx::query_as::<_, ContractRow>(
        "SELECT * FROM contract_records
         WHERE name ILIKE $1 OR description ILIKE $1
         ORDER BY name",
    )
    .bind(&pattern)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(Into::into)
    .collect())
}
