use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use super::dto::{NewPurchase, Purchase, PurchaseRecord};

/// Table-scoped access to `purchases`. Append-only: there is no update or
/// delete.
#[async_trait]
pub trait PurchaseStore: Send + Sync {
    /// All rows, most recent first.
    async fn list_recent_first(&self) -> anyhow::Result<Vec<PurchaseRecord>>;
    /// Insert one row and return what the store wrote.
    async fn insert(&self, purchase: &NewPurchase) -> anyhow::Result<Vec<PurchaseRecord>>;
}

#[derive(Clone)]
pub struct PgPurchaseStore {
    db: PgPool,
}

impl PgPurchaseStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PurchaseStore for PgPurchaseStore {
    async fn list_recent_first(&self) -> anyhow::Result<Vec<PurchaseRecord>> {
        let rows = sqlx::query_as::<_, Purchase>(
            r#"
            SELECT id, item_name, package_size, carbon_footprint, created_at
              FROM purchases
             ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("select purchases")?;
        rows.into_iter().map(Purchase::into_record).collect()
    }

    async fn insert(&self, purchase: &NewPurchase) -> anyhow::Result<Vec<PurchaseRecord>> {
        let item_name = text_column("item_name", &purchase.item_name)?;
        let package_size = text_column("package_size", &purchase.package_size)?;
        let carbon_footprint = numeric_column("carbon_footprint", &purchase.carbon_footprint)?;

        let row = sqlx::query_as::<_, Purchase>(
            r#"
            INSERT INTO purchases (item_name, package_size, carbon_footprint)
            VALUES ($1, $2, $3)
            RETURNING id, item_name, package_size, carbon_footprint, created_at
            "#,
        )
        .bind(item_name)
        .bind(package_size)
        .bind(carbon_footprint)
        .fetch_one(&self.db)
        .await
        .context("insert purchase")?;
        Ok(vec![row.into_record()?])
    }
}

/// Coerce a JSON value into a `text` column the way PostgREST would.
pub(crate) fn text_column(column: &str, value: &Value) -> anyhow::Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => anyhow::bail!("column {column}: cannot store {other} as text"),
    }
}

/// Coerce a JSON value into a `double precision` column. Numeric strings
/// are accepted.
pub(crate) fn numeric_column(column: &str, value: &Value) -> anyhow::Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .with_context(|| format!("column {column}: {n} out of range")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .with_context(|| format!("column {column}: invalid number {s:?}")),
        other => anyhow::bail!("column {column}: cannot store {other} as a number"),
    }
}
