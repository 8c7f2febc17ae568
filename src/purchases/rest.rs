use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};

use super::dto::{NewPurchase, PurchaseRecord};
use super::repo::PurchaseStore;

const TABLE: &str = "purchases";

/// Supabase REST (PostgREST) access to the `purchases` table.
#[derive(Clone)]
pub struct RestPurchaseStore {
    client: Client,
    base_url: String,
    key: String,
}

impl RestPurchaseStore {
    pub fn new(base_url: &str, key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            key: key.to_string(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, TABLE)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.key).bearer_auth(&self.key)
    }
}

async fn rows(resp: Response, op: &str) -> anyhow::Result<Vec<PurchaseRecord>> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("postgrest {op} failed with {status}: {body}");
    }
    resp.json::<Vec<PurchaseRecord>>()
        .await
        .with_context(|| format!("decode postgrest {op} response"))
}

#[async_trait]
impl PurchaseStore for RestPurchaseStore {
    async fn list_recent_first(&self) -> anyhow::Result<Vec<PurchaseRecord>> {
        let resp = self
            .authorized(self.client.get(self.table_url()))
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await
            .context("postgrest select")?;
        rows(resp, "select").await
    }

    async fn insert(&self, purchase: &NewPurchase) -> anyhow::Result<Vec<PurchaseRecord>> {
        let resp = self
            .authorized(self.client.post(self.table_url()))
            .header("Prefer", "return=representation")
            .json(purchase)
            .send()
            .await
            .context("postgrest insert")?;
        rows(resp, "insert").await
    }
}
