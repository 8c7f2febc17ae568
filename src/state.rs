use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::analysis::gemini::{GeminiClient, VisionModel};
use crate::config::{AppConfig, StoreConfig};
use crate::purchases::repo::{PgPurchaseStore, PurchaseStore};
use crate::purchases::rest::RestPurchaseStore;

/// Client handles built once at startup and shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub purchases: Arc<dyn PurchaseStore>,
    pub vision: Arc<dyn VisionModel>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let purchases = match &config.store {
            StoreConfig::Postgres { database_url } => {
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(database_url)
                    .await
                    .context("connect to database")?;
                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                tracing::info!("purchases stored in postgres");
                Arc::new(PgPurchaseStore::new(db)) as Arc<dyn PurchaseStore>
            }
            StoreConfig::Rest { url, key } => {
                tracing::info!(%url, "purchases stored via supabase rest");
                Arc::new(RestPurchaseStore::new(url, key)) as Arc<dyn PurchaseStore>
            }
        };

        let vision = Arc::new(GeminiClient::new(config.gemini.clone())) as Arc<dyn VisionModel>;

        Ok(Self::from_parts(config, purchases, vision))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        purchases: Arc<dyn PurchaseStore>,
        vision: Arc<dyn VisionModel>,
    ) -> Self {
        Self {
            config,
            purchases,
            vision,
        }
    }
}
