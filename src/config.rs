use serde::Deserialize;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Where purchases live.
#[derive(Debug, Clone, Deserialize)]
pub enum StoreConfig {
    /// Direct connection to the Postgres database behind the project.
    Postgres { database_url: String },
    /// Supabase REST (PostgREST) endpoint.
    Rest { url: String, key: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub gemini: GeminiConfig,
}

impl AppConfig {
    /// Credentials are not checked here; a missing key shows up as a failed
    /// call on first use.
    pub fn from_env() -> anyhow::Result<Self> {
        let store = match std::env::var("DATABASE_URL") {
            Ok(database_url) if !database_url.is_empty() => StoreConfig::Postgres { database_url },
            _ => StoreConfig::Rest {
                url: std::env::var("SUPABASE_URL").unwrap_or_default(),
                key: std::env::var("SUPABASE_KEY").unwrap_or_default(),
            },
        };
        let gemini = GeminiConfig {
            api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.into()),
            api_base: std::env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_GEMINI_API_BASE.into()),
        };
        Ok(Self { store, gemini })
    }
}
