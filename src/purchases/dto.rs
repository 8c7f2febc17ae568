use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use time::OffsetDateTime;

/// A row of the `purchases` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Purchase {
    pub id: i64,
    pub item_name: Option<String>,
    pub package_size: Option<String>,
    pub carbon_footprint: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A purchase as the store returned it. Columns pass through untouched, so
/// a numeric `package_size`, a uuid `id` or extra columns reach the client
/// unchanged.
pub type PurchaseRecord = Map<String, Value>;

impl Purchase {
    pub fn into_record(self) -> anyhow::Result<PurchaseRecord> {
        match serde_json::to_value(self)? {
            Value::Object(record) => Ok(record),
            other => anyhow::bail!("purchase serialized to {other}"),
        }
    }
}

/// Insert payload. Fields are taken as-is from the request body; whatever
/// is missing becomes `null` and the store decides what it accepts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewPurchase {
    #[serde(default)]
    pub item_name: Value,
    #[serde(default)]
    pub package_size: Value,
    #[serde(default)]
    pub carbon_footprint: Value,
}

impl NewPurchase {
    /// Parse a request body. Anything but a JSON object is an error; inside
    /// the object only the three known keys are looked at.
    pub fn from_body(body: &[u8]) -> anyhow::Result<Self> {
        match serde_json::from_slice::<Value>(body)? {
            obj @ Value::Object(_) => Ok(serde_json::from_value(obj)?),
            other => anyhow::bail!("expected a JSON object, got {other}"),
        }
    }
}
