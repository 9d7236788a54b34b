use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    #[default]
    Manual,
    Api,
}

impl PriceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSource::Manual => "manual",
            PriceSource::Api => "api",
        }
    }
}

// A recorded price for an asset, appended whenever its current price changes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistory {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub price: f64,
    pub date: DateTime<Utc>,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

impl PriceHistory {
    pub fn new(asset_id: Uuid, price: f64, source: PriceSource) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            asset_id,
            price,
            date: now,
            source: source.as_str().to_string(),
            created_at: now,
        }
    }
}
