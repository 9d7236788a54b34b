use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::portfolio::PortfolioTotals;

// A persisted point-in-time portfolio total, used for historical charting.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_value: f64,
    pub total_gain_loss: f64,
    pub total_gain_loss_percent: f64,
    pub snapshot_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PortfolioSnapshot {
    pub fn new(user_id: Uuid, totals: &PortfolioTotals, snapshot_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            total_value: totals.total_value,
            total_gain_loss: totals.total_gain_loss,
            total_gain_loss_percent: totals.total_gain_loss_percent,
            snapshot_date,
            created_at: Utc::now(),
        }
    }
}
