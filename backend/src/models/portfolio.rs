use chrono::{DateTime, Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Point-in-time totals over a set of assets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioTotals {
    pub total_value: f64,
    pub total_acquisition_value: f64,
    pub total_gain_loss: f64,
    pub total_gain_loss_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub category_id: String,
    pub category_name: String,
    pub color: String,
    pub asset_count: usize,
    pub value: f64,
    pub acquisition_value: f64,
    pub gain_loss: f64,
    pub gain_loss_percent: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    #[serde(flatten)]
    pub totals: PortfolioTotals,
    pub categories: Vec<CategoryBreakdown>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPerformance {
    pub asset_id: Uuid,
    pub asset_name: String,
    pub category: String,
    pub gain_loss: f64,
    pub gain_loss_percent: f64,
    pub current_value: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub best_performing: Vec<AssetPerformance>,
    pub worst_performing: Vec<AssetPerformance>,
    pub all: Vec<AssetPerformance>,
}

/// Window for the persisted snapshot history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum HistoryPeriod {
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[default]
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "all")]
    All,
}

impl HistoryPeriod {
    pub fn start_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let months_back = |n: u32| now.checked_sub_months(Months::new(n)).unwrap_or(now);
        match self {
            HistoryPeriod::OneWeek => now - chrono::Duration::days(7),
            HistoryPeriod::OneMonth => months_back(1),
            HistoryPeriod::ThreeMonths => months_back(3),
            HistoryPeriod::SixMonths => months_back(6),
            HistoryPeriod::OneYear => months_back(12),
            HistoryPeriod::All => Utc
                .with_ymd_and_hms(2000, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or(now),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub period: HistoryPeriod,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_history_period_windows() {
        let now = Utc.with_ymd_and_hms(2024, 5, 31, 12, 0, 0).unwrap();
        assert_eq!(HistoryPeriod::OneWeek.start_from(now).day(), 24);
        // Month arithmetic clamps to the last valid day.
        let one_month = HistoryPeriod::OneMonth.start_from(now);
        assert_eq!((one_month.month(), one_month.day()), (4, 30));
        assert_eq!(HistoryPeriod::OneYear.start_from(now).year(), 2023);
        assert_eq!(HistoryPeriod::All.start_from(now).year(), 2000);
    }

    #[test]
    fn test_history_query_defaults_to_one_year() {
        let query: HistoryQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.period, HistoryPeriod::OneYear);
        let query: HistoryQuery = serde_json::from_str(r#"{"period":"3m"}"#).unwrap();
        assert_eq!(query.period, HistoryPeriod::ThreeMonths);
    }
}
