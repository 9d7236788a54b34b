use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::FieldError;
use crate::models::portfolio::{AssetPerformance, CategoryBreakdown};
use crate::models::validation::FieldErrors;

/// Span selector for the reconstructed value series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportPeriod {
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[default]
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "ALL")]
    All,
    #[serde(rename = "CUSTOM")]
    Custom,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendQuery {
    #[serde(default)]
    pub period: ReportPeriod,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    pub date: String,
    pub total_value: f64,
    pub total_cost: f64,
    pub total_gain_loss: f64,
    pub gain_loss_percent: f64,
    pub asset_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBucket {
    /// `YYYY-MM`
    pub month: String,
    pub value: f64,
    pub change: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub period: ReportPeriod,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub step_days: i64,
    /// Values between acquisition and now are interpolated, not observed.
    pub estimated: bool,
    pub series: Vec<TimeSeriesPoint>,
    pub monthly: Vec<MonthlyBucket>,
    pub categories: Vec<CategoryBreakdown>,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub year: i32,
    pub month: Option<u32>,
}

impl ReportQuery {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        errors.check(
            (2000..=2099).contains(&self.year),
            "year",
            "Year must be between 2000 and 2099",
        );
        if let Some(month) = self.month {
            errors.check((1..=12).contains(&month), "month", "Month must be between 1 and 12");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub total_value: f64,
    pub total_gain_loss: f64,
    pub total_gain_loss_percent: f64,
    /// Set when the totals come from a persisted snapshot.
    pub snapshot_date: Option<DateTime<Utc>>,
    pub category_breakdown: Vec<CategoryBreakdown>,
    pub asset_performance: Vec<AssetPerformance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyEntry {
    pub month: u32,
    pub total_value: f64,
    pub gain_loss: f64,
    pub gain_loss_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyReport {
    pub year: i32,
    pub total_value: f64,
    pub total_gain_loss: f64,
    pub total_gain_loss_percent: f64,
    pub monthly_data: Vec<MonthlyEntry>,
    pub best_performing_assets: Vec<AssetPerformance>,
    pub worst_performing_assets: Vec<AssetPerformance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryTotals {
    pub total_value: f64,
    pub total_gain_loss: f64,
    pub total_gain_loss_percent: f64,
    pub asset_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category_id: String,
    pub name: String,
    pub total_value: f64,
    pub total_gain_loss: f64,
    pub asset_count: usize,
    pub percentage: f64,
    pub gain_loss_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub summary: SummaryTotals,
    pub category_summary: Vec<CategorySummary>,
    pub last_updated: DateTime<Utc>,
}

/// One spreadsheet tab, ready for a client-side workbook writer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub column_widths: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_period_codes() {
        let period: ReportPeriod = serde_json::from_str("\"ALL\"").unwrap();
        assert_eq!(period, ReportPeriod::All);
        let period: ReportPeriod = serde_json::from_str("\"6M\"").unwrap();
        assert_eq!(period, ReportPeriod::SixMonths);
        assert!(serde_json::from_str::<ReportPeriod>("\"2Y\"").is_err());
    }

    #[test]
    fn test_report_query_bounds() {
        assert!(ReportQuery { year: 2024, month: Some(6) }.validate().is_ok());
        assert!(ReportQuery { year: 1999, month: None }.validate().is_err());
        assert!(ReportQuery { year: 2024, month: Some(13) }.validate().is_err());
    }
}
