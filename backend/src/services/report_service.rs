use chrono::{DateTime, Datelike, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::report::{CategorySummary, MonthlyEntry, SummaryTotals};
use crate::models::{
    AssetWithCategory, MonthlyReport, PortfolioSnapshot, ReportQuery, ReportSummary, TrendQuery,
    TrendReport, YearlyReport,
};
use crate::services::{portfolio_service, timeseries_service};

fn bounds(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    timeseries_service::month_bounds(year, month)
        .ok_or_else(|| AppError::Validation(format!("Invalid month {year}-{month:02}")))
}

/// Totals from the month's latest snapshot when there is one, otherwise
/// from the live asset list.
pub fn build_monthly_report(
    year: i32,
    month: u32,
    snapshot: Option<&PortfolioSnapshot>,
    assets: &[AssetWithCategory],
) -> MonthlyReport {
    let asset_performance = portfolio_service::asset_performance(assets);

    match snapshot {
        Some(snapshot) => MonthlyReport {
            year,
            month,
            total_value: snapshot.total_value,
            total_gain_loss: snapshot.total_gain_loss,
            total_gain_loss_percent: snapshot.total_gain_loss_percent,
            snapshot_date: Some(snapshot.snapshot_date),
            category_breakdown: Vec::new(),
            asset_performance,
        },
        None => {
            let totals = portfolio_service::totals(assets.iter().map(|a| &a.asset));
            MonthlyReport {
                year,
                month,
                total_value: totals.total_value,
                total_gain_loss: totals.total_gain_loss,
                total_gain_loss_percent: totals.total_gain_loss_percent,
                snapshot_date: None,
                category_breakdown: portfolio_service::category_breakdown(assets),
                asset_performance,
            }
        }
    }
}

/// `snapshots` must be the year's snapshots in ascending date order.
pub fn build_yearly_report(
    year: i32,
    snapshots: &[PortfolioSnapshot],
    assets: &[AssetWithCategory],
) -> YearlyReport {
    let monthly_data = (1..=12)
        .map(|month| {
            let last = snapshots
                .iter()
                .filter(|s| s.snapshot_date.year() == year && s.snapshot_date.month() == month)
                .last();
            MonthlyEntry {
                month,
                total_value: last.map_or(0.0, |s| s.total_value),
                gain_loss: last.map_or(0.0, |s| s.total_gain_loss),
                gain_loss_percent: last.map_or(0.0, |s| s.total_gain_loss_percent),
            }
        })
        .collect();

    let ranked = portfolio_service::asset_performance(assets);
    let year_end = snapshots.last();

    YearlyReport {
        year,
        total_value: year_end.map_or(0.0, |s| s.total_value),
        total_gain_loss: year_end.map_or(0.0, |s| s.total_gain_loss),
        total_gain_loss_percent: year_end.map_or(0.0, |s| s.total_gain_loss_percent),
        monthly_data,
        best_performing_assets: portfolio_service::best(&ranked),
        worst_performing_assets: portfolio_service::worst(&ranked),
    }
}

// A holding worth nothing today reports 0% rather than -100%.
fn guarded_percent(value: f64, percent: f64) -> f64 {
    if value > 0.0 {
        percent
    } else {
        0.0
    }
}

pub fn build_summary(assets: &[AssetWithCategory], now: DateTime<Utc>) -> ReportSummary {
    let totals = portfolio_service::totals(assets.iter().map(|a| &a.asset));
    let category_summary = portfolio_service::category_breakdown(assets)
        .into_iter()
        .map(|c| CategorySummary {
            category_id: c.category_id,
            name: c.category_name,
            total_value: c.value,
            total_gain_loss: c.gain_loss,
            asset_count: c.asset_count,
            percentage: c.percentage,
            gain_loss_percent: guarded_percent(c.value, c.gain_loss_percent),
        })
        .collect();

    ReportSummary {
        summary: SummaryTotals {
            total_value: totals.total_value,
            total_gain_loss: totals.total_gain_loss,
            total_gain_loss_percent: guarded_percent(
                totals.total_value,
                totals.total_gain_loss_percent,
            ),
            asset_count: assets.len(),
        },
        category_summary,
        last_updated: now,
    }
}

pub async fn get_trends(pool: &PgPool, user_id: Uuid, query: TrendQuery) -> Result<TrendReport, AppError> {
    let assets = db::asset_queries::fetch_all_for_user(pool, user_id).await?;
    // Series length grows with span and holdings; sample off the async workers.
    tokio::task::spawn_blocking(move || {
        timeseries_service::build_trend_report(&query, &assets, Utc::now())
    })
    .await
    .map_err(|e| AppError::Internal(format!("Trend report task failed: {e}")))?
}

pub async fn get_monthly(pool: &PgPool, user_id: Uuid, query: ReportQuery) -> Result<MonthlyReport, AppError> {
    query.validate()?;
    let month = query
        .month
        .ok_or_else(|| AppError::Validation("month is required".to_string()))?;
    let (from, until) = bounds(query.year, month)?;

    let snapshots = db::snapshot_queries::fetch_range(pool, user_id, from, until).await?;
    let assets = db::asset_queries::fetch_all_for_user(pool, user_id).await?;
    Ok(build_monthly_report(query.year, month, snapshots.last(), &assets))
}

pub async fn get_yearly(pool: &PgPool, user_id: Uuid, query: ReportQuery) -> Result<YearlyReport, AppError> {
    query.validate()?;
    let (from, _) = bounds(query.year, 1)?;
    let (_, until) = bounds(query.year, 12)?;

    let snapshots = db::snapshot_queries::fetch_range(pool, user_id, from, until).await?;
    let assets = db::asset_queries::fetch_all_for_user(pool, user_id).await?;
    Ok(build_yearly_report(query.year, &snapshots, &assets))
}

pub async fn get_summary(pool: &PgPool, user_id: Uuid) -> Result<ReportSummary, AppError> {
    let assets = db::asset_queries::fetch_all_for_user(pool, user_id).await?;
    Ok(build_summary(&assets, Utc::now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PortfolioTotals;
    use crate::services::portfolio_service::tests::holding;
    use chrono::TimeZone;

    fn snapshot(y: i32, m: u32, d: u32, value: f64) -> PortfolioSnapshot {
        let totals = PortfolioTotals {
            total_value: value,
            total_acquisition_value: 100.0,
            total_gain_loss: value - 100.0,
            total_gain_loss_percent: value - 100.0,
        };
        PortfolioSnapshot::new(
            Uuid::nil(),
            &totals,
            Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_monthly_report_prefers_snapshot() {
        let assets = vec![holding("stocks", 10.0, 100.0, 150.0)];
        let snap = snapshot(2024, 5, 20, 130.0);
        let report = build_monthly_report(2024, 5, Some(&snap), &assets);

        assert_eq!(report.total_value, 130.0);
        assert_eq!(report.snapshot_date, Some(snap.snapshot_date));
        assert!(report.category_breakdown.is_empty());
        assert_eq!(report.asset_performance.len(), 1);
    }

    #[test]
    fn test_monthly_report_falls_back_to_live_totals() {
        let assets = vec![
            holding("stocks", 10.0, 100.0, 150.0),
            holding("bonds", 5.0, 200.0, 180.0),
        ];
        let report = build_monthly_report(2024, 5, None, &assets);

        assert_eq!(report.total_value, 2400.0);
        assert_eq!(report.total_gain_loss, 400.0);
        assert_eq!(report.total_gain_loss_percent, 20.0);
        assert_eq!(report.snapshot_date, None);
        assert_eq!(report.category_breakdown.len(), 2);
    }

    #[test]
    fn test_yearly_report_uses_last_snapshot_per_month() {
        let snapshots = vec![
            snapshot(2024, 1, 5, 110.0),
            snapshot(2024, 1, 25, 120.0),
            snapshot(2024, 3, 1, 90.0),
        ];
        let report = build_yearly_report(2024, &snapshots, &[]);

        assert_eq!(report.monthly_data.len(), 12);
        assert_eq!(report.monthly_data[0].total_value, 120.0);
        assert_eq!(report.monthly_data[1].total_value, 0.0);
        assert_eq!(report.monthly_data[2].total_value, 90.0);
        assert_eq!(report.monthly_data[2].gain_loss, -10.0);
        assert_eq!(report.total_value, 90.0);
        assert!(report.best_performing_assets.is_empty());
    }

    #[test]
    fn test_yearly_report_without_snapshots_is_zero() {
        let report = build_yearly_report(2023, &[], &[holding("cash", 1.0, 1.0, 1.0)]);
        assert_eq!(report.total_value, 0.0);
        assert!(report.monthly_data.iter().all(|m| m.total_value == 0.0));
        assert_eq!(report.best_performing_assets.len(), 1);
    }

    #[test]
    fn test_summary_counts_assets_and_categories() {
        let assets = vec![
            holding("stocks", 10.0, 100.0, 150.0),
            holding("stocks", 5.0, 200.0, 180.0),
            holding("cash", 1.0, 600.0, 600.0),
        ];
        let summary = build_summary(&assets, Utc::now());

        assert_eq!(summary.summary.asset_count, 3);
        assert_eq!(summary.summary.total_value, 3000.0);
        assert_eq!(summary.category_summary.len(), 2);
        assert_eq!(summary.category_summary[0].asset_count, 2);
        assert_eq!(summary.category_summary[0].percentage, 80.0);
        assert_eq!(summary.category_summary[1].name, "CASH");
    }

    #[test]
    fn test_summary_worthless_holdings_report_zero_percent() {
        let assets = vec![holding("stocks", 10.0, 100.0, 0.0)];
        let summary = build_summary(&assets, Utc::now());

        assert_eq!(summary.summary.total_value, 0.0);
        assert_eq!(summary.summary.total_gain_loss, -1000.0);
        assert_eq!(summary.summary.total_gain_loss_percent, 0.0);
        assert_eq!(summary.category_summary[0].gain_loss_percent, 0.0);
    }
}
