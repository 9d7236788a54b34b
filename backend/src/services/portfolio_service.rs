use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::asset::percent_of;
use crate::models::{
    Asset, AssetPerformance, AssetWithCategory, CategoryBreakdown, HistoryPeriod,
    PerformanceReport, PortfolioSnapshot, PortfolioSummary, PortfolioTotals,
};

const RANKED_COUNT: usize = 5;

pub fn totals<'a>(assets: impl IntoIterator<Item = &'a Asset>) -> PortfolioTotals {
    let (total_value, total_acquisition_value) = assets
        .into_iter()
        .fold((0.0, 0.0), |(value, cost), a| {
            (value + a.current_value(), cost + a.acquisition_value())
        });
    let total_gain_loss = total_value - total_acquisition_value;

    PortfolioTotals {
        total_value,
        total_acquisition_value,
        total_gain_loss,
        total_gain_loss_percent: percent_of(total_gain_loss, total_acquisition_value),
    }
}

/// Groups by category in first-seen order. Percentages are shares of the
/// combined current value.
pub fn category_breakdown(assets: &[AssetWithCategory]) -> Vec<CategoryBreakdown> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<CategoryBreakdown> = Vec::new();

    for item in assets {
        let slot = *index.entry(item.asset.category_id.as_str()).or_insert_with(|| {
            groups.push(CategoryBreakdown {
                category_id: item.asset.category_id.clone(),
                category_name: item.category.name.clone(),
                color: item.category.color.clone(),
                asset_count: 0,
                value: 0.0,
                acquisition_value: 0.0,
                gain_loss: 0.0,
                gain_loss_percent: 0.0,
                percentage: 0.0,
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.asset_count += 1;
        group.value += item.asset.current_value();
        group.acquisition_value += item.asset.acquisition_value();
    }

    let total_value: f64 = groups.iter().map(|g| g.value).sum();
    for group in &mut groups {
        group.gain_loss = group.value - group.acquisition_value;
        group.gain_loss_percent = percent_of(group.gain_loss, group.acquisition_value);
        group.percentage = percent_of(group.value, total_value);
    }
    groups
}

pub fn summarize(assets: &[AssetWithCategory], now: DateTime<Utc>) -> PortfolioSummary {
    PortfolioSummary {
        totals: totals(assets.iter().map(|a| &a.asset)),
        categories: category_breakdown(assets),
        updated_at: now,
    }
}

/// Per-asset performance, best gain percentage first.
pub fn asset_performance(assets: &[AssetWithCategory]) -> Vec<AssetPerformance> {
    let mut rows: Vec<AssetPerformance> = assets
        .iter()
        .map(|item| AssetPerformance {
            asset_id: item.asset.id,
            asset_name: item.asset.name.clone(),
            category: item.category.name.clone(),
            gain_loss: item.asset.gain_loss(),
            gain_loss_percent: item.asset.gain_loss_percent(),
            current_value: item.asset.current_value(),
        })
        .collect();
    rows.sort_by(|a, b| b.gain_loss_percent.total_cmp(&a.gain_loss_percent));
    rows
}

pub fn best(ranked: &[AssetPerformance]) -> Vec<AssetPerformance> {
    ranked.iter().take(RANKED_COUNT).cloned().collect()
}

/// The bottom of the ranking, worst first.
pub fn worst(ranked: &[AssetPerformance]) -> Vec<AssetPerformance> {
    ranked.iter().rev().take(RANKED_COUNT).cloned().collect()
}

pub fn rank(assets: &[AssetWithCategory]) -> PerformanceReport {
    let all = asset_performance(assets);
    PerformanceReport {
        best_performing: best(&all),
        worst_performing: worst(&all),
        all,
    }
}

pub async fn get_summary(pool: &PgPool, user_id: Uuid) -> Result<PortfolioSummary, AppError> {
    let assets = db::asset_queries::fetch_all_for_user(pool, user_id).await?;
    Ok(summarize(&assets, Utc::now()))
}

pub async fn get_history(
    pool: &PgPool,
    user_id: Uuid,
    period: HistoryPeriod,
) -> Result<Vec<PortfolioSnapshot>, AppError> {
    let from = period.start_from(Utc::now());
    let snapshots = db::snapshot_queries::fetch_since(pool, user_id, from).await?;
    Ok(snapshots)
}

pub async fn create_snapshot(pool: &PgPool, user_id: Uuid) -> Result<PortfolioSnapshot, AppError> {
    let assets = db::asset_queries::fetch_all_for_user(pool, user_id).await?;
    let totals = totals(assets.iter().map(|a| &a.asset));
    let snapshot = PortfolioSnapshot::new(user_id, &totals, Utc::now());
    let saved = db::snapshot_queries::insert(pool, &snapshot).await?;
    Ok(saved)
}

pub async fn get_performance(pool: &PgPool, user_id: Uuid) -> Result<PerformanceReport, AppError> {
    let assets = db::asset_queries::fetch_all_for_user(pool, user_id).await?;
    Ok(rank(&assets))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::asset::tests::asset;
    use crate::models::asset::CategoryRef;

    pub(crate) fn holding(category: &str, quantity: f64, acquisition: f64, current: f64) -> AssetWithCategory {
        let mut a = asset(quantity, acquisition, current);
        a.category_id = category.to_string();
        AssetWithCategory {
            asset: a,
            category: CategoryRef {
                id: category.to_string(),
                name: category.to_uppercase(),
                description: None,
                color: "#000000".to_string(),
                icon: None,
            },
        }
    }

    #[test]
    fn test_totals_worked_example() {
        let assets = vec![asset(10.0, 100.0, 150.0), asset(5.0, 200.0, 180.0)];
        let t = totals(&assets);
        assert_eq!(t.total_value, 2400.0);
        assert_eq!(t.total_acquisition_value, 2000.0);
        assert_eq!(t.total_gain_loss, 400.0);
        assert_eq!(t.total_gain_loss_percent, 20.0);
    }

    #[test]
    fn test_empty_portfolio_is_all_zero() {
        let summary = summarize(&[], Utc::now());
        assert_eq!(summary.totals, PortfolioTotals::default());
        assert!(summary.categories.is_empty());
    }

    #[test]
    fn test_breakdown_groups_in_first_seen_order() {
        let assets = vec![
            holding("stocks", 10.0, 100.0, 150.0),
            holding("crypto", 1.0, 500.0, 500.0),
            holding("stocks", 5.0, 200.0, 180.0),
        ];
        let groups = category_breakdown(&assets);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].category_id, "stocks");
        assert_eq!(groups[0].asset_count, 2);
        assert_eq!(groups[0].value, 2400.0);
        assert_eq!(groups[0].gain_loss, 400.0);
        assert_eq!(groups[0].gain_loss_percent, 20.0);
        assert_eq!(groups[1].category_id, "crypto");
        assert_eq!(groups[0].category_name, "STOCKS");
    }

    #[test]
    fn test_breakdown_percentages_sum_to_hundred() {
        let assets = vec![
            holding("stocks", 3.0, 10.0, 11.0),
            holding("bonds", 7.0, 10.0, 9.0),
            holding("cash", 1.0, 50.0, 50.0),
        ];
        let sum: f64 = category_breakdown(&assets).iter().map(|g| g.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_breakdown_percentage_zero_when_nothing_is_worth_anything() {
        let assets = vec![holding("stocks", 3.0, 10.0, 0.0)];
        let groups = category_breakdown(&assets);
        assert_eq!(groups[0].percentage, 0.0);
        assert_eq!(groups[0].gain_loss_percent, -100.0);
    }

    #[test]
    fn test_rank_best_and_worst() {
        let assets: Vec<AssetWithCategory> = (0..7)
            .map(|i| holding("stocks", 1.0, 100.0, 100.0 + f64::from(i) * 10.0))
            .collect();
        let report = rank(&assets);

        assert_eq!(report.all.len(), 7);
        assert_eq!(report.all[0].gain_loss_percent, 60.0);
        assert_eq!(report.best_performing.len(), 5);
        assert_eq!(report.best_performing[0].gain_loss_percent, 60.0);
        assert_eq!(report.worst_performing.len(), 5);
        assert_eq!(report.worst_performing[0].gain_loss_percent, 0.0);
        assert_eq!(report.worst_performing[4].gain_loss_percent, 40.0);
    }

    #[test]
    fn test_rank_with_fewer_than_five() {
        let assets = vec![
            holding("stocks", 1.0, 100.0, 120.0),
            holding("stocks", 1.0, 100.0, 90.0),
        ];
        let report = rank(&assets);
        assert_eq!(report.best_performing.len(), 2);
        assert_eq!(report.worst_performing[0].gain_loss_percent, -10.0);
    }
}
