use chrono::{DateTime, Datelike, Duration, Months, TimeZone, Utc};

use crate::errors::AppError;
use crate::models::asset::percent_of;
use crate::models::report::{MonthlyBucket, TimeSeriesPoint};
use crate::models::validation::parse_date;
use crate::models::{Asset, AssetWithCategory, CategoryBreakdown, ReportPeriod, TrendQuery, TrendReport};
use crate::services::portfolio_service;

/// Longest span a custom trend range may cover.
pub const MAX_CUSTOM_RANGE_YEARS: u32 = 10;

/// Start and end of the sampled window.
pub fn resolve_range(
    query: &TrendQuery,
    assets: &[Asset],
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let months_back = |n: u32| now.checked_sub_months(Months::new(n)).unwrap_or(now);

    let start = match query.period {
        ReportPeriod::OneMonth => months_back(1),
        ReportPeriod::ThreeMonths => months_back(3),
        ReportPeriod::SixMonths => months_back(6),
        ReportPeriod::OneYear => months_back(12),
        ReportPeriod::All => assets
            .iter()
            .map(|a| a.acquisition_date)
            .min()
            .unwrap_or_else(|| months_back(12)),
        ReportPeriod::Custom => {
            let (Some(start), Some(end)) = (query.start_date.as_deref(), query.end_date.as_deref())
            else {
                return Err(AppError::Validation(
                    "startDate and endDate are required for a custom period".to_string(),
                ));
            };
            let start = parse_date(start).map_err(|e| AppError::Validation(format!("startDate: {e}")))?;
            let end = parse_date(end).map_err(|e| AppError::Validation(format!("endDate: {e}")))?;
            if start > end {
                return Err(AppError::Validation(
                    "startDate must not be after endDate".to_string(),
                ));
            }
            let too_long = start
                .checked_add_months(Months::new(MAX_CUSTOM_RANGE_YEARS * 12))
                .is_some_and(|limit| end > limit);
            if too_long {
                return Err(AppError::Validation(format!(
                    "Custom range must not exceed {MAX_CUSTOM_RANGE_YEARS} years"
                )));
            }
            return Ok((start, end));
        }
    };
    Ok((start, now))
}

/// 1 day up to 60 days, 3 days up to 180, weekly beyond.
pub fn step_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let span_secs = (end - start).num_seconds().max(0);
    let span_days = (span_secs + 86_399) / 86_400;
    match span_days {
        d if d <= 60 => 1,
        d if d <= 180 => 3,
        _ => 7,
    }
}

/// Linear estimate of the asset's price at `at`, moving from the
/// acquisition price at acquisition to the current price at `now`.
pub fn interpolated_price(asset: &Asset, at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let total = (now - asset.acquisition_date).num_milliseconds();
    let progress = if total == 0 {
        1.0
    } else {
        let elapsed = (at - asset.acquisition_date).num_milliseconds();
        (elapsed as f64 / total as f64).clamp(0.0, 1.0)
    };
    asset.acquisition_price + (asset.current_price - asset.acquisition_price) * progress
}

fn sample(assets: &[Asset], at: DateTime<Utc>, now: DateTime<Utc>) -> Option<TimeSeriesPoint> {
    let held: Vec<&Asset> = assets.iter().filter(|a| a.acquisition_date <= at).collect();
    if held.is_empty() {
        return None;
    }

    let (total_value, total_cost) = held.iter().fold((0.0, 0.0), |(value, cost), a| {
        (
            value + a.quantity * interpolated_price(a, at, now),
            cost + a.acquisition_value(),
        )
    });
    let total_gain_loss = total_value - total_cost;

    Some(TimeSeriesPoint {
        date: at.format("%Y-%m-%d").to_string(),
        total_value,
        total_cost,
        total_gain_loss,
        gain_loss_percent: percent_of(total_gain_loss, total_cost),
        asset_count: held.len(),
    })
}

/// Samples every `step_days` from `start` through `end` inclusive,
/// skipping instants before the first acquisition.
pub fn build_series(
    assets: &[Asset],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<TimeSeriesPoint> {
    let step = Duration::days(step_days(start, end));
    let mut series = Vec::new();
    let mut at = start;
    while at <= end {
        if let Some(point) = sample(assets, at, now) {
            series.push(point);
        }
        at = at + step;
    }
    series
}

fn month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// First instant of the month and of the following month.
pub fn month_bounds(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let (next_year, next) = next_month(year, month);
    Some((month_start(year, month)?, month_start(next_year, next)?))
}

/// Calendar months from the earliest acquisition through `now`. Each
/// bucket holds the current value of everything acquired by month end.
pub fn monthly_buckets(assets: &[Asset], now: DateTime<Utc>) -> Vec<MonthlyBucket> {
    let Some(earliest) = assets.iter().map(|a| a.acquisition_date).min() else {
        return Vec::new();
    };

    let last = (now.year(), now.month());
    let (mut year, mut month) = (earliest.year(), earliest.month());
    let mut buckets: Vec<MonthlyBucket> = Vec::new();

    while (year, month) <= last {
        let Some((_, month_end)) = month_bounds(year, month) else {
            break;
        };
        let value: f64 = assets
            .iter()
            .filter(|a| a.acquisition_date < month_end)
            .map(Asset::current_value)
            .sum();

        let (change, change_percent) = match buckets.last() {
            Some(prev) => (value - prev.value, percent_of(value - prev.value, prev.value)),
            None => (0.0, 0.0),
        };
        buckets.push(MonthlyBucket {
            month: format!("{:04}-{:02}", year, month),
            value,
            change,
            change_percent,
        });

        (year, month) = next_month(year, month);
    }
    buckets
}

/// Category breakdown, largest current value first.
pub fn category_performance(assets: &[AssetWithCategory]) -> Vec<CategoryBreakdown> {
    let mut categories = portfolio_service::category_breakdown(assets);
    categories.sort_by(|a, b| b.value.total_cmp(&a.value));
    categories
}

pub fn build_trend_report(
    query: &TrendQuery,
    assets: &[AssetWithCategory],
    now: DateTime<Utc>,
) -> Result<TrendReport, AppError> {
    let plain: Vec<Asset> = assets.iter().map(|a| a.asset.clone()).collect();
    let (start, end) = resolve_range(query, &plain, now)?;

    Ok(TrendReport {
        period: query.period,
        start_date: start,
        end_date: end,
        step_days: step_days(start, end),
        estimated: true,
        series: build_series(&plain, start, end, now),
        monthly: monthly_buckets(&plain, now),
        categories: category_performance(assets),
    })
}
