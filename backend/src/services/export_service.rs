use chrono::{DateTime, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::{AssetWithCategory, Sheet};
use crate::services::portfolio_service;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const CSV_HEADERS: [&str; 13] = [
    "Name",
    "Category",
    "Symbol",
    "Quantity",
    "Acquisition Price",
    "Current Price",
    "Acquisition Date",
    "Currency",
    "Current Value",
    "Acquisition Value",
    "Gain/Loss",
    "Gain/Loss (%)",
    "Notes",
];

const MIN_COLUMN_WIDTH: f64 = 10.0;
const MAX_COLUMN_WIDTH: f64 = 50.0;

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Asset table as CSV. Text fields are quoted, numbers are not, and the
/// BOM lets spreadsheet apps detect UTF-8.
pub fn render_csv(assets: &[AssetWithCategory]) -> Result<Vec<u8>, AppError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(UTF8_BOM.to_vec());

    let csv_error = |e: csv::Error| AppError::Internal(format!("Failed to write CSV: {e}"));

    writer.write_record(CSV_HEADERS).map_err(csv_error)?;

    for item in assets {
        let a = &item.asset;
        let metrics = a.metrics();
        writer
            .write_record([
                a.name.clone(),
                item.category.name.clone(),
                a.symbol.clone().unwrap_or_default(),
                a.quantity.to_string(),
                money(a.acquisition_price),
                money(a.current_price),
                a.acquisition_date.format("%Y-%m-%d").to_string(),
                a.currency.clone(),
                money(metrics.current_value),
                money(metrics.acquisition_value),
                money(metrics.gain_loss),
                money(metrics.gain_loss_percent),
                a.notes.clone().unwrap_or_default(),
            ])
            .map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush CSV: {e}")))
}

pub fn csv_filename(now: DateTime<Utc>) -> String {
    format!("assets-{}.csv", now.format("%Y-%m-%d"))
}

fn cell_len(cell: &Value) -> usize {
    match cell {
        Value::Null => 0,
        Value::String(s) => s.chars().count(),
        other => other.to_string().chars().count(),
    }
}

/// Width per column: 1.2 × the longest cell, kept within 10..=50.
pub fn column_widths(headers: &[String], rows: &[Vec<Value>]) -> Vec<f64> {
    (0..headers.len())
        .map(|col| {
            let longest = rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(cell_len)
                .chain(std::iter::once(headers[col].chars().count()))
                .max()
                .unwrap_or(0);
            (longest as f64 * 1.2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
        })
        .collect()
}

fn sheet(name: &str, headers: &[&str], rows: Vec<Vec<Value>>) -> Sheet {
    let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let column_widths = column_widths(&headers, &rows);
    Sheet {
        name: name.to_string(),
        headers,
        rows,
        column_widths,
    }
}

/// The three workbook tabs: assets, per-category totals and the overall summary.
pub fn build_sheets(assets: &[AssetWithCategory], now: DateTime<Utc>) -> Vec<Sheet> {
    let asset_rows = assets
        .iter()
        .map(|item| {
            let a = &item.asset;
            let m = a.metrics();
            vec![
                json!(a.name),
                json!(a.symbol.clone().unwrap_or_default()),
                json!(item.category.name),
                json!(a.quantity),
                json!(round2(a.acquisition_price)),
                json!(round2(a.current_price)),
                json!(a.acquisition_date.format("%Y-%m-%d").to_string()),
                json!(round2(m.current_value)),
                json!(round2(m.gain_loss)),
                json!(round2(m.gain_loss_percent)),
                json!(a.notes.clone().unwrap_or_default()),
            ]
        })
        .collect();

    let category_rows = portfolio_service::category_breakdown(assets)
        .into_iter()
        .map(|c| {
            vec![
                json!(c.category_name),
                json!(c.asset_count),
                json!(round2(c.value)),
                json!(round2(c.percentage)),
                json!(round2(c.gain_loss)),
                json!(round2(c.gain_loss_percent)),
            ]
        })
        .collect();

    let totals = portfolio_service::totals(assets.iter().map(|a| &a.asset));
    let summary_rows = vec![
        vec![json!("Total Value"), json!(round2(totals.total_value))],
        vec![json!("Total Acquisition Value"), json!(round2(totals.total_acquisition_value))],
        vec![json!("Total Gain/Loss"), json!(round2(totals.total_gain_loss))],
        vec![json!("Total Gain/Loss (%)"), json!(round2(totals.total_gain_loss_percent))],
        vec![json!("Asset Count"), json!(assets.len())],
        vec![json!("Report Date"), json!(now.format("%Y-%m-%d").to_string())],
    ];

    vec![
        sheet(
            "Assets",
            &[
                "Name",
                "Symbol",
                "Category",
                "Quantity",
                "Acquisition Price",
                "Current Price",
                "Acquisition Date",
                "Current Value",
                "Gain/Loss",
                "Gain/Loss (%)",
                "Notes",
            ],
            asset_rows,
        ),
        sheet(
            "Category Summary",
            &[
                "Category",
                "Assets",
                "Current Value",
                "Allocation (%)",
                "Gain/Loss",
                "Gain/Loss (%)",
            ],
            category_rows,
        ),
        sheet("Portfolio Summary", &["Item", "Value"], summary_rows),
    ]
}

pub async fn export_csv(pool: &PgPool, user_id: Uuid) -> Result<Vec<u8>, AppError> {
    let assets = db::asset_queries::fetch_all_for_user(pool, user_id).await?;
    render_csv(&assets)
}

pub async fn export_sheets(pool: &PgPool, user_id: Uuid) -> Result<Vec<Sheet>, AppError> {
    let assets = db::asset_queries::fetch_all_for_user(pool, user_id).await?;
    Ok(build_sheets(&assets, Utc::now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::portfolio_service::tests::holding;
    use chrono::TimeZone;

    #[test]
    fn test_csv_starts_with_bom_and_quoted_headers() {
        let bytes = render_csv(&[]).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(
            text,
            "\"Name\",\"Category\",\"Symbol\",\"Quantity\",\"Acquisition Price\",\"Current Price\",\
             \"Acquisition Date\",\"Currency\",\"Current Value\",\"Acquisition Value\",\"Gain/Loss\",\
             \"Gain/Loss (%)\",\"Notes\"\n"
        );
    }

    #[test]
    fn test_csv_row_formats_money_and_escapes_quotes() {
        let mut item = holding("stocks", 10.0, 100.0, 150.0);
        item.asset.name = "Say \"hi\"".to_string();
        item.asset.notes = Some("long, term".to_string());

        let bytes = render_csv(&[item]).unwrap();
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let row = text.lines().nth(1).unwrap();

        assert_eq!(
            row,
            "\"Say \"\"hi\"\"\",\"STOCKS\",\"\",10,100.00,150.00,\"2024-01-01\",\"JPY\",\
             1500.00,1000.00,500.00,50.00,\"long, term\""
        );
    }

    #[test]
    fn test_csv_filename_uses_date() {
        let now = Utc.with_ymd_and_hms(2024, 7, 9, 23, 0, 0).unwrap();
        assert_eq!(csv_filename(now), "assets-2024-07-09.csv");
    }

    #[test]
    fn test_column_widths_are_clamped() {
        let headers = vec!["Id".to_string(), "Description".to_string(), "Body".to_string()];
        let rows = vec![vec![json!(1), json!("a".repeat(20)), json!("b".repeat(60))]];
        let widths = column_widths(&headers, &rows);
        assert_eq!(widths[0], 10.0);
        assert_eq!(widths[1], 24.0);
        assert_eq!(widths[2], 50.0);
    }

    #[test]
    fn test_build_sheets_layout() {
        let assets = vec![
            holding("stocks", 10.0, 100.0, 150.0),
            holding("bonds", 5.0, 200.0, 180.0),
        ];
        let now = Utc.with_ymd_and_hms(2024, 7, 9, 0, 0, 0).unwrap();
        let sheets = build_sheets(&assets, now);

        let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Assets", "Category Summary", "Portfolio Summary"]);
        assert_eq!(sheets[0].rows.len(), 2);
        assert_eq!(sheets[1].rows.len(), 2);
        assert_eq!(sheets[2].rows[0][1], json!(2400.0));
        assert_eq!(sheets[2].rows[3][1], json!(20.0));
        assert!(sheets.iter().all(|s| s.column_widths.len() == s.headers.len()));
    }
}
