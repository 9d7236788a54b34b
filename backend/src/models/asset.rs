use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::FieldError;
use crate::models::price_history::{PriceHistory, PriceSource};
use crate::models::validation::{self, FieldErrors};

pub const DEFAULT_CURRENCY: &str = "JPY";

/// `part / whole * 100`, or 0 when `whole` is not positive.
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

// A user-owned holding: quantity units bought at acquisition_price, now worth current_price each.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: String,
    pub name: String,
    pub symbol: Option<String>,
    pub quantity: f64,
    pub acquisition_price: f64,
    pub current_price: f64,
    pub acquisition_date: DateTime<Utc>,
    pub currency: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    pub fn current_value(&self) -> f64 {
        self.quantity * self.current_price
    }

    pub fn acquisition_value(&self) -> f64 {
        self.quantity * self.acquisition_price
    }

    pub fn gain_loss(&self) -> f64 {
        self.current_value() - self.acquisition_value()
    }

    pub fn gain_loss_percent(&self) -> f64 {
        percent_of(self.gain_loss(), self.acquisition_value())
    }

    pub fn metrics(&self) -> AssetMetrics {
        AssetMetrics {
            current_value: self.current_value(),
            acquisition_value: self.acquisition_value(),
            gain_loss: self.gain_loss(),
            gain_loss_percent: self.gain_loss_percent(),
        }
    }
}

/// Fields derived at response time, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMetrics {
    pub current_value: f64,
    pub acquisition_value: f64,
    pub gain_loss: f64,
    pub gain_loss_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetWithCategory {
    #[serde(flatten)]
    pub asset: Asset,
    pub category: CategoryRef,
}

// Flat row produced by the assets/asset_categories join.
#[derive(Debug, FromRow)]
pub struct AssetRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: String,
    pub name: String,
    pub symbol: Option<String>,
    pub quantity: f64,
    pub acquisition_price: f64,
    pub current_price: f64,
    pub acquisition_date: DateTime<Utc>,
    pub currency: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category_name: String,
    pub category_description: Option<String>,
    pub category_color: String,
    pub category_icon: Option<String>,
}

impl From<AssetRow> for AssetWithCategory {
    fn from(row: AssetRow) -> Self {
        Self {
            category: CategoryRef {
                id: row.category_id.clone(),
                name: row.category_name,
                description: row.category_description,
                color: row.category_color,
                icon: row.category_icon,
            },
            asset: Asset {
                id: row.id,
                user_id: row.user_id,
                category_id: row.category_id,
                name: row.name,
                symbol: row.symbol,
                quantity: row.quantity,
                acquisition_price: row.acquisition_price,
                current_price: row.current_price,
                acquisition_date: row.acquisition_date,
                currency: row.currency,
                notes: row.notes,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

/// An asset as returned by the API: stored fields, category and derived metrics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetView {
    #[serde(flatten)]
    pub asset: Asset,
    pub category: CategoryRef,
    #[serde(flatten)]
    pub metrics: AssetMetrics,
}

impl From<AssetWithCategory> for AssetView {
    fn from(value: AssetWithCategory) -> Self {
        let metrics = value.asset.metrics();
        Self {
            asset: value.asset,
            category: value.category,
            metrics,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDetail {
    #[serde(flatten)]
    pub view: AssetView,
    pub price_history: Vec<PriceHistory>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAsset {
    pub category_id: String,
    pub name: String,
    pub symbol: Option<String>,
    pub quantity: f64,
    pub acquisition_price: f64,
    pub current_price: Option<f64>,
    pub acquisition_date: String,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

/// A validated, normalized `CreateAsset`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAsset {
    pub category_id: String,
    pub name: String,
    pub symbol: Option<String>,
    pub quantity: f64,
    pub acquisition_price: f64,
    pub current_price: f64,
    pub acquisition_date: DateTime<Utc>,
    pub currency: String,
    pub notes: Option<String>,
}

impl CreateAsset {
    pub fn validate(self) -> Result<NewAsset, Vec<FieldError>> {
        let mut errors = FieldErrors::new();

        errors.check(!self.category_id.trim().is_empty(), "categoryId", "Category is required");
        errors.check(
            validation::char_len_between(self.name.trim(), 1, 200),
            "name",
            "Name is required and must be at most 200 characters",
        );
        check_symbol(&mut errors, self.symbol.as_deref());
        check_positive(&mut errors, "quantity", self.quantity);
        check_positive(&mut errors, "acquisitionPrice", self.acquisition_price);
        if let Some(price) = self.current_price {
            check_non_negative(&mut errors, "currentPrice", price);
        }
        check_currency(&mut errors, self.currency.as_deref());
        check_notes(&mut errors, self.notes.as_deref());

        let acquisition_date = match validation::parse_date(&self.acquisition_date) {
            Ok(date) => Some(date),
            Err(msg) => {
                errors.add("acquisitionDate", msg);
                None
            }
        };

        errors.into_result()?;
        let Some(acquisition_date) = acquisition_date else {
            return Err(vec![FieldError::new("acquisitionDate", "Invalid date")]);
        };

        Ok(NewAsset {
            category_id: self.category_id.trim().to_string(),
            name: self.name.trim().to_string(),
            symbol: normalize_optional(self.symbol),
            quantity: self.quantity,
            acquisition_price: self.acquisition_price,
            current_price: self.current_price.unwrap_or(self.acquisition_price),
            acquisition_date,
            currency: self
                .currency
                .map(|c| c.trim().to_ascii_uppercase())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            notes: normalize_optional(self.notes),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAsset {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub quantity: Option<f64>,
    pub acquisition_price: Option<f64>,
    pub current_price: Option<f64>,
    pub acquisition_date: Option<String>,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

/// A validated `UpdateAsset`; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetChanges {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub quantity: Option<f64>,
    pub acquisition_price: Option<f64>,
    pub current_price: Option<f64>,
    pub acquisition_date: Option<DateTime<Utc>>,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

impl UpdateAsset {
    pub fn validate(self) -> Result<AssetChanges, Vec<FieldError>> {
        let mut errors = FieldErrors::new();

        if let Some(name) = &self.name {
            errors.check(
                validation::char_len_between(name.trim(), 1, 200),
                "name",
                "Name must be between 1 and 200 characters",
            );
        }
        check_symbol(&mut errors, self.symbol.as_deref());
        if let Some(quantity) = self.quantity {
            check_positive(&mut errors, "quantity", quantity);
        }
        if let Some(price) = self.acquisition_price {
            check_positive(&mut errors, "acquisitionPrice", price);
        }
        if let Some(price) = self.current_price {
            check_non_negative(&mut errors, "currentPrice", price);
        }
        check_currency(&mut errors, self.currency.as_deref());
        check_notes(&mut errors, self.notes.as_deref());

        let acquisition_date = match self.acquisition_date.as_deref().map(validation::parse_date) {
            Some(Ok(date)) => Some(date),
            Some(Err(msg)) => {
                errors.add("acquisitionDate", msg);
                None
            }
            None => None,
        };

        errors.into_result()?;

        Ok(AssetChanges {
            name: self.name.map(|n| n.trim().to_string()),
            symbol: self.symbol.map(|s| s.trim().to_string()),
            quantity: self.quantity,
            acquisition_price: self.acquisition_price,
            current_price: self.current_price,
            acquisition_date,
            currency: self.currency.map(|c| c.trim().to_ascii_uppercase()),
            notes: self.notes,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePrice {
    pub current_price: f64,
    #[serde(default)]
    pub source: PriceSource,
}

impl UpdatePrice {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        check_non_negative(&mut errors, "currentPrice", self.current_price);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetSort {
    #[default]
    Name,
    AcquisitionDate,
    CurrentValue,
    GainLoss,
}

impl AssetSort {
    /// SQL expression over the `a` (assets) alias. Derived columns are
    /// computed in the query so that ORDER BY runs before LIMIT/OFFSET.
    pub fn sql_expression(&self) -> &'static str {
        match self {
            AssetSort::Name => "a.name",
            AssetSort::AcquisitionDate => "a.acquisition_date",
            AssetSort::CurrentValue => "(a.quantity * a.current_price)",
            AssetSort::GainLoss => "(a.quantity * a.current_price - a.quantity * a.acquisition_price)",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

pub fn order_by_clause(sort: AssetSort, order: SortOrder) -> String {
    format!(" ORDER BY {} {}, a.id ASC", sort.sql_expression(), order.sql())
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetFilters {
    pub category_id: Option<String>,
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub sort: AssetSort,
    #[serde(default)]
    pub order: SortOrder,
}

impl Default for AssetFilters {
    fn default() -> Self {
        Self {
            category_id: None,
            search: None,
            page: default_page(),
            limit: default_limit(),
            sort: AssetSort::default(),
            order: SortOrder::default(),
        }
    }
}

impl AssetFilters {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        errors.check(self.page >= 1, "page", "Page must be at least 1");
        errors.check(
            (1..=100).contains(&self.limit),
            "limit",
            "Limit must be between 1 and 100",
        );
        errors.into_result()
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }

    /// Substring `ILIKE` pattern; wildcards in the input match literally
    /// under `ESCAPE '\'`.
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                let escaped = s
                    .replace('\\', "\\\\")
                    .replace('%', "\\%")
                    .replace('_', "\\_");
                format!("%{}%", escaped)
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let limit_i = i64::from(limit.max(1));
        Self {
            page,
            limit,
            total,
            pages: (total + limit_i - 1) / limit_i,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

fn check_positive(errors: &mut FieldErrors, field: &str, value: f64) {
    errors.check(value.is_finite() && value > 0.0, field, "Must be a positive number");
}

fn check_non_negative(errors: &mut FieldErrors, field: &str, value: f64) {
    errors.check(value.is_finite() && value >= 0.0, field, "Must be zero or greater");
}

fn check_symbol(errors: &mut FieldErrors, symbol: Option<&str>) {
    if let Some(symbol) = symbol {
        errors.check(
            symbol.trim().chars().count() <= 20,
            "symbol",
            "Symbol must be at most 20 characters",
        );
    }
}

fn check_currency(errors: &mut FieldErrors, currency: Option<&str>) {
    if let Some(currency) = currency {
        errors.check(
            validation::is_currency_code(currency.trim()),
            "currency",
            "Currency must be a 3-letter code",
        );
    }
}

fn check_notes(errors: &mut FieldErrors, notes: Option<&str>) {
    if let Some(notes) = notes {
        errors.check(
            notes.chars().count() <= 1000,
            "notes",
            "Notes must be at most 1000 characters",
        );
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
