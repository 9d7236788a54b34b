use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::asset::order_by_clause;
use crate::models::{
    Asset, AssetChanges, AssetFilters, AssetRow, AssetWithCategory, NewAsset, PriceHistory,
};

const SELECT_WITH_CATEGORY: &str = "SELECT a.id, a.user_id, a.category_id, a.name, a.symbol,
        a.quantity, a.acquisition_price, a.current_price, a.acquisition_date,
        a.currency, a.notes, a.created_at, a.updated_at,
        c.name AS category_name, c.description AS category_description,
        c.color AS category_color, c.icon AS category_icon
     FROM assets a
     JOIN asset_categories c ON c.id = a.category_id";

const ASSET_COLUMNS: &str = "id, user_id, category_id, name, symbol, quantity, acquisition_price,
     current_price, acquisition_date, currency, notes, created_at, updated_at";

fn push_filters(query_builder: &mut QueryBuilder<'_, Postgres>, user_id: Uuid, filters: &AssetFilters) {
    query_builder.push(" WHERE a.user_id = ");
    query_builder.push_bind(user_id);

    if let Some(category_id) = filters.category_id.as_deref().filter(|c| !c.is_empty()) {
        query_builder.push(" AND a.category_id = ");
        query_builder.push_bind(category_id.to_string());
    }

    if let Some(pattern) = filters.search_pattern() {
        query_builder.push(" AND (a.name ILIKE ");
        query_builder.push_bind(pattern.clone());
        query_builder.push(r" ESCAPE '\' OR a.symbol ILIKE ");
        query_builder.push_bind(pattern);
        query_builder.push(r" ESCAPE '\')");
    }
}

/// One page of the user's assets. Ordering, including derived columns,
/// is applied before LIMIT/OFFSET.
pub async fn fetch_page(
    pool: &PgPool,
    user_id: Uuid,
    filters: &AssetFilters,
) -> Result<Vec<AssetWithCategory>, sqlx::Error> {
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_WITH_CATEGORY);
    push_filters(&mut query_builder, user_id, filters);
    query_builder.push(order_by_clause(filters.sort, filters.order));
    query_builder.push(" LIMIT ");
    query_builder.push_bind(i64::from(filters.limit));
    query_builder.push(" OFFSET ");
    query_builder.push_bind(filters.offset());

    let rows = query_builder
        .build_query_as::<AssetRow>()
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(AssetWithCategory::from).collect())
}

pub async fn count(pool: &PgPool, user_id: Uuid, filters: &AssetFilters) -> Result<i64, sqlx::Error> {
    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM assets a");
    push_filters(&mut query_builder, user_id, filters);

    query_builder
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
}

/// Every asset of the user, oldest acquisition first.
pub async fn fetch_all_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<AssetWithCategory>, sqlx::Error> {
    let sql = format!(
        "{} WHERE a.user_id = $1 ORDER BY a.acquisition_date ASC, a.id ASC",
        SELECT_WITH_CATEGORY
    );
    let rows = sqlx::query_as::<_, AssetRow>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(AssetWithCategory::from).collect())
}

pub async fn fetch_one(
    pool: &PgPool,
    user_id: Uuid,
    asset_id: Uuid,
) -> Result<Option<AssetWithCategory>, sqlx::Error> {
    let sql = format!("{} WHERE a.id = $1 AND a.user_id = $2", SELECT_WITH_CATEGORY);
    let row = sqlx::query_as::<_, AssetRow>(&sql)
        .bind(asset_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(AssetWithCategory::from))
}

pub async fn insert(pool: &PgPool, user_id: Uuid, input: &NewAsset) -> Result<Asset, sqlx::Error> {
    let sql = format!(
        "INSERT INTO assets ({cols})
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), NOW())
         RETURNING {cols}",
        cols = ASSET_COLUMNS
    );
    sqlx::query_as::<_, Asset>(&sql)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&input.category_id)
        .bind(&input.name)
        .bind(&input.symbol)
        .bind(input.quantity)
        .bind(input.acquisition_price)
        .bind(input.current_price)
        .bind(input.acquisition_date)
        .bind(&input.currency)
        .bind(&input.notes)
        .fetch_one(pool)
        .await
}

/// Applies `changes` to an owned asset. `None` when the asset does not
/// exist or belongs to someone else.
pub async fn update(
    pool: &PgPool,
    user_id: Uuid,
    asset_id: Uuid,
    changes: AssetChanges,
) -> Result<Option<Asset>, sqlx::Error> {
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE assets SET ");

    let mut separated = query_builder.separated(", ");

    if let Some(name) = changes.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name);
    }

    if let Some(symbol) = changes.symbol {
        separated.push("symbol = ");
        separated.push_bind_unseparated(Some(symbol).filter(|s| !s.is_empty()));
    }

    if let Some(quantity) = changes.quantity {
        separated.push("quantity = ");
        separated.push_bind_unseparated(quantity);
    }

    if let Some(price) = changes.acquisition_price {
        separated.push("acquisition_price = ");
        separated.push_bind_unseparated(price);
    }

    if let Some(price) = changes.current_price {
        separated.push("current_price = ");
        separated.push_bind_unseparated(price);
    }

    if let Some(date) = changes.acquisition_date {
        separated.push("acquisition_date = ");
        separated.push_bind_unseparated(date);
    }

    if let Some(currency) = changes.currency {
        separated.push("currency = ");
        separated.push_bind_unseparated(currency);
    }

    if let Some(notes) = changes.notes {
        separated.push("notes = ");
        separated.push_bind_unseparated(Some(notes).filter(|n| !n.trim().is_empty()));
    }

    separated.push("updated_at = NOW()");

    query_builder.push(" WHERE id = ");
    query_builder.push_bind(asset_id);
    query_builder.push(" AND user_id = ");
    query_builder.push_bind(user_id);
    query_builder.push(" RETURNING ");
    query_builder.push(ASSET_COLUMNS);

    query_builder
        .build_query_as::<Asset>()
        .fetch_optional(pool)
        .await
}

/// Returns the number of deleted rows; 0 means not found or not owned.
pub async fn delete(pool: &PgPool, user_id: Uuid, asset_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM assets WHERE id = $1 AND user_id = $2")
        .bind(asset_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Records `entry` and moves the owned asset's current price to it.
pub async fn update_price(
    pool: &PgPool,
    user_id: Uuid,
    entry: &PriceHistory,
) -> Result<Option<Asset>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        "UPDATE assets SET current_price = $1, updated_at = NOW()
         WHERE id = $2 AND user_id = $3
         RETURNING {}",
        ASSET_COLUMNS
    );
    let updated = sqlx::query_as::<_, Asset>(&sql)
        .bind(entry.price)
        .bind(entry.asset_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

    let Some(asset) = updated else {
        tx.rollback().await?;
        return Ok(None);
    };

    sqlx::query(
        "INSERT INTO price_history (id, asset_id, price, date, source, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(entry.id)
    .bind(entry.asset_id)
    .bind(entry.price)
    .bind(entry.date)
    .bind(&entry.source)
    .bind(entry.created_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(asset))
}
