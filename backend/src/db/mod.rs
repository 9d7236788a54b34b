pub(crate) mod asset_queries;
pub(crate) mod category_queries;
pub(crate) mod price_history_queries;
pub(crate) mod session_queries;
pub(crate) mod snapshot_queries;
pub(crate) mod user_queries;
