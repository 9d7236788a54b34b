pub(crate) mod asset_service;
pub(crate) mod auth_service;
pub(crate) mod category_service;
pub(crate) mod export_service;
pub(crate) mod portfolio_service;
pub mod rate_limiter;
pub(crate) mod report_service;
pub(crate) mod timeseries_service;
