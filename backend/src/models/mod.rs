pub mod asset;
pub mod category;
pub mod portfolio;
pub mod price_history;
pub mod report;
pub mod session;
pub mod snapshot;
pub mod user;
pub mod validation;

pub use asset::{
    Asset, AssetChanges, AssetDetail, AssetFilters, AssetRow, AssetView, AssetWithCategory,
    CreateAsset, NewAsset, Paginated, Pagination, UpdateAsset, UpdatePrice,
};
pub use category::CategoryWithCount;
pub use portfolio::{
    AssetPerformance, CategoryBreakdown, HistoryPeriod, HistoryQuery, PerformanceReport,
    PortfolioSummary, PortfolioTotals,
};
pub use price_history::{PriceHistory, PriceSource};
pub use report::{
    MonthlyReport, ReportPeriod, ReportQuery, ReportSummary, Sheet, TrendQuery, TrendReport,
    YearlyReport,
};
pub use session::UserSession;
pub use snapshot::PortfolioSnapshot;
pub use user::{AuthPayload, AuthUser, LoginUser, RegisterUser, User, VerifyPayload};
