pub(crate) mod assets;
pub(crate) mod auth;
pub(crate) mod categories;
pub(crate) mod health;
pub(crate) mod portfolio;
pub(crate) mod reports;
