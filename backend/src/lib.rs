pub mod app;
pub mod auth;
pub mod config;
mod db;
pub mod errors;
pub mod extract;
pub mod logging;
pub mod models;
pub mod response;
mod routes;
pub mod services;
pub mod state;

pub use app::create_app;
pub use config::Config;
pub use state::AppState;
