pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod roles;
pub mod routes;
pub mod summarize;

use std::sync::Arc;

use config::Config;
use db::pool::DbPool;
use summarize::service::SummaryService;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub summarizer: Arc<SummaryService>,
}
