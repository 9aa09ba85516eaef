pub mod auth;
pub mod config;
pub mod export;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod utils;

use sqlx::PgPool;

/// Shared per-request context: the connection pool and the token secret used
/// by the [`auth::AuthUser`] extractor.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub jwt_secret: String,
}
