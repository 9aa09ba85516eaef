use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::utils::error::FieldError;

/// Success envelope: `{"success": true, "message": ..., "data": ...}`.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn success<T>(data: T, message: impl Into<String>) -> Response
where
    T: Serialize,
{
    let body = ApiResponse {
        success: true,
        message: Some(message.into()),
        data: Some(data),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Plain read responses carry no message, only data.
pub fn success_data<T>(data: T) -> Response
where
    T: Serialize,
{
    let body = ApiResponse {
        success: true,
        message: None,
        data: Some(data),
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub fn created<T>(data: T, message: impl Into<String>) -> Response
where
    T: Serialize,
{
    let body = ApiResponse {
        success: true,
        message: Some(message.into()),
        data: Some(data),
    };
    (StatusCode::CREATED, Json(body)).into_response()
}

pub fn empty_success(message: impl Into<String>) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: true,
        message: Some(message.into()),
        data: None,
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub fn error_response(
    status: StatusCode,
    message: impl Into<String>,
    detail: Option<String>,
) -> Response {
    let mut body = json!({
        "success": false,
        "message": message.into(),
    });
    if let Some(detail) = detail {
        body["error"] = json!(detail);
    }
    (status, Json(body)).into_response()
}

pub fn validation_response(errors: Vec<FieldError>) -> Response {
    let body = json!({
        "success": false,
        "message": "Validation failed",
        "errors": errors,
    });
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_skips_absent_fields() {
        let body = ApiResponse::<()> {
            success: true,
            message: Some("done".into()),
            data: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value, json!({"success": true, "message": "done"}));
    }

    #[test]
    fn validation_body_lists_field_errors() {
        let errors = vec![FieldError::new("page", "Page must be a positive integer")];
        let value = json!({
            "success": false,
            "message": "Validation failed",
            "errors": errors,
        });
        assert_eq!(
            value["errors"][0]["message"],
            "Page must be a positive integer"
        );
    }
}
