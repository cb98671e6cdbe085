// src/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing SHEET_ID")]
    MissingSheetId,

    #[error("Google Sheet error: {status}")]
    Upstream { status: u16 },

    #[error("Google Sheet request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MissingSheetId | AppError::Upstream { .. } | AppError::Transport(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_embeds_status() {
        let e = AppError::Upstream { status: 404 };
        assert_eq!(e.to_string(), "Google Sheet error: 404");
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn bad_request_maps_to_400() {
        assert_eq!(AppError::BadRequest("nope".into()).status(), StatusCode::BAD_REQUEST);
    }
}
