// src/routes/health.rs

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResp { pub ok: bool, pub version: &'static str }

pub async fn health() -> Json<HealthResp> {
    Json(HealthResp { ok: true, version: "v1" })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::test_support::{app_over, get_json};

    #[tokio::test]
    async fn reports_ok() {
        let (status, body) = get_json(app_over(Vec::new()), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }
}
