// src/routes/mod.rs

use axum::{routing::get, Router};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::AppState;

pub mod carbon_footprint;
pub mod energy;
pub mod health;
pub mod iaq;
pub mod wasted;

// Query shared by every sheet-backed report
#[derive(Debug, Default, Deserialize)]
pub struct TabQ {
    pub gid: Option<String>,
}

/// Calendar date on the server clock; month windows are relative to it.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // health
        .route("/healthz", get(health::health))
        // waste
        .route("/api/v1/wasted/json", get(wasted::rows_json))
        .route(
            "/api/v1/wasted/wasted-latest_four-quarterly",
            get(wasted::latest_four_quarterly),
        )
        .route("/api/v1/wasted/widget", get(wasted::widget))
        .route("/api/v1/wasted/wasted-floors", get(wasted::floors))
        .route("/api/v1/wasted/recycle-rate", get(wasted::recycle_rate))
        .route(
            "/api/v1/wasted/waste-management-information",
            get(wasted::management_information),
        )
        // carbon footprint
        .route(
            "/api/v1/carbon-footprint/carbonfootpint-floors",
            get(carbon_footprint::floors),
        )
        .route(
            "/api/v1/carbon-footprint/monthly-printing",
            get(carbon_footprint::monthly_printing),
        )
        .route(
            "/api/v1/carbon-footprint/carbon-reduction-info",
            get(carbon_footprint::reduction_info),
        )
        // energy (mock until meter data lands in the sheet)
        .route("/api/v1/energy_consumption/energy-floors", get(energy::floors))
        .route(
            "/api/v1/energy_consumption/energy-latest_four-quarterly",
            get(energy::latest_four_quarterly),
        )
        .route("/api/v1/energy_consumption/energy-eui", get(energy::eui))
        .route(
            "/api/v1/energy_consumption/energy-yearly-comparison",
            get(energy::yearly_comparison),
        )
        .route("/api/v1/energy_consumption/energy-solar", get(energy::solar))
        .route("/api/v1/energy_consumption/widget", get(energy::widget))
        // indoor air quality
        .route("/api/v1/IAQ/iaq/current", get(iaq::current))
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use chrono::Duration;
    use tower::ServiceExt;

    use super::router;
    use crate::{models::Record, sheets::cache::tests::FakeSource, sheets::RowCache, AppState};

    pub(crate) fn app_with(source: FakeSource) -> Router {
        let rows = RowCache::new(Arc::new(source), Some("sheet".into()), Duration::days(30));
        router(AppState { rows: Arc::new(rows) })
    }

    pub(crate) fn app_over(records: Vec<Record>) -> Router {
        app_with(FakeSource::new(records))
    }

    pub(crate) async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    pub(crate) fn waste(date: &str, floor: &str) -> Record {
        Record {
            date: Some(date.to_string()),
            submitted_by: Some("ทดสอบ".into()),
            floor: Some(floor.to_string()),
            ..Record::default()
        }
    }
}
