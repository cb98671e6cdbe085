// src/sheets/source.rs

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use super::parse::parse_records;
use crate::{error::AppError, models::Record};

/// Where sheet rows come from. `gid` selects a tab; `None` means the first one.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_rows(&self, sheet_id: &str, gid: Option<&str>) -> Result<Vec<Record>, AppError>;
}

/// Reads a Google Sheet through its CSV export link.
pub struct SheetClient {
    http: reqwest::Client,
    export_base: String,
}

impl SheetClient {
    pub fn new(export_base: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            export_base: export_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn export_url(&self, sheet_id: &str, gid: Option<&str>) -> String {
        let base = format!("{}/{}/export?format=csv", self.export_base, sheet_id);
        match gid {
            Some(gid) if !gid.is_empty() => format!("{base}&gid={gid}"),
            _ => base,
        }
    }
}

#[async_trait]
impl RowSource for SheetClient {
    async fn fetch_rows(&self, sheet_id: &str, gid: Option<&str>) -> Result<Vec<Record>, AppError> {
        if sheet_id.trim().is_empty() {
            return Err(AppError::MissingSheetId);
        }

        let url = self.export_url(sheet_id, gid);
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Upstream { status: status.as_u16() });
        }

        let text = resp.text().await?;
        let rows = parse_records(&text);
        info!(rows = rows.len(), gid = gid.unwrap_or("default"), "fetched sheet export");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SheetClient {
        SheetClient::new("https://docs.google.com/spreadsheets/d/", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn export_url_with_and_without_tab() {
        let c = client();
        assert_eq!(
            c.export_url("abc", None),
            "https://docs.google.com/spreadsheets/d/abc/export?format=csv"
        );
        assert_eq!(
            c.export_url("abc", Some("42")),
            "https://docs.google.com/spreadsheets/d/abc/export?format=csv&gid=42"
        );
        assert_eq!(c.export_url("abc", Some("")), c.export_url("abc", None));
    }

    #[tokio::test]
    async fn blank_sheet_id_is_a_config_error() {
        let err = client().fetch_rows(" ", None).await.unwrap_err();
        assert!(matches!(err, AppError::MissingSheetId));
    }
}
