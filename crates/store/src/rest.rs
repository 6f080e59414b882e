//! PostgREST-style remote adapter.
//!
//! One HTTP client serves both roles the upstream data platform plays:
//! the dataset source the validator reads, and the `validation_results`
//! table the orchestrator persists to. Only this adapter knows the wire
//! shape; everything above it works with domain types.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::debug;

use idxwatch_core::{
    DataServiceConfig, DataSlice, DataSource, DateRange, FetchError, TableKind, ValidationResult,
};

use crate::error::StoreError;
use crate::reader::{ResultReader, ResultStore};

const RESULTS_TABLE: &str = "validation_results";

/// Remote adapter over a PostgREST-style data service.
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    fetch_timeout_secs: u64,
}

impl RestStore {
    pub fn from_config(cfg: &DataServiceConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &cfg.api_key {
            if let Ok(value) = HeaderValue::from_str(key) {
                headers.insert("apikey", value);
            }
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {key}")) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(cfg.fetch_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            fetch_timeout_secs: cfg.fetch_timeout_secs,
        })
    }

    fn table_url(&self, slug: &str) -> String {
        format!("{}/rest/v1/{slug}", self.base_url)
    }

    /// PostgREST filter params for a windowed fetch, ascending by date.
    fn range_query(kind: TableKind, range: DateRange) -> Vec<(String, String)> {
        let column = kind.date_column();
        let mut params = vec![
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), format!("{column}.asc")),
        ];
        if let Some(start) = range.start {
            params.push((column.to_string(), format!("gte.{start}")));
        }
        if let Some(end) = range.end {
            params.push((column.to_string(), format!("lte.{end}")));
        }
        params
    }

    async fn fetch_rows<T: serde::de::DeserializeOwned>(
        &self,
        kind: TableKind,
        range: DateRange,
    ) -> Result<Vec<T>, FetchError> {
        let url = self.table_url(kind.slug());
        let params = Self::range_query(kind, range);
        debug!(table = %kind, %range, "fetching slice");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        table: kind,
                        seconds: self.fetch_timeout_secs,
                    }
                } else {
                    FetchError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                table: kind,
                code: status.as_u16(),
            });
        }

        response.json::<Vec<T>>().await.map_err(|e| FetchError::Decode {
            table: kind,
            detail: e.to_string(),
        })
    }
}

#[async_trait]
impl DataSource for RestStore {
    async fn fetch(&self, table: TableKind, range: DateRange) -> Result<DataSlice, FetchError> {
        let slice = match table {
            TableKind::AnnualFinancials => {
                DataSlice::AnnualFinancials(self.fetch_rows(table, range).await?)
            }
            TableKind::QuarterlyFinancials => {
                DataSlice::QuarterlyFinancials(self.fetch_rows(table, range).await?)
            }
            TableKind::DailyPrices => {
                DataSlice::DailyPrices(self.fetch_rows(table, range).await?)
            }
            TableKind::Dividends => DataSlice::Dividends(self.fetch_rows(table, range).await?),
            TableKind::Filings => DataSlice::Filings(self.fetch_rows(table, range).await?),
            TableKind::StockSplits => {
                DataSlice::StockSplits(self.fetch_rows(table, range).await?)
            }
        };
        Ok(slice)
    }
}

#[async_trait]
impl ResultStore for RestStore {
    async fn write(&self, result: &ValidationResult) -> Result<(), StoreError> {
        let url = self.table_url(RESULTS_TABLE);
        let response = self
            .client
            .post(&url)
            .header("Prefer", "return=minimal")
            .json(result)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                code: status.as_u16(),
            });
        }
        debug!(table = %result.table, run_id = %result.run_id, "result persisted");
        Ok(())
    }
}

#[async_trait]
impl ResultReader for RestStore {
    async fn read_recent(&self, limit: usize) -> Result<Vec<ValidationResult>, StoreError> {
        let url = self.table_url(RESULTS_TABLE);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("select", "*"),
                ("order", "executed_at.desc"),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                code: status.as_u16(),
            });
        }

        response
            .json::<Vec<ValidationResult>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}
