use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::{
    error::{ForecastError, Result},
    model::ObservationItem,
    provider::{ForecastProvider, ForecastRequest},
};

const DATA_TYPE: &str = "JSON";
const SUCCESS_CODE: &str = "00";

/// Client of the short-term forecast service. One request per fetch, bounded
/// by the client timeout, never retried.
#[derive(Debug, Clone)]
pub struct KmaProvider {
    base_url: String,
    service_key: String,
    http: Client,
}

impl KmaProvider {
    pub fn new(base_url: String, service_key: String, timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            service_key,
            http,
        })
    }
}

#[derive(Debug, Deserialize)]
struct KmaEnvelope {
    response: KmaResponse,
}

#[derive(Debug, Deserialize)]
struct KmaResponse {
    header: KmaHeader,
    body: Option<KmaBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KmaHeader {
    result_code: String,
    result_msg: String,
}

#[derive(Debug, Deserialize)]
struct KmaBody {
    items: Option<KmaItems>,
}

#[derive(Debug, Deserialize)]
struct KmaItems {
    #[serde(default)]
    item: Vec<ObservationItem>,
}

/// Extracts the observation rows from a response document.
fn parse_batch(body: &str) -> Result<Vec<ObservationItem>> {
    let envelope: KmaEnvelope = serde_json::from_str(body)?;
    let response = envelope.response;

    if response.header.result_code != SUCCESS_CODE {
        return Err(ForecastError::Provider(format!(
            "provider returned {}: {}",
            response.header.result_code, response.header.result_msg
        )));
    }

    let items = response
        .body
        .and_then(|b| b.items)
        .map(|i| i.item)
        .unwrap_or_default();

    if items.is_empty() {
        return Err(ForecastError::Provider(
            "provider returned no forecast items".to_string(),
        ));
    }

    Ok(items)
}

#[async_trait]
impl ForecastProvider for KmaProvider {
    async fn fetch(&self, request: &ForecastRequest) -> Result<Vec<ObservationItem>> {
        let num_of_rows = request.num_of_rows.to_string();
        let nx = request.grid.nx.to_string();
        let ny = request.grid.ny.to_string();

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("serviceKey", self.service_key.as_str()),
                ("pageNo", "1"),
                ("numOfRows", num_of_rows.as_str()),
                ("dataType", DATA_TYPE),
                ("base_date", request.base_date.as_str()),
                ("base_time", request.base_time.as_str()),
                ("nx", nx.as_str()),
                ("ny", ny.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(ForecastError::Provider(format!(
                "request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let items = parse_batch(&body)?;
        debug!(
            base_date = %request.base_date,
            base_time = %request.base_time,
            rows = items.len(),
            "forecast batch fetched"
        );

        Ok(items)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
