use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    config::{Config, Grid},
    error::{ForecastError, Result},
    model::ObservationItem,
    provider::kma::KmaProvider,
    time_window::Issuance,
};

pub mod kma;

/// Parameters of a single batch fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub base_date: String,
    pub base_time: String,
    pub grid: Grid,
    pub num_of_rows: u32,
}

impl ForecastRequest {
    pub fn new(issuance: &Issuance, grid: Grid, num_of_rows: u32) -> Self {
        Self {
            base_date: issuance.base_date_key(),
            base_time: issuance.base_time.clone(),
            grid,
            num_of_rows,
        }
    }
}

#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    /// Fetches the observation rows of one batch. An empty batch is an error.
    async fn fetch(&self, request: &ForecastRequest) -> Result<Vec<ObservationItem>>;
}

#[async_trait]
impl<T: ForecastProvider + ?Sized> ForecastProvider for Box<T> {
    async fn fetch(&self, request: &ForecastRequest) -> Result<Vec<ObservationItem>> {
        (**self).fetch(request).await
    }
}

/// Construct the HTTP provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn ForecastProvider>> {
    let service_key = config.service_key()?;

    let provider = KmaProvider::new(
        config.base_url.clone(),
        service_key.to_owned(),
        config.timeout(),
    )
    .map_err(ForecastError::from)?;

    Ok(Box::new(provider))
}
