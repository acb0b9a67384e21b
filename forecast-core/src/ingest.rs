use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::{
    aggregate::{StoreLedger, aggregate},
    config::{Config, Grid},
    display::{ForecastDisplay, to_display},
    error::Result,
    model::ForecastSlot,
    provider::{ForecastProvider, ForecastRequest},
    store::ForecastStore,
    time_window::{date_key, issuance_for, next_slot_for},
};

/// Runs fetch, aggregation and persistence of one batch at a time.
#[derive(Debug)]
pub struct Ingestion<P, S> {
    provider: P,
    store: S,
    grid: Grid,
    num_of_rows: u32,
}

impl<P: ForecastProvider, S: ForecastStore> Ingestion<P, S> {
    pub fn new(provider: P, store: S, grid: Grid, num_of_rows: u32) -> Self {
        Self {
            provider,
            store,
            grid,
            num_of_rows,
        }
    }

    pub fn from_config(provider: P, store: S, config: &Config) -> Self {
        Self::new(provider, store, config.grid, config.num_of_rows)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetches the batch published by `request_time`, aggregates it and
    /// persists summaries and slots. Nothing is written if any step fails.
    pub async fn run(&self, request_time: NaiveDateTime) -> Result<Vec<ForecastSlot>> {
        let issuance = issuance_for(request_time);
        let request = ForecastRequest::new(&issuance, self.grid, self.num_of_rows);

        info!(
            base_date = %request.base_date,
            base_time = %request.base_time,
            "ingesting forecast batch"
        );

        let items = self.provider.fetch(&request).await?;
        let aggregation = aggregate(&items, StoreLedger::new(&self.store))?;

        if !aggregation.warnings.is_empty() {
            warn!(
                count = aggregation.warnings.len(),
                "batch contains slots with missing categories"
            );
        }

        let saved = self
            .store
            .commit(aggregation.summaries, aggregation.slots)?;

        info!(rows = items.len(), slots = saved.len(), "forecast batch stored");
        Ok(saved)
    }

    /// Display lines of the stored slots from the next slot after `now`
    /// until the end of that slot's date.
    pub fn upcoming(&self, now: NaiveDateTime) -> Result<Vec<ForecastDisplay>> {
        let (date, slot_time) = next_slot_for(now);

        let slots = self
            .store
            .query_forecast_slots_from(&date_key(date), &slot_time)?;

        Ok(slots.iter().map(to_display).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codes::Category,
        error::ForecastError,
        model::ObservationItem,
        store::InMemoryStore,
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct StubProvider {
        items: Vec<ObservationItem>,
        requests: Mutex<Vec<ForecastRequest>>,
    }

    impl StubProvider {
        fn with_items(items: Vec<ObservationItem>) -> Self {
            Self {
                items,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ForecastProvider for StubProvider {
        async fn fetch(&self, request: &ForecastRequest) -> Result<Vec<ObservationItem>> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.items.clone())
        }
    }

    #[derive(Debug)]
    struct FailingProvider;

    #[async_trait]
    impl ForecastProvider for FailingProvider {
        async fn fetch(&self, _request: &ForecastRequest) -> Result<Vec<ObservationItem>> {
            Err(ForecastError::Provider("request timed out".into()))
        }
    }

    fn item(date: &str, time: &str, category: Category, value: &str) -> ObservationItem {
        ObservationItem {
            base_date: "20230825".into(),
            base_time: "0800".into(),
            category,
            fcst_date: date.into(),
            fcst_time: time.into(),
            fcst_value: value.into(),
            nx: 120,
            ny: 60,
        }
    }

    fn batch() -> Vec<ObservationItem> {
        let mut items = Vec::new();
        for (time, tmp) in [("0900", "25.8"), ("1000", "26.4"), ("1100", "27.1")] {
            items.push(item("20230825", time, Category::Tmp, tmp));
            items.push(item("20230825", time, Category::Pop, "0"));
            items.push(item("20230825", time, Category::Pcp, "강수없음"));
            items.push(item("20230825", time, Category::Reh, "78"));
            items.push(item("20230825", time, Category::Sky, "1"));
        }
        items.insert(1, item("20230825", "0900", Category::Tmx, "29"));
        items.insert(2, item("20230825", "0900", Category::Tmn, "24"));
        items
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 8, 25)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn ingestion<P: ForecastProvider>(provider: P) -> Ingestion<P, InMemoryStore> {
        Ingestion::new(provider, InMemoryStore::new(), Grid::default(), 10_000)
    }

    #[tokio::test]
    async fn run_persists_summary_and_slots() {
        let ingestion = ingestion(StubProvider::with_items(batch()));

        let saved = ingestion.run(at(8, 40)).await.unwrap();

        assert_eq!(saved.len(), 3);
        assert_eq!(saved[0].temperature, Some(25.8));

        let summary = ingestion
            .store()
            .find_daily_summary("20230825")
            .unwrap()
            .expect("summary stored");
        assert_eq!(summary.max_temperature, Some(29.0));
        assert_eq!(summary.min_temperature, Some(24.0));

        let stored = ingestion
            .store()
            .query_forecast_slots_from("20230825", "0000")
            .unwrap();
        assert_eq!(stored, saved);
    }

    #[tokio::test]
    async fn run_requests_current_window() {
        let ingestion = ingestion(StubProvider::with_items(batch()));
        ingestion.run(at(8, 40)).await.unwrap();

        let requests = ingestion.provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].base_date, "20230825");
        assert_eq!(requests[0].base_time, "0800");
        assert_eq!(requests[0].num_of_rows, 10_000);
    }

    #[tokio::test]
    async fn run_after_midnight_requests_prior_day_batch() {
        let ingestion = ingestion(StubProvider::with_items(batch()));
        ingestion.run(at(0, 10)).await.unwrap();

        let requests = ingestion.provider.requests.lock().unwrap();
        assert_eq!(requests[0].base_date, "20230824");
        assert_eq!(requests[0].base_time, "2300");
    }

    #[tokio::test]
    async fn provider_failure_is_surfaced() {
        let ingestion = ingestion(FailingProvider);

        let err = ingestion.run(at(8, 40)).await.unwrap_err();
        assert!(matches!(err, ForecastError::Provider(_)));
        assert!(ingestion.store().find_daily_summary("20230825").unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_batch_writes_nothing() {
        let ingestion = ingestion(StubProvider::with_items(Vec::new()));

        let err = ingestion.run(at(8, 40)).await.unwrap_err();
        assert!(matches!(err, ForecastError::EmptyBatch));
        assert!(
            ingestion
                .store()
                .query_forecast_slots_from("20230825", "0000")
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn aborted_pass_writes_nothing() {
        let mut items = batch();
        let last = items.len() - 1;
        items[last] = item("20230825", "1100", Category::Sky, "99");
        let ingestion = ingestion(StubProvider::with_items(items));

        let err = ingestion.run(at(8, 40)).await.unwrap_err();
        assert!(matches!(err, ForecastError::UnknownCode { code: 99, .. }));
        assert!(ingestion.store().find_daily_summary("20230825").unwrap().is_none());
    }

    #[tokio::test]
    async fn rerun_is_idempotent() {
        let ingestion = ingestion(StubProvider::with_items(batch()));

        let first = ingestion.run(at(8, 40)).await.unwrap();
        let second = ingestion.run(at(8, 45)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            ingestion
                .store()
                .query_forecast_slots_from("20230825", "0000")
                .unwrap()
                .len(),
            3
        );
    }

    #[tokio::test]
    async fn upcoming_starts_at_next_slot() {
        let ingestion = ingestion(StubProvider::with_items(batch()));
        ingestion.run(at(8, 40)).await.unwrap();

        let upcoming = ingestion.upcoming(at(9, 20)).unwrap();

        let times: Vec<&str> = upcoming.iter().map(|d| d.slot_time.as_str()).collect();
        assert_eq!(times, ["1000", "1100"]);
        assert_eq!(upcoming[0].temperature.as_deref(), Some("26.4"));
        assert_eq!(upcoming[0].sky.as_deref(), Some("sunny"));
    }
}
