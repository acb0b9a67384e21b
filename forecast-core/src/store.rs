use std::{
    collections::BTreeMap,
    fmt::Debug,
    sync::{Mutex, MutexGuard},
};

use crate::{
    error::{ForecastError, Result},
    model::{DailySummary, ForecastSlot},
};

/// Durable home of daily summaries and forecast slots.
pub trait ForecastStore: Send + Sync + Debug {
    fn find_daily_summary(&self, forecast_date: &str) -> Result<Option<DailySummary>>;

    /// Inserts the summary, or merges it into the one already stored for
    /// its date. Returns the stored record.
    fn save_or_update_daily_summary(&self, summary: DailySummary) -> Result<DailySummary>;

    fn save_forecast_slots(&self, slots: Vec<ForecastSlot>) -> Result<Vec<ForecastSlot>>;

    /// Slots of `forecast_date` at or after `slot_time`, ordered by slot time.
    fn query_forecast_slots_from(
        &self,
        forecast_date: &str,
        slot_time: &str,
    ) -> Result<Vec<ForecastSlot>>;

    /// Persists one batch, summaries first so no slot is saved before the
    /// summary it belongs to.
    fn commit(
        &self,
        summaries: Vec<DailySummary>,
        slots: Vec<ForecastSlot>,
    ) -> Result<Vec<ForecastSlot>> {
        for summary in summaries {
            self.save_or_update_daily_summary(summary)?;
        }
        self.save_forecast_slots(slots)
    }
}

#[derive(Debug, Default)]
struct Tables {
    summaries: BTreeMap<String, DailySummary>,
    slots: BTreeMap<(String, String), ForecastSlot>,
}

impl Tables {
    fn upsert_summary(&mut self, summary: DailySummary) -> DailySummary {
        self.summaries
            .entry(summary.forecast_date.clone())
            .and_modify(|stored| stored.merge(&summary))
            .or_insert(summary)
            .clone()
    }

    /// Fails if any slot's date has neither a stored nor a `pending` summary.
    fn check_slots(&self, slots: &[ForecastSlot], pending: &[&str]) -> Result<()> {
        match slots.iter().find(|s| {
            !pending.contains(&s.forecast_date.as_str())
                && !self.summaries.contains_key(&s.forecast_date)
        }) {
            Some(orphan) => Err(ForecastError::Store(format!(
                "slot {} {} has no daily summary",
                orphan.forecast_date, orphan.slot_time
            ))),
            None => Ok(()),
        }
    }

    fn insert_slots(&mut self, slots: Vec<ForecastSlot>) -> Vec<ForecastSlot> {
        for slot in &slots {
            self.slots.insert(
                (slot.forecast_date.clone(), slot.slot_time.clone()),
                slot.clone(),
            );
        }
        slots
    }
}

/// Process-local store. A later batch replaces slots with the same date and time.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|e| ForecastError::Store(format!("store lock poisoned: {e}")))
    }
}

impl ForecastStore for InMemoryStore {
    fn find_daily_summary(&self, forecast_date: &str) -> Result<Option<DailySummary>> {
        Ok(self.lock()?.summaries.get(forecast_date).cloned())
    }

    fn save_or_update_daily_summary(&self, summary: DailySummary) -> Result<DailySummary> {
        Ok(self.lock()?.upsert_summary(summary))
    }

    fn save_forecast_slots(&self, slots: Vec<ForecastSlot>) -> Result<Vec<ForecastSlot>> {
        let mut tables = self.lock()?;
        tables.check_slots(&slots, &[])?;
        Ok(tables.insert_slots(slots))
    }

    fn query_forecast_slots_from(
        &self,
        forecast_date: &str,
        slot_time: &str,
    ) -> Result<Vec<ForecastSlot>> {
        let tables = self.lock()?;
        let from = (forecast_date.to_string(), slot_time.to_string());

        Ok(tables
            .slots
            .range(from..)
            .take_while(|((date, _), _)| date == forecast_date)
            .map(|(_, slot)| slot.clone())
            .collect())
    }

    fn commit(
        &self,
        summaries: Vec<DailySummary>,
        slots: Vec<ForecastSlot>,
    ) -> Result<Vec<ForecastSlot>> {
        let mut tables = self.lock()?;

        let pending: Vec<&str> = summaries.iter().map(|s| s.forecast_date.as_str()).collect();
        tables.check_slots(&slots, &pending)?;

        for summary in summaries {
            tables.upsert_summary(summary);
        }
        Ok(tables.insert_slots(slots))
    }
}
