//! Streaming aggregation of a provider batch into slots and daily summaries.
//!
//! Rows are grouped by contiguity: a slot closes as soon as the incoming
//! forecast date or time differs from the open one. The batch is never sorted.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::{
    codes::Category,
    display::{parse_value, slot_from_group},
    error::{ForecastError, Result},
    model::{Aggregation, DailySummary, ForecastSlot, MissingFieldWarning, ObservationItem},
    store::ForecastStore,
};

/// Source of the [`DailySummary`] each date's extremes are written into.
///
/// `get_or_create` must hand back the same record for the same date for the
/// lifetime of the ledger.
pub trait SummaryLedger {
    fn get_or_create(&mut self, forecast_date: &str, issuance_time: &str)
    -> Result<&mut DailySummary>;

    /// Every summary handed out, in first-seen order.
    fn into_summaries(self) -> Vec<DailySummary>;
}

/// Ledger starting from empty summaries.
#[derive(Debug, Default)]
pub struct BatchLedger {
    index: HashMap<String, usize>,
    summaries: Vec<DailySummary>,
}

impl BatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_or_insert_with(
        &mut self,
        forecast_date: &str,
        create: impl FnOnce() -> Result<DailySummary>,
    ) -> Result<&mut DailySummary> {
        let existing = self.index.get(forecast_date).copied();
        let idx = match existing {
            Some(idx) => idx,
            None => {
                self.summaries.push(create()?);
                self.index
                    .insert(forecast_date.to_string(), self.summaries.len() - 1);
                self.summaries.len() - 1
            }
        };
        Ok(&mut self.summaries[idx])
    }
}

impl SummaryLedger for BatchLedger {
    fn get_or_create(
        &mut self,
        forecast_date: &str,
        issuance_time: &str,
    ) -> Result<&mut DailySummary> {
        self.get_or_insert_with(forecast_date, || {
            Ok(DailySummary::new(forecast_date, issuance_time))
        })
    }

    fn into_summaries(self) -> Vec<DailySummary> {
        self.summaries
    }
}

/// Ledger seeding each date from the summary already in the store, so a batch
/// without TMX/TMN rows keeps the extremes known from earlier batches.
/// Reads only; nothing is written until the batch is committed.
#[derive(Debug)]
pub struct StoreLedger<'a, S: ForecastStore + ?Sized> {
    store: &'a S,
    ledger: BatchLedger,
}

impl<'a, S: ForecastStore + ?Sized> StoreLedger<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            ledger: BatchLedger::new(),
        }
    }
}

impl<S: ForecastStore + ?Sized> SummaryLedger for StoreLedger<'_, S> {
    fn get_or_create(
        &mut self,
        forecast_date: &str,
        issuance_time: &str,
    ) -> Result<&mut DailySummary> {
        let store = self.store;
        self.ledger.get_or_insert_with(forecast_date, || {
            let mut summary = store
                .find_daily_summary(forecast_date)?
                .unwrap_or_else(|| DailySummary::new(forecast_date, issuance_time));
            summary.issuance_time = issuance_time.to_string();
            Ok(summary)
        })
    }

    fn into_summaries(self) -> Vec<DailySummary> {
        self.ledger.into_summaries()
    }
}

/// Open slot threaded through the fold.
struct SlotState<'a> {
    forecast_date: &'a str,
    slot_time: &'a str,
    pending: Vec<&'a ObservationItem>,
}

impl<'a> SlotState<'a> {
    fn open(item: &'a ObservationItem) -> Self {
        Self {
            forecast_date: &item.fcst_date,
            slot_time: &item.fcst_time,
            pending: Vec::new(),
        }
    }

    fn holds(&self, item: &ObservationItem) -> bool {
        self.forecast_date == item.fcst_date && self.slot_time == item.fcst_time
    }

    fn close(self) -> Result<(ForecastSlot, Vec<MissingFieldWarning>)> {
        let (slot, warnings) = slot_from_group(self.forecast_date, self.slot_time, &self.pending)?;
        debug!(
            forecast_date = %slot.forecast_date,
            slot_time = %slot.slot_time,
            rows = self.pending.len(),
            "slot finalized"
        );
        for w in &warnings {
            warn!(
                forecast_date = %w.forecast_date,
                slot_time = %w.slot_time,
                category = %w.category,
                "slot is missing a category"
            );
        }
        Ok((slot, warnings))
    }
}

struct Fold<'a> {
    open: SlotState<'a>,
    slots: Vec<ForecastSlot>,
    warnings: Vec<MissingFieldWarning>,
}

impl Fold<'_> {
    fn push_closed(&mut self, (slot, warnings): (ForecastSlot, Vec<MissingFieldWarning>)) {
        self.slots.push(slot);
        self.warnings.extend(warnings);
    }
}

/// Aggregates one batch into slots and daily summaries in a single pass.
///
/// Fails on an empty batch, on malformed numeric values and on enumerated
/// codes outside the code tables. Missing categories are only warnings.
pub fn aggregate<L: SummaryLedger>(
    items: &[ObservationItem],
    mut ledger: L,
) -> Result<Aggregation> {
    let first = items.first().ok_or(ForecastError::EmptyBatch)?;
    ledger.get_or_create(&first.fcst_date, &first.base_time)?;

    let init = Fold {
        open: SlotState::open(first),
        slots: Vec::new(),
        warnings: Vec::new(),
    };

    let mut fold = items.iter().try_fold(init, |mut fold, item| {
        if !fold.open.holds(item) {
            if fold.open.forecast_date != item.fcst_date {
                ledger.get_or_create(&item.fcst_date, &item.base_time)?;
            }
            let closed = std::mem::replace(&mut fold.open, SlotState::open(item)).close()?;
            fold.push_closed(closed);
        }

        match item.category {
            Category::Tmx => {
                let max = parse_value(Category::Tmx, &item.fcst_value)?;
                ledger
                    .get_or_create(&item.fcst_date, &item.base_time)?
                    .max_temperature = Some(max);
            }
            Category::Tmn => {
                let min = parse_value(Category::Tmn, &item.fcst_value)?;
                ledger
                    .get_or_create(&item.fcst_date, &item.base_time)?
                    .min_temperature = Some(min);
            }
            _ => {}
        }

        fold.open.pending.push(item);
        Ok::<_, ForecastError>(fold)
    })?;

    let (last, warnings) = fold.open.close()?;
    fold.slots.push(last);
    fold.warnings.extend(warnings);

    Ok(Aggregation {
        slots: fold.slots,
        summaries: ledger.into_summaries(),
        warnings: fold.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn item(date: &str, time: &str, category: Category, value: &str) -> ObservationItem {
        ObservationItem {
            base_date: "20230825".into(),
            base_time: "0800".into(),
            category,
            fcst_date: date.into(),
            fcst_time: time.into(),
            fcst_value: value.into(),
            nx: 60,
            ny: 120,
        }
    }

    fn slot_rows(date: &str, time: &str, tmp: &str) -> Vec<ObservationItem> {
        vec![
            item(date, time, Category::Tmp, tmp),
            item(date, time, Category::Pop, "20"),
            item(date, time, Category::Pcp, "강수없음"),
            item(date, time, Category::Reh, "60"),
            item(date, time, Category::Sky, "3"),
        ]
    }

    fn sample_batch() -> Vec<ObservationItem> {
        vec![
            item("20230825", "0900", Category::Tmp, "25.8"),
            item("20230825", "0900", Category::Tmx, "29"),
            item("20230825", "0900", Category::Tmn, "24"),
            item("20230825", "0900", Category::Pop, "0"),
            item("20230825", "0900", Category::Pcp, "강수없음"),
            item("20230825", "0900", Category::Pty, "0"),
            item("20230825", "0900", Category::Reh, "78"),
            item("20230825", "0900", Category::Sky, "1"),
            item("20230825", "0900", Category::Sno, "적설없음"),
        ]
    }

    #[test]
    fn single_slot_batch() {
        let result = aggregate(&sample_batch(), BatchLedger::new()).unwrap();

        assert_eq!(result.slots.len(), 1);
        let slot = &result.slots[0];
        assert_eq!(slot.forecast_date, "20230825");
        assert_eq!(slot.slot_time, "0900");
        assert_eq!(slot.temperature, Some(25.8));
        assert_eq!(slot.humidity, Some(78));
        assert_eq!(slot.rain_probability, Some(0));
        assert_eq!(slot.rain_amount.as_deref(), Some("강수없음"));
        assert_eq!(slot.sky_state.as_deref(), Some("sunny"));

        assert_eq!(result.summaries.len(), 1);
        let summary = &result.summaries[0];
        assert_eq!(summary.forecast_date, "20230825");
        assert_eq!(summary.issuance_time, "0800");
        assert_eq!(summary.max_temperature, Some(29.0));
        assert_eq!(summary.min_temperature, Some(24.0));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn empty_batch_is_rejected() {
        let err = aggregate(&[], BatchLedger::new()).unwrap_err();
        assert!(matches!(err, ForecastError::EmptyBatch));
    }

    #[test]
    fn one_slot_per_contiguous_group() {
        let mut items = slot_rows("20230825", "2200", "22.0");
        items.extend(slot_rows("20230825", "2300", "21.5"));
        items.extend(slot_rows("20230826", "0000", "21.0"));
        items.extend(slot_rows("20230826", "0100", "20.4"));

        let result = aggregate(&items, BatchLedger::new()).unwrap();

        let keys: Vec<(&str, &str)> = result
            .slots
            .iter()
            .map(|s| (s.forecast_date.as_str(), s.slot_time.as_str()))
            .collect();
        assert_eq!(
            keys,
            [
                ("20230825", "2200"),
                ("20230825", "2300"),
                ("20230826", "0000"),
                ("20230826", "0100"),
            ]
        );
        assert_eq!(result.slots[3].temperature, Some(20.4));
        assert_eq!(result.slots[3].sky_state.as_deref(), Some("partly cloudy"));
    }

    #[test]
    fn grouping_follows_contiguity_not_order() {
        let mut items = slot_rows("20230825", "1000", "22.0");
        items.extend(slot_rows("20230825", "0900", "21.0"));
        items.extend(slot_rows("20230825", "1000", "23.0"));

        let result = aggregate(&items, BatchLedger::new()).unwrap();

        let times: Vec<&str> = result.slots.iter().map(|s| s.slot_time.as_str()).collect();
        assert_eq!(times, ["1000", "0900", "1000"]);
    }

    #[test]
    fn one_summary_per_date_with_extremes() {
        let mut items = slot_rows("20230825", "0600", "19.0");
        items.push(item("20230825", "0600", Category::Tmn, "18.5"));
        items.extend(slot_rows("20230825", "1500", "28.0"));
        items.push(item("20230825", "1500", Category::Tmx, "29.0"));
        items.extend(slot_rows("20230826", "0600", "20.0"));
        items.push(item("20230826", "0600", Category::Tmn, "19.5"));

        let result = aggregate(&items, BatchLedger::new()).unwrap();

        assert_eq!(result.summaries.len(), 2);
        assert_eq!(result.summaries[0].forecast_date, "20230825");
        assert_eq!(result.summaries[0].min_temperature, Some(18.5));
        assert_eq!(result.summaries[0].max_temperature, Some(29.0));
        assert_eq!(result.summaries[1].forecast_date, "20230826");
        assert_eq!(result.summaries[1].min_temperature, Some(19.5));
        assert_eq!(result.summaries[1].max_temperature, None);
    }

    #[test]
    fn missing_category_is_a_warning() {
        let items: Vec<_> = sample_batch()
            .into_iter()
            .filter(|i| i.category != Category::Pop)
            .collect();

        let result = aggregate(&items, BatchLedger::new()).unwrap();
        assert_eq!(result.slots[0].rain_probability, None);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].category, Category::Pop);
    }

    #[test]
    fn malformed_extreme_aborts() {
        let mut items = sample_batch();
        items[1] = item("20230825", "0900", Category::Tmx, "hot");

        let err = aggregate(&items, BatchLedger::new()).unwrap_err();
        assert!(matches!(err, ForecastError::Parse { category: Category::Tmx, .. }));
    }

    #[test]
    fn unknown_sky_code_aborts() {
        let mut items = sample_batch();
        items[7] = item("20230825", "0900", Category::Sky, "99");

        let err = aggregate(&items, BatchLedger::new()).unwrap_err();
        assert!(matches!(err, ForecastError::UnknownCode { code: 99, .. }));
    }

    #[test]
    fn reaggregation_is_structurally_identical() {
        let store = InMemoryStore::new();
        let mut items = sample_batch();
        items.extend(slot_rows("20230825", "1000", "26.3"));

        let first = aggregate(&items, StoreLedger::new(&store)).unwrap();
        store.commit(first.summaries.clone(), first.slots.clone()).unwrap();

        let copy = items.clone();
        let second = aggregate(&copy, StoreLedger::new(&store)).unwrap();
        store.commit(second.summaries.clone(), second.slots.clone()).unwrap();

        assert_eq!(first.slots, second.slots);
        assert_eq!(first.summaries, second.summaries);
        assert!(store.find_daily_summary("20230825").unwrap().is_some());
    }

    #[test]
    fn store_ledger_keeps_stored_extremes() {
        let store = InMemoryStore::new();
        let mut known = DailySummary::new("20230825", "0500");
        known.max_temperature = Some(30.0);
        store.save_or_update_daily_summary(known).unwrap();

        let result = aggregate(&slot_rows("20230825", "1000", "26.3"), StoreLedger::new(&store))
            .unwrap();

        assert_eq!(result.summaries[0].max_temperature, Some(30.0));
        assert_eq!(result.summaries[0].issuance_time, "0800");
    }
}
