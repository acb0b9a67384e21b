use serde::{Deserialize, Serialize};

use crate::codes::Category;

/// One provider row: a single category value for one forecast slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationItem {
    pub base_date: String,
    pub base_time: String,
    pub category: Category,
    pub fcst_date: String,
    pub fcst_time: String,
    pub fcst_value: String,
    pub nx: i32,
    pub ny: i32,
}

/// Per-date minimum and maximum temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub forecast_date: String,
    pub issuance_time: String,
    pub max_temperature: Option<f64>,
    pub min_temperature: Option<f64>,
}

impl DailySummary {
    pub fn new(forecast_date: impl Into<String>, issuance_time: impl Into<String>) -> Self {
        Self {
            forecast_date: forecast_date.into(),
            issuance_time: issuance_time.into(),
            max_temperature: None,
            min_temperature: None,
        }
    }

    /// Takes the issuance time and any known extremes from `newer`,
    /// keeping the current extremes where `newer` has none.
    pub fn merge(&mut self, newer: &DailySummary) {
        self.issuance_time.clone_from(&newer.issuance_time);
        if newer.max_temperature.is_some() {
            self.max_temperature = newer.max_temperature;
        }
        if newer.min_temperature.is_some() {
            self.min_temperature = newer.min_temperature;
        }
    }
}

/// Everything forecast for one slot of one date.
///
/// `forecast_date` is the key of the [`DailySummary`] the slot belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSlot {
    pub forecast_date: String,
    pub slot_time: String,
    pub temperature: Option<f64>,
    pub humidity: Option<i32>,
    pub rain_probability: Option<i32>,
    pub rain_amount: Option<String>,
    pub sky_state: Option<String>,
    pub precipitation_type: Option<String>,
    pub snow_amount: Option<String>,
}

/// A slot that lacked one of the categories it is expected to carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFieldWarning {
    pub forecast_date: String,
    pub slot_time: String,
    pub category: Category,
}

/// Result of aggregating one batch.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub slots: Vec<ForecastSlot>,
    pub summaries: Vec<DailySummary>,
    pub warnings: Vec<MissingFieldWarning>,
}
