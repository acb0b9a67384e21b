//! Mapping of grouped observations to slots, and of slots to display lines.

use serde::Serialize;
use std::{collections::HashMap, fmt, str::FromStr};

use crate::{
    codes::{Category, PrecipitationType, SkyCode},
    error::{ForecastError, Result},
    model::{ForecastSlot, MissingFieldWarning, ObservationItem},
};

/// Categories every slot is expected to carry.
const EXPECTED: [Category; 5] = [
    Category::Tmp,
    Category::Reh,
    Category::Pop,
    Category::Pcp,
    Category::Sky,
];

/// Builds one [`ForecastSlot`] from the observations of a single slot.
///
/// When a category appears more than once the last row wins. Missing
/// categories leave the field unset and are reported as warnings; values
/// that do not parse, or enumerated codes outside the code tables, fail.
pub fn slot_from_group(
    forecast_date: &str,
    slot_time: &str,
    group: &[&ObservationItem],
) -> Result<(ForecastSlot, Vec<MissingFieldWarning>)> {
    let by_category: HashMap<Category, &str> = group
        .iter()
        .map(|item| (item.category, item.fcst_value.as_str()))
        .collect();

    let warnings = EXPECTED
        .iter()
        .filter(|c| !by_category.contains_key(*c))
        .map(|&category| MissingFieldWarning {
            forecast_date: forecast_date.to_string(),
            slot_time: slot_time.to_string(),
            category,
        })
        .collect();

    let sky_state = parse_field::<i64>(&by_category, Category::Sky)?
        .map(SkyCode::from_code)
        .transpose()?
        .map(|sky| sky.description().to_string());

    let precipitation_type = parse_field::<i64>(&by_category, Category::Pty)?
        .map(PrecipitationType::from_code)
        .transpose()?
        .map(|pty| pty.description().to_string());

    let slot = ForecastSlot {
        forecast_date: forecast_date.to_string(),
        slot_time: slot_time.to_string(),
        temperature: parse_field(&by_category, Category::Tmp)?,
        humidity: parse_field(&by_category, Category::Reh)?,
        rain_probability: parse_field(&by_category, Category::Pop)?,
        rain_amount: verbatim(&by_category, Category::Pcp),
        sky_state,
        precipitation_type,
        snow_amount: verbatim(&by_category, Category::Sno),
    };

    Ok((slot, warnings))
}

/// Parses a numeric observation value for `category`.
pub(crate) fn parse_value<T: FromStr>(category: Category, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ForecastError::Parse {
        category,
        value: value.to_string(),
    })
}

fn parse_field<T: FromStr>(
    by_category: &HashMap<Category, &str>,
    category: Category,
) -> Result<Option<T>> {
    by_category
        .get(&category)
        .map(|value| parse_value(category, value))
        .transpose()
}

fn verbatim(by_category: &HashMap<Category, &str>, category: Category) -> Option<String> {
    by_category.get(&category).map(|v| v.to_string())
}

/// Display-ready projection of a [`ForecastSlot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDisplay {
    pub forecast_date: String,
    pub slot_time: String,
    pub temperature: Option<String>,
    pub humidity: Option<String>,
    pub rain_probability: Option<String>,
    pub rain_amount: Option<String>,
    pub sky: Option<String>,
}

impl From<&ForecastSlot> for ForecastDisplay {
    fn from(slot: &ForecastSlot) -> Self {
        Self {
            forecast_date: slot.forecast_date.clone(),
            slot_time: slot.slot_time.clone(),
            temperature: slot.temperature.map(|t| t.to_string()),
            humidity: slot.humidity.map(|h| h.to_string()),
            rain_probability: slot.rain_probability.map(|p| p.to_string()),
            rain_amount: slot.rain_amount.clone(),
            sky: slot.sky_state.clone(),
        }
    }
}

pub fn to_display(slot: &ForecastSlot) -> ForecastDisplay {
    ForecastDisplay::from(slot)
}

impl fmt::Display for ForecastDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());

        write!(
            f,
            "{} {} | {} | {}°C | humidity {}% | rain {}% ({})",
            self.forecast_date,
            self.slot_time,
            or_dash(&self.sky),
            or_dash(&self.temperature),
            or_dash(&self.humidity),
            or_dash(&self.rain_probability),
            or_dash(&self.rain_amount),
        )
    }
}
