//! Core library for the `forecast` CLI.
//!
//! This crate defines:
//! - Provider code tables and issuance window arithmetic
//! - Aggregation of flat observation batches into slots and daily summaries
//! - Display projection of slots
//! - Abstractions over the forecast provider and the record store
//! - The ingestion run tying them together
//!
//! It is used by `forecast-cli`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod codes;
pub mod config;
pub mod display;
pub mod error;
pub mod ingest;
pub mod model;
pub mod provider;
pub mod store;
pub mod time_window;

pub use aggregate::{BatchLedger, StoreLedger, SummaryLedger, aggregate};
pub use codes::{Category, PrecipitationType, SkyCode};
pub use config::{Config, Grid};
pub use display::{ForecastDisplay, to_display};
pub use error::{ForecastError, Result};
pub use ingest::Ingestion;
pub use model::{Aggregation, DailySummary, ForecastSlot, MissingFieldWarning, ObservationItem};
pub use provider::{ForecastProvider, ForecastRequest, provider_from_config};
pub use store::{ForecastStore, InMemoryStore};
pub use time_window::{
    Issuance, date_key, issuance_for, issuance_window_for, next_slot_for, next_slot_time_for,
};
