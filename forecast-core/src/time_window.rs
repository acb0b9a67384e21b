//! Issuance window and slot arithmetic.
//!
//! The provider publishes a new batch every three hours starting at 02:00,
//! and a batch becomes available roughly 30 minutes after its mark.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Window returned when the effective hour matches no issuance mark.
pub const FALLBACK_WINDOW: &str = "0000";

/// Minutes after an issuance mark before its batch is published.
const PUBLICATION_DELAY_MINUTES: u32 = 30;

/// Base date and time identifying one published batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuance {
    pub base_date: NaiveDate,
    pub base_time: String,
}

impl Issuance {
    pub fn base_date_key(&self) -> String {
        date_key(self.base_date)
    }
}

/// Formats a calendar date as `YYYYMMDD`.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Returns the most recent issuance window published by `time`.
///
/// e.g. 11:40 -> "1100", 11:10 -> "0800", 00:10 -> "2300" (of the prior day)
pub fn issuance_window_for(time: NaiveTime) -> String {
    window_for_effective_hour(effective_hour(time)).to_string()
}

/// Like [`issuance_window_for`], but also resolves the base date, which is the
/// day before `at` when the window wraps back to the prior day's 23:00 mark.
pub fn issuance_for(at: NaiveDateTime) -> Issuance {
    let hour = effective_hour(at.time());
    let base_date = if rolls_to_prior_day(hour) {
        at.date().checked_sub_days(Days::new(1)).unwrap_or(at.date())
    } else {
        at.date()
    };

    Issuance {
        base_date,
        base_time: window_for_effective_hour(hour).to_string(),
    }
}

/// Returns the first slot to query for upcoming forecasts.
///
/// e.g. 11:40 -> "1200", 14:00 -> "1500", 23:20 -> "0000"
pub fn next_slot_time_for(time: NaiveTime) -> String {
    match next_hour(time) {
        Some(hour) => format!("{hour:02}00"),
        None => "0000".to_string(),
    }
}

/// Like [`next_slot_time_for`], paired with the date the slot falls on.
pub fn next_slot_for(at: NaiveDateTime) -> (NaiveDate, String) {
    let date = match next_hour(at.time()) {
        Some(_) => at.date(),
        None => at.date().checked_add_days(Days::new(1)).unwrap_or(at.date()),
    };

    (date, next_slot_time_for(at.time()))
}

fn next_hour(time: NaiveTime) -> Option<u32> {
    let hour = time.hour();
    (hour < 23).then_some(hour + 1)
}

fn effective_hour(time: NaiveTime) -> i32 {
    let hour = time.hour() as i32;
    if time.minute() < PUBLICATION_DELAY_MINUTES {
        hour - 1
    } else {
        hour
    }
}

fn rolls_to_prior_day(effective_hour: i32) -> bool {
    (-1..=1).contains(&effective_hour)
}

fn window_for_effective_hour(hour: i32) -> &'static str {
    match hour {
        2..=4 => "0200",
        5..=7 => "0500",
        8..=10 => "0800",
        11..=13 => "1100",
        14..=16 => "1400",
        17..=19 => "1700",
        20..=22 => "2000",
        23 | 24 | -1..=1 => "2300",
        _ => FALLBACK_WINDOW,
    }
}
