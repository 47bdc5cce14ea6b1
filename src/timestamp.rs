//! Timestamp parsing and duration arithmetic for scrapyd job times.

use std::borrow::Cow;

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::PrimitiveDateTime;

use crate::error::{OverwatchError, Result};

/// Digits of the fractional-second field (microseconds).
const FRACTION_DIGITS: usize = 6;

/// `YYYY-MM-DD HH:MM:SS.ffffff`, as scrapyd writes `start_time`/`end_time`.
const JOB_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");

/// Right-pad a short fraction (`.5` -> `.500000`). Longer fractions are left
/// alone so the fixed-width format rejects them.
fn pad_fraction(value: &str) -> Cow<'_, str> {
    match value.rsplit_once('.') {
        Some((head, frac))
            if !frac.is_empty()
                && frac.len() < FRACTION_DIGITS
                && frac.bytes().all(|b| b.is_ascii_digit()) =>
        {
            Cow::Owned(format!("{head}.{frac:0<width$}", width = FRACTION_DIGITS))
        }
        _ => Cow::Borrowed(value),
    }
}

/// Parse a job timestamp. The fraction takes one to six digits; anything
/// longer is an error rather than silently truncated.
pub fn parse_timestamp(value: &str) -> Result<PrimitiveDateTime> {
    PrimitiveDateTime::parse(&pad_fraction(value), JOB_TIME_FORMAT).map_err(|source| {
        OverwatchError::Parse {
            value: value.to_string(),
            source,
        }
    })
}

/// Seconds from `start` to `end`, negative if `end` comes first.
///
/// Goes through whole microseconds so the result is the nearest `f64` to the
/// decimal value (`241.547793`, not `241.54779299999998`).
pub fn duration_secs(start: PrimitiveDateTime, end: PrimitiveDateTime) -> f64 {
    (end - start).whole_microseconds() as f64 / 1_000_000.0
}
