//! Turns raw rows into typed observations.
//!
//! Dropping is the policy, not an accident: a row with a missing field, an
//! unparsable date or value, or a date outside the window is skipped and only
//! counted. Nothing here fails.

use crate::config::FieldMapping;
use crate::model::{DateWindow, FieldValue, RawObservation, RawRow, RowParseError};
use crate::utils::{parse_date, parse_number};
use chrono::NaiveDate;
use tracing::debug;

/// Tally of rows skipped by [`normalize_with_stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropStats {
    pub missing_field: usize,
    pub bad_date: usize,
    pub bad_value: usize,
    pub out_of_window: usize,
}

impl DropStats {
    pub fn total(&self) -> usize {
        self.missing_field + self.bad_date + self.bad_value + self.out_of_window
    }

    fn record(&mut self, err: &RowParseError) {
        match err {
            RowParseError::MissingField(_) => self.missing_field += 1,
            RowParseError::BadDate(_) => self.bad_date += 1,
            RowParseError::BadValue(_) => self.bad_value += 1,
        }
    }
}

pub fn normalize(rows: &[RawRow], fields: &FieldMapping, window: &DateWindow) -> Vec<RawObservation> {
    normalize_with_stats(rows, fields, window).0
}

pub fn normalize_with_stats(
    rows: &[RawRow],
    fields: &FieldMapping,
    window: &DateWindow,
) -> (Vec<RawObservation>, DropStats) {
    let mut observations = Vec::with_capacity(rows.len());
    let mut stats = DropStats::default();

    for row in rows {
        match parse_row(row, fields) {
            Ok(obs) if window.contains(obs.timestamp) => observations.push(obs),
            Ok(_) => stats.out_of_window += 1,
            Err(e) => stats.record(&e),
        }
    }

    debug!(
        "Normalized {} of {} rows (missing: {}, bad date: {}, bad value: {}, outside window: {})",
        observations.len(),
        rows.len(),
        stats.missing_field,
        stats.bad_date,
        stats.bad_value,
        stats.out_of_window
    );

    (observations, stats)
}

fn parse_row(row: &RawRow, fields: &FieldMapping) -> Result<RawObservation, RowParseError> {
    let timestamp = field_date(row, &fields.date_field)?;
    let value = field_number(row, &fields.value_field)?;
    let category = fields
        .category_field
        .as_ref()
        .and_then(|name| row.get(name))
        .and_then(|cell| match cell {
            FieldValue::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            FieldValue::Number(v) => Some(v.to_string()),
            FieldValue::Date(d) => Some(d.to_string()),
            _ => None,
        });

    Ok(RawObservation { timestamp, value, category })
}

fn field<'a>(row: &'a RawRow, name: &str) -> Result<&'a FieldValue, RowParseError> {
    match row.get(name) {
        None | Some(FieldValue::Null) => Err(RowParseError::MissingField(name.to_string())),
        Some(cell) => Ok(cell),
    }
}

fn field_date(row: &RawRow, name: &str) -> Result<NaiveDate, RowParseError> {
    match field(row, name)? {
        FieldValue::Date(d) => Ok(*d),
        FieldValue::Text(s) => parse_date(s).ok_or_else(|| RowParseError::BadDate(s.clone())),
        other => Err(RowParseError::BadDate(other.to_string())),
    }
}

fn field_number(row: &RawRow, name: &str) -> Result<f64, RowParseError> {
    match field(row, name)? {
        FieldValue::Number(v) if v.is_finite() => Ok(*v),
        FieldValue::Text(s) => parse_number(s).ok_or_else(|| RowParseError::BadValue(s.clone())),
        other => Err(RowParseError::BadValue(other.to_string())),
    }
}
