// Core structs: RawObservation, MonthlySeries, Panel and the error taxonomy
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// The three datasets feeding the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Individual real-estate transactions.
    Price,
    /// Weekly 30-year mortgage rate observations.
    Rate,
    /// Search-interest scores.
    Search,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::Price, SourceKind::Rate, SourceKind::Search];
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Price => write!(f, "price"),
            SourceKind::Rate => write!(f, "rate"),
            SourceKind::Search => write!(f, "search"),
        }
    }
}

/// A single cell handed over by an ingestion collaborator.
///
/// Collaborators may pass raw text or values that are already typed.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Null,
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        FieldValue::Date(d)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Number(v) => write!(f, "{v}"),
            FieldValue::Date(d) => write!(f, "{d}"),
            FieldValue::Null => write!(f, "<null>"),
        }
    }
}

/// A mapping-like raw record: field name → cell.
pub type RawRow = BTreeMap<String, FieldValue>;

/// One typed observation produced by the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub timestamp: NaiveDate,
    pub value: f64,
    pub category: Option<String>,
}

/// Inclusive date bounds applied by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub month: NaiveDate,
    pub value: f64,
}

/// One value per calendar month, unique by month and sorted ascending.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonthlySeries {
    points: Vec<MonthlyPoint>,
}

impl MonthlySeries {
    /// Builds a series from `(date, value)` pairs. Each date is moved to the
    /// first of its month; two pairs landing in the same month are rejected.
    pub fn from_points<I>(points: I) -> Result<Self, SeriesError>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut by_month = BTreeMap::new();
        for (date, value) in points {
            let month = crate::utils::month_start(date);
            if by_month.insert(month, value).is_some() {
                return Err(SeriesError::DuplicateMonth(month));
            }
        }
        Ok(Self::from_sorted(by_month))
    }

    /// Callers guarantee keys are already first-of-month.
    pub(crate) fn from_sorted(by_month: BTreeMap<NaiveDate, f64>) -> Self {
        Self {
            points: by_month
                .into_iter()
                .map(|(month, value)| MonthlyPoint { month, value })
                .collect(),
        }
    }

    pub fn points(&self) -> &[MonthlyPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn months(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.month)
    }

    pub fn get(&self, month: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&month, |p| p.month)
            .ok()
            .map(|idx| self.points[idx].value)
    }

    pub fn first_month(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.month)
    }

    pub fn last_month(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.month)
    }

    /// Short coverage description used in merge diagnostics.
    pub fn coverage(&self) -> String {
        match (self.first_month(), self.last_month()) {
            (Some(first), Some(last)) => format!(
                "{} months {:04}-{:02}..{:04}-{:02}",
                self.len(),
                first.year(),
                first.month(),
                last.year(),
                last.month()
            ),
            _ => "no months".to_string(),
        }
    }
}

/// Three-way sign of a percentage change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Down = -1,
    Flat = 0,
    Up = 1,
}

impl Direction {
    pub fn as_i8(self) -> i8 {
        self as i8
    }
}

/// Month-over-month change of one metric. Absent (`None` on the row) when
/// there is no usable previous value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Change {
    pub pct_change: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelRow {
    pub month: NaiveDate,
    pub avg_price: f64,
    pub mortgage_rate: f64,
    pub search_interest: f64,
    pub price_change: Option<Change>,
    pub mortgage_change: Option<Change>,
    pub search_change: Option<Change>,
}

impl PanelRow {
    pub fn new(month: NaiveDate, avg_price: f64, mortgage_rate: f64, search_interest: f64) -> Self {
        Self {
            month,
            avg_price,
            mortgage_rate,
            search_interest,
            price_change: None,
            mortgage_change: None,
            search_change: None,
        }
    }
}

/// Aligned monthly panel, rows ascending by month.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    rows: Vec<PanelRow>,
}

impl Panel {
    /// Callers guarantee rows are strictly ascending by month.
    pub(crate) fn from_rows(rows: Vec<PanelRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[PanelRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn months(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.month).collect()
    }
}

/// Why a single raw row was dropped by the normalizer. Never surfaced past it.
#[derive(Debug, Error, PartialEq)]
pub enum RowParseError {
    #[error("missing field '{0}'")]
    MissingField(String),
    #[error("unparsable date '{0}'")]
    BadDate(String),
    #[error("unparsable value '{0}'")]
    BadValue(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("duplicate month {0}")]
    DuplicateMonth(NaiveDate),
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error(
        "merge: no month is common to all sources (price: {price}; rate: {rate}; search: {search}); check the date window and source files"
    )]
    EmptyIntersection {
        price: String,
        rate: String,
        search: String,
    },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{source_kind} source unavailable at {path}: {reason}")]
    Unavailable {
        source_kind: SourceKind,
        path: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing header row")]
    MissingHeader,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON write error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
