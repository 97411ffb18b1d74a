use crate::model::{Change, Panel, StorageError};
use crate::utils::format_us_date;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Header of the serialized panel, in column order.
pub const PANEL_COLUMNS: [&str; 10] = [
    "month",
    "avg_price",
    "search_interest",
    "mortgage_rate",
    "price_pct_change",
    "mortgage_pct_change",
    "search_pct_change",
    "price_direction",
    "mortgage_direction",
    "search_direction",
];

/// One output row. Field order is the column order; `None` cells mean "no
/// previous value" and are written empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelRecord {
    pub month: String,
    pub avg_price: f64,
    pub search_interest: f64,
    pub mortgage_rate: f64,
    pub price_pct_change: Option<f64>,
    pub mortgage_pct_change: Option<f64>,
    pub search_pct_change: Option<f64>,
    pub price_direction: Option<i8>,
    pub mortgage_direction: Option<i8>,
    pub search_direction: Option<i8>,
}

fn split(change: Option<Change>) -> (Option<f64>, Option<i8>) {
    match change {
        Some(c) => (Some(c.pct_change), Some(c.direction.as_i8())),
        None => (None, None),
    }
}

pub fn serialize(panel: &Panel) -> Vec<PanelRecord> {
    panel
        .rows()
        .iter()
        .map(|row| {
            let (price_pct_change, price_direction) = split(row.price_change);
            let (mortgage_pct_change, mortgage_direction) = split(row.mortgage_change);
            let (search_pct_change, search_direction) = split(row.search_change);
            PanelRecord {
                month: format_us_date(row.month),
                avg_price: row.avg_price,
                search_interest: row.search_interest,
                mortgage_rate: row.mortgage_rate,
                price_pct_change,
                mortgage_pct_change,
                search_pct_change,
                price_direction,
                mortgage_direction,
                search_direction,
            }
        })
        .collect()
}

/// Writes records as CSV, header first.
pub fn write_csv<W: Write>(writer: W, records: &[PanelRecord]) -> Result<(), StorageError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::add_derived;
    use crate::merger::merge;
    use crate::model::MonthlySeries;
    use chrono::NaiveDate;

    fn sample() -> Panel {
        let s = |a: f64, b: f64| {
            MonthlySeries::from_points(vec![
                (NaiveDate::from_ymd_opt(2020, 1, 20).unwrap(), a),
                (NaiveDate::from_ymd_opt(2020, 2, 3).unwrap(), b),
            ])
            .unwrap()
        };
        add_derived(&merge(&s(300000.0, 310000.0), &s(3.5, 3.6), &s(50.0, 55.0)).unwrap())
    }

    #[test]
    fn records_follow_panel_rows() {
        let records = serialize(&sample());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].month, "01/01/2020");
        assert_eq!(records[1].month, "02/01/2020");
        assert_eq!(records[0].price_pct_change, None);
        assert_eq!(records[0].search_direction, None);
        assert_eq!(records[1].price_pct_change, Some(3.3));
        assert_eq!(records[1].mortgage_direction, Some(1));
    }

    #[test]
    fn csv_has_fixed_header_and_empty_sentinels() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &serialize(&sample())).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], PANEL_COLUMNS.join(","));
        assert_eq!(lines[1], "01/01/2020,300000.0,50.0,3.5,,,,,,");
        assert_eq!(lines[2], "02/01/2020,310000.0,55.0,3.6,3.3,2.9,10.0,1,1,1");
    }
}
