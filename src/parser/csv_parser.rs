// CSV export parsing
use crate::model::{FieldValue, ParserError, RawRow};
use csv::ReaderBuilder;
use tracing::warn;

pub trait Parser {
    fn parse(&self, text: &str) -> Result<Vec<RawRow>, ParserError>;
}

/// Header row gives field names; every later record becomes one [`RawRow`]
/// of text cells. Short records simply lack the trailing fields.
pub struct CsvParser {
    delimiter: u8,
}

impl CsvParser {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for CsvParser {
    fn parse(&self, text: &str) -> Result<Vec<RawRow>, ParserError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(ParserError::MissingHeader);
        }

        let mut rows = Vec::new();
        let mut unreadable = 0usize;

        for result in reader.records() {
            let record = match result {
                Ok(r) => r,
                Err(_) => {
                    unreadable += 1;
                    continue;
                }
            };

            let row: RawRow = headers
                .iter()
                .zip(record.iter())
                .map(|(name, cell)| {
                    let value = if cell.trim().is_empty() {
                        FieldValue::Null
                    } else {
                        FieldValue::Text(cell.to_string())
                    };
                    (name.clone(), value)
                })
                .collect();
            rows.push(row);
        }

        if unreadable > 0 {
            warn!("Skipped {} unreadable CSV records", unreadable);
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_by_header() {
        let text = "realtime_start,date,value\n2024-01-01,2020-01-02,3.72\n2024-01-01,2020-01-09,.\n";
        let rows = CsvParser::new().parse(text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["date"], FieldValue::Text("2020-01-02".into()));
        assert_eq!(rows[0]["value"], FieldValue::Text("3.72".into()));
        assert_eq!(rows[1]["value"], FieldValue::Text(".".into()));
    }

    #[test]
    fn empty_cells_are_null_and_short_rows_lack_fields() {
        let text = "date,homes for sale,isPartial\n2020-01-01,,False\n2020-02-01\n";
        let rows = CsvParser::new().parse(text).unwrap();
        assert_eq!(rows[0]["homes for sale"], FieldValue::Null);
        assert!(!rows[1].contains_key("homes for sale"));
    }

    #[test]
    fn quoted_fields_and_custom_delimiter() {
        let text = "date;price;state\n\"01/05/2021\";\"525000\";\"New York\"\n";
        let rows = CsvParser::with_delimiter(b';').parse(text).unwrap();
        assert_eq!(rows[0]["state"], FieldValue::Text("New York".into()));
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(matches!(CsvParser::new().parse(""), Err(ParserError::MissingHeader)));
    }
}
