use crate::model::StorageError;
use crate::serializer::PanelRecord;
use crate::utils::parse_date;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use tracing::info;

/// Persists the serialized panel, one row per month.
pub struct PanelStore {
    conn: Connection,
}

impl PanelStore {
    /// Opens (or creates) the database file and ensures the schema exists.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StorageError> {
        Self::init(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS panel (
                month_key TEXT PRIMARY KEY,
                month TEXT NOT NULL,
                avg_price REAL NOT NULL,
                search_interest REAL NOT NULL,
                mortgage_rate REAL NOT NULL,
                price_pct_change REAL,
                mortgage_pct_change REAL,
                search_pct_change REAL,
                price_direction INTEGER,
                mortgage_direction INTEGER,
                search_direction INTEGER
            );
            ",
        )?;
        Ok(Self { conn })
    }

    /// Replaces the stored panel with `records`. Returns the number of rows
    /// written.
    pub fn save_panel(&mut self, records: &[PanelRecord]) -> Result<usize, StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM panel", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO panel (
                    month_key, month, avg_price, search_interest, mortgage_rate,
                    price_pct_change, mortgage_pct_change, search_pct_change,
                    price_direction, mortgage_direction, search_direction
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for record in records {
                // ISO key so rows sort chronologically in SQL.
                let month_key = parse_date(&record.month)
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| record.month.clone());
                stmt.execute(params![
                    month_key,
                    &record.month,
                    record.avg_price,
                    record.search_interest,
                    record.mortgage_rate,
                    record.price_pct_change,
                    record.mortgage_pct_change,
                    record.search_pct_change,
                    record.price_direction,
                    record.mortgage_direction,
                    record.search_direction,
                ])?;
            }
        }
        tx.commit()?;
        info!("Stored {} panel rows", records.len());
        Ok(records.len())
    }

    /// Returns the stored panel in month order.
    pub fn load_panel(&self) -> Result<Vec<PanelRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT month, avg_price, search_interest, mortgage_rate,
                    price_pct_change, mortgage_pct_change, search_pct_change,
                    price_direction, mortgage_direction, search_direction
             FROM panel ORDER BY month_key ASC",
        )?;

        let rows = stmt.query_map([], Self::map_record)?;
        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }

        Ok(records)
    }

    pub fn row_count(&self) -> Result<usize, StorageError> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM panel", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn map_record(row: &Row) -> Result<PanelRecord, rusqlite::Error> {
        Ok(PanelRecord {
            month: row.get(0)?,
            avg_price: row.get(1)?,
            search_interest: row.get(2)?,
            mortgage_rate: row.get(3)?,
            price_pct_change: row.get(4)?,
            mortgage_pct_change: row.get(5)?,
            search_pct_change: row.get(6)?,
            price_direction: row.get(7)?,
            mortgage_direction: row.get(8)?,
            search_direction: row.get(9)?,
        })
    }
}
