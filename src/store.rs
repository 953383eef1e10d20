use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Only the most recent saves are kept
pub const MAX_SAVED_ESTIMATES: usize = 10;

/// An estimate the user chose to keep, stored as displayed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedEstimate {
    /// Stable identity (UUID)
    pub id: String,

    /// Display price, e.g. "₹ 98,17,500"
    pub price: String,

    pub location: String,
    pub sqft: f64,
    pub bhk: u32,
    pub bath: u32,
    pub saved_at: DateTime<Utc>,
}

impl SavedEstimate {
    pub fn new(price: impl Into<String>, location: impl Into<String>, sqft: f64, bhk: u32, bath: u32) -> Self {
        SavedEstimate {
            id: uuid::Uuid::new_v4().to_string(),
            price: price.into(),
            location: location.into(),
            sqft,
            bhk,
            bath,
            saved_at: Utc::now(),
        }
    }
}

pub fn open_store(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open estimate store: {:?}", db_path))?;
    setup_store(&conn)?;
    Ok(conn)
}

pub fn setup_store(conn: &Connection) -> Result<()> {
    // WAL for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS saved_estimates (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            estimate_uuid TEXT UNIQUE NOT NULL,
            price TEXT NOT NULL,
            location TEXT NOT NULL,
            sqft REAL NOT NULL,
            bhk INTEGER NOT NULL,
            bath INTEGER NOT NULL,
            saved_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// Insert an estimate, then drop everything older than the newest ten
pub fn save_estimate(conn: &Connection, estimate: &SavedEstimate) -> Result<usize> {
    conn.execute(
        "INSERT INTO saved_estimates (
            estimate_uuid, price, location, sqft, bhk, bath, saved_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            estimate.id,
            estimate.price,
            estimate.location,
            estimate.sqft,
            estimate.bhk,
            estimate.bath,
            estimate.saved_at.to_rfc3339(),
        ],
    )
    .context("Failed to save estimate")?;

    let pruned = conn.execute(
        "DELETE FROM saved_estimates
         WHERE seq NOT IN (
            SELECT seq FROM saved_estimates ORDER BY seq DESC LIMIT ?1
         )",
        params![MAX_SAVED_ESTIMATES as i64],
    )?;

    if pruned > 0 {
        tracing::debug!(pruned, "dropped oldest saved estimates");
    }

    Ok(pruned)
}

/// Saved estimates, newest first
pub fn list_saved_estimates(conn: &Connection) -> Result<Vec<SavedEstimate>> {
    let mut stmt = conn.prepare(
        "SELECT estimate_uuid, price, location, sqft, bhk, bath, saved_at
         FROM saved_estimates
         ORDER BY seq DESC",
    )?;

    let estimates = stmt
        .query_map([], |row| {
            let saved_at_str: String = row.get(6)?;

            Ok(SavedEstimate {
                id: row.get(0)?,
                price: row.get(1)?,
                location: row.get(2)?,
                sqft: row.get(3)?,
                bhk: row.get(4)?,
                bath: row.get(5)?,
                saved_at: DateTime::parse_from_rfc3339(&saved_at_str)
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
                    })?
                    .with_timezone(&Utc),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(estimates)
}

pub fn count_saved_estimates(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM saved_estimates", [], |row| row.get(0))?;
    Ok(count)
}

pub fn clear_saved_estimates(conn: &Connection) -> Result<usize> {
    let removed = conn.execute("DELETE FROM saved_estimates", [])?;
    Ok(removed)
}

/// Write estimates as CSV (header row included)
pub fn export_csv<W: Write>(estimates: &[SavedEstimate], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for estimate in estimates {
        wtr.serialize(estimate).context("Failed to write estimate row")?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_store(&conn).unwrap();
        conn
    }

    #[test]
    fn test_save_and_list() {
        let conn = test_store();
        let estimate = SavedEstimate::new("₹ 98,17,500", "Koramangala", 1000.0, 2, 2);

        save_estimate(&conn, &estimate).unwrap();
        let saved = list_saved_estimates(&conn).unwrap();

        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, estimate.id);
        assert_eq!(saved[0].price, "₹ 98,17,500");
        assert_eq!(saved[0].bhk, 2);
        assert_eq!(saved[0].saved_at.timestamp(), estimate.saved_at.timestamp());
    }

    #[test]
    fn test_keeps_last_ten() {
        let conn = test_store();

        for i in 0..13 {
            let estimate = SavedEstimate::new(format!("₹ {}", i), "Whitefield", 1000.0 + i as f64, 1, 1);
            save_estimate(&conn, &estimate).unwrap();
        }

        let saved = list_saved_estimates(&conn).unwrap();

        assert_eq!(count_saved_estimates(&conn).unwrap(), 10);
        assert_eq!(saved.len(), MAX_SAVED_ESTIMATES);
        // newest first; the first three saves were dropped
        assert_eq!(saved[0].price, "₹ 12");
        assert_eq!(saved[9].price, "₹ 3");
    }

    #[test]
    fn test_prune_count_reported() {
        let conn = test_store();

        for _ in 0..MAX_SAVED_ESTIMATES {
            let pruned = save_estimate(&conn, &SavedEstimate::new("₹ 1", "Bellandur", 500.0, 1, 1)).unwrap();
            assert_eq!(pruned, 0);
        }

        let pruned = save_estimate(&conn, &SavedEstimate::new("₹ 2", "Bellandur", 500.0, 1, 1)).unwrap();
        assert_eq!(pruned, 1);
    }

    #[test]
    fn test_clear() {
        let conn = test_store();
        save_estimate(&conn, &SavedEstimate::new("₹ 1", "JP Nagar", 700.0, 1, 1)).unwrap();
        save_estimate(&conn, &SavedEstimate::new("₹ 2", "JP Nagar", 800.0, 2, 1)).unwrap();

        assert_eq!(clear_saved_estimates(&conn).unwrap(), 2);
        assert_eq!(count_saved_estimates(&conn).unwrap(), 0);
    }

    #[test]
    fn test_export_csv() {
        let estimate = SavedEstimate::new("₹ 65,00,000", "Whitefield", 1000.0, 1, 1);
        let mut out = Vec::new();

        export_csv(&[estimate.clone()], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next(), Some("id,price,location,sqft,bhk,bath,saved_at"));
        let row = lines.next().unwrap();
        assert!(row.starts_with(&estimate.id));
        assert!(row.contains("Whitefield"));
        assert_eq!(lines.next(), None);
    }
}
