//! Row-oriented sheets backed by SQLite.
//!
//! A sheet is a header plus an ordered list of data rows. Rows are addressed
//! by their zero-based index below the header, the way a spreadsheet user sees
//! them. Cells are plain strings; typing happens at the domain boundary.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::db::{get_connection, init_db};
use crate::error::{PennyError, Result};

pub type Row = Vec<String>;

pub const SETTINGS: &str = "Settings";
pub const ACCOUNTS: &str = "Accounts";
pub const TRANSACTIONS: &str = "Transactions";
pub const AUTO_CATEGORY: &str = "AutoCategory";

pub const SETTINGS_HEADER: &[&str] = &["Key", "Value"];
pub const ACCOUNTS_HEADER: &[&str] = &["ID", "Institution", "Name", "Balance", "Pull?"];
pub const TRANSACTIONS_HEADER: &[&str] = &[
    "ID",
    "Account_ID",
    "Date",
    "Description",
    "Category",
    "Sub-Category",
    "Amount",
];
pub const AUTO_CATEGORY_HEADER: &[&str] = &["Pattern", "Category", "Sub-Category"];

/// Every sheet penny knows about, with its header.
pub const ALL_SHEETS: &[(&str, &[&str])] = &[
    (SETTINGS, SETTINGS_HEADER),
    (ACCOUNTS, ACCOUNTS_HEADER),
    (TRANSACTIONS, TRANSACTIONS_HEADER),
    (AUTO_CATEGORY, AUTO_CATEGORY_HEADER),
];

pub trait Workbook {
    fn has_sheet(&self, sheet: &str) -> Result<bool>;

    /// Create `sheet` with `header`. No-op when it already exists.
    fn create_sheet(&mut self, sheet: &str, header: &[&str]) -> Result<()>;

    fn header(&self, sheet: &str) -> Result<Row>;

    /// All data rows, top to bottom.
    fn rows(&self, sheet: &str) -> Result<Vec<Row>>;

    fn append_rows(&mut self, sheet: &str, rows: &[Row]) -> Result<()>;

    /// Insert `rows` directly below the header, keeping their order.
    fn insert_rows_after_header(&mut self, sheet: &str, rows: &[Row]) -> Result<()>;

    /// Overwrite the leading cells of data row `index`. Cells past
    /// `cells.len()` keep their current values.
    fn write_row(&mut self, sheet: &str, index: usize, cells: &[String]) -> Result<()> {
        self.write_rows(sheet, &[(index, cells.to_vec())])
    }

    /// Apply several [`Workbook::write_row`] updates at once. Either every
    /// update lands or none does.
    fn write_rows(&mut self, sheet: &str, updates: &[(usize, Row)]) -> Result<()>;

    /// Replace every data row, e.g. after sorting.
    fn replace_rows(&mut self, sheet: &str, rows: &[Row]) -> Result<()>;
}

pub fn ensure_sheet(workbook: &mut dyn Workbook, sheet: &str, header: &[&str]) -> Result<()> {
    if !workbook.has_sheet(sheet)? {
        tracing::info!(sheet, "creating sheet");
        workbook.create_sheet(sheet, header)?;
    }
    Ok(())
}

pub fn create_all_sheets(workbook: &mut dyn Workbook) -> Result<()> {
    for (sheet, header) in ALL_SHEETS {
        ensure_sheet(workbook, sheet, header)?;
    }
    Ok(())
}

pub fn require_sheet(workbook: &dyn Workbook, sheet: &str) -> Result<()> {
    if workbook.has_sheet(sheet)? {
        Ok(())
    } else {
        Err(PennyError::StoreNotFound(sheet.to_string()))
    }
}

pub struct SqliteWorkbook {
    conn: Connection,
}

impl SqliteWorkbook {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = get_connection(db_path)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    fn require(&self, sheet: &str) -> Result<()> {
        require_sheet(self, sheet)
    }
}

fn encode(cells: &[String]) -> Result<String> {
    Ok(serde_json::to_string(cells)?)
}

fn decode(raw: &str) -> Result<Row> {
    Ok(serde_json::from_str(raw)?)
}

fn insert_at(conn: &Connection, sheet: &str, position: i64, cells: &[String]) -> Result<()> {
    conn.execute(
        "INSERT INTO sheet_rows (sheet, position, cells) VALUES (?1, ?2, ?3)",
        rusqlite::params![sheet, position, encode(cells)?],
    )?;
    Ok(())
}

impl Workbook for SqliteWorkbook {
    fn has_sheet(&self, sheet: &str) -> Result<bool> {
        let mut stmt = self.conn.prepare_cached("SELECT 1 FROM sheets WHERE name = ?1")?;
        Ok(stmt.exists([sheet])?)
    }

    fn create_sheet(&mut self, sheet: &str, header: &[&str]) -> Result<()> {
        let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();
        self.conn.execute(
            "INSERT OR IGNORE INTO sheets (name, header) VALUES (?1, ?2)",
            rusqlite::params![sheet, encode(&header)?],
        )?;
        Ok(())
    }

    fn header(&self, sheet: &str) -> Result<Row> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT header FROM sheets WHERE name = ?1", [sheet], |r| r.get(0))
            .optional()?;
        match raw {
            Some(raw) => decode(&raw),
            None => Err(PennyError::StoreNotFound(sheet.to_string())),
        }
    }

    fn rows(&self, sheet: &str) -> Result<Vec<Row>> {
        self.require(sheet)?;
        let mut stmt = self.conn.prepare_cached(
            "SELECT cells FROM sheet_rows WHERE sheet = ?1 ORDER BY position, id",
        )?;
        let raw: Vec<String> = stmt
            .query_map([sheet], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        raw.iter().map(|r| decode(r)).collect()
    }

    fn append_rows(&mut self, sheet: &str, rows: &[Row]) -> Result<()> {
        self.require(sheet)?;
        let tx = self.conn.transaction()?;
        let last: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position), 0) FROM sheet_rows WHERE sheet = ?1",
            [sheet],
            |r| r.get(0),
        )?;
        for (i, row) in rows.iter().enumerate() {
            insert_at(&tx, sheet, last + 1 + i as i64, row)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn insert_rows_after_header(&mut self, sheet: &str, rows: &[Row]) -> Result<()> {
        self.require(sheet)?;
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        let first: i64 = tx.query_row(
            "SELECT COALESCE(MIN(position), 1) FROM sheet_rows WHERE sheet = ?1",
            [sheet],
            |r| r.get(0),
        )?;
        let start = first - rows.len() as i64;
        for (i, row) in rows.iter().enumerate() {
            insert_at(&tx, sheet, start + i as i64, row)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn write_rows(&mut self, sheet: &str, updates: &[(usize, Row)]) -> Result<()> {
        self.require(sheet)?;
        if updates.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        let mut existing: Vec<(i64, String)> = {
            let mut stmt = tx.prepare_cached(
                "SELECT id, cells FROM sheet_rows WHERE sheet = ?1 ORDER BY position, id",
            )?;
            let rows = stmt
                .query_map([sheet], |r| Ok((r.get(0)?, r.get(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };
        for (index, cells) in updates {
            let Some((id, raw)) = existing.get_mut(*index) else {
                // Dropping `tx` rolls back anything already written.
                return Err(PennyError::Other(format!("{sheet} has no row {}", index + 1)));
            };
            let mut current = decode(raw)?;
            if current.len() < cells.len() {
                current.resize(cells.len(), String::new());
            }
            current[..cells.len()].clone_from_slice(cells);
            *raw = encode(&current)?;
            tx.execute(
                "UPDATE sheet_rows SET cells = ?1 WHERE id = ?2",
                rusqlite::params![raw.as_str(), *id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn replace_rows(&mut self, sheet: &str, rows: &[Row]) -> Result<()> {
        self.require(sheet)?;
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM sheet_rows WHERE sheet = ?1", [sheet])?;
        for (i, row) in rows.iter().enumerate() {
            insert_at(&tx, sheet, i as i64 + 1, row)?;
        }
        tx.commit()?;
        Ok(())
    }
}
