use std::io::Write;

use crate::cli::open_workbook;
use crate::error::{PennyError, Result};
use crate::settings::load_settings;
use crate::workbook::{Workbook, ACCOUNTS, AUTO_CATEGORY, TRANSACTIONS};

/// Sheets that may be exported. Settings holds the login token and is left out.
const EXPORTABLE: &[&str] = &[ACCOUNTS, TRANSACTIONS, AUTO_CATEGORY];

fn resolve_sheet(name: &str) -> Result<&'static str> {
    EXPORTABLE
        .iter()
        .find(|s| s.eq_ignore_ascii_case(name))
        .copied()
        .ok_or_else(|| {
            PennyError::Other(format!(
                "Cannot export '{name}'. Choose one of: {}",
                EXPORTABLE.join(", ")
            ))
        })
}

fn write_csv<W: Write>(workbook: &dyn Workbook, sheet: &str, out: W) -> Result<usize> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(out);
    writer.write_record(workbook.header(sheet)?)?;
    let rows = workbook.rows(sheet)?;
    for row in &rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(rows.len())
}

pub fn run(sheet: &str, output: Option<String>) -> Result<()> {
    let sheet = resolve_sheet(sheet)?;
    let workbook = open_workbook(&load_settings()?)?;
    match output {
        Some(path) => {
            let file = std::fs::File::create(&path)?;
            let count = write_csv(&workbook, sheet, file)?;
            println!("Wrote {count} {sheet} rows to {path}");
        }
        None => {
            write_csv(&workbook, sheet, std::io::stdout().lock())?;
        }
    }
    Ok(())
}
