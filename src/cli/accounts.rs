use comfy_table::{Cell, Table};

use crate::cli::open_workbook;
use crate::error::Result;
use crate::fmt::money_cell;
use crate::selector::set_pull_flag;
use crate::settings::load_settings;
use crate::workbook::{Workbook, ACCOUNTS};

pub fn list() -> Result<()> {
    let workbook = open_workbook(&load_settings()?)?;
    if !workbook.has_sheet(ACCOUNTS)? {
        println!("No accounts yet. Run `penny sync` first.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Institution", "Name", "Balance", "Pull?"]);
    for row in workbook.rows(ACCOUNTS)? {
        let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
        table.add_row(vec![
            Cell::new(cell(0)),
            Cell::new(cell(1)),
            Cell::new(cell(2)),
            Cell::new(money_cell(&cell(3))),
            Cell::new(cell(4)),
        ]);
    }
    println!("Accounts\n{table}");
    Ok(())
}

pub fn pull(id: &str, off: bool) -> Result<()> {
    let mut workbook = open_workbook(&load_settings()?)?;
    set_pull_flag(&mut workbook, id, !off)?;
    if off {
        println!("Stopped pulling {id}");
    } else {
        println!("Pulling transactions for {id} on next sync");
    }
    Ok(())
}
