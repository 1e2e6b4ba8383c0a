use comfy_table::{Cell, Table};

use crate::categorizer::compile_pattern;
use crate::cli::open_workbook;
use crate::error::{PennyError, Result};
use crate::settings::load_settings;
use crate::workbook::{Workbook, AUTO_CATEGORY};

pub fn add(pattern: &str, category: &str, sub_category: &str) -> Result<()> {
    compile_pattern(pattern)?;
    let mut workbook = open_workbook(&load_settings()?)?;
    workbook.append_rows(
        AUTO_CATEGORY,
        &[vec![pattern.to_string(), category.to_string(), sub_category.to_string()]],
    )?;
    if sub_category.is_empty() {
        println!("Added rule: '{pattern}' \u{2192} {category}");
    } else {
        println!("Added rule: '{pattern}' \u{2192} {category} / {sub_category}");
    }
    Ok(())
}

pub fn list() -> Result<()> {
    let workbook = open_workbook(&load_settings()?)?;
    let mut table = Table::new();
    table.set_header(vec!["#", "Pattern", "Category", "Sub-Category"]);
    for (i, row) in workbook.rows(AUTO_CATEGORY)?.into_iter().enumerate() {
        let cell = |c: usize| row.get(c).cloned().unwrap_or_default();
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(cell(0)),
            Cell::new(cell(1)),
            Cell::new(cell(2)),
        ]);
    }
    println!("Rules (first match wins)\n{table}");
    Ok(())
}

pub fn delete(number: usize) -> Result<()> {
    let mut workbook = open_workbook(&load_settings()?)?;
    let mut rows = workbook.rows(AUTO_CATEGORY)?;
    if number == 0 || number > rows.len() {
        return Err(PennyError::Other(format!("No rule number {number}")));
    }
    let removed = rows.remove(number - 1);
    workbook.replace_rows(AUTO_CATEGORY, &rows)?;
    println!(
        "Deleted rule {number}: '{}' \u{2192} {}",
        removed.first().map(String::as_str).unwrap_or(""),
        removed.get(1).map(String::as_str).unwrap_or("")
    );
    Ok(())
}
