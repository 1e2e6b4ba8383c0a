use chrono::Utc;

use crate::credentials::{is_fresh, CredentialStore, SheetCredentialStore};
use crate::error::Result;
use crate::fmt::age;
use crate::settings::{load_settings, settings_path, InboxSettings};
use crate::workbook::{SqliteWorkbook, Workbook, ALL_SHEETS, SETTINGS};

pub fn run() -> Result<()> {
    let settings = load_settings()?;
    let db_path = settings.db_path();

    println!("Config:     {}", settings_path().display());
    println!("Email:      {}", if settings.email.is_empty() { "(not set)" } else { &settings.email });
    println!("Data dir:   {}", settings.data_dir);
    println!("Workbook:   {}", db_path.display());
    match &settings.inbox {
        InboxSettings::Prompt => println!("Passcodes:  terminal prompt"),
        InboxSettings::Maildir { path } => println!("Passcodes:  maildir {path}"),
    }

    if !db_path.exists() {
        println!();
        println!("Workbook not found. Run `penny init` to set up.");
        return Ok(());
    }

    let mut workbook = SqliteWorkbook::open(&db_path)?;
    println!();
    for (sheet, _) in ALL_SHEETS.iter().filter(|(s, _)| *s != SETTINGS) {
        if workbook.has_sheet(sheet)? {
            println!("{:<14} {}", format!("{sheet}:"), workbook.rows(sheet)?.len());
        } else {
            println!("{:<14} (missing)", format!("{sheet}:"));
        }
    }

    if workbook.has_sheet(SETTINGS)? {
        let store = SheetCredentialStore::new(&mut workbook);
        println!();
        match store.get()? {
            Some(credential) => {
                let now = Utc::now();
                let state = if is_fresh(&credential, now) { "valid" } else { "expired" };
                println!("Login:      {state}, issued {} ago", age(now - credential.issued_at));
            }
            None => println!("Login:      none cached"),
        }
    }

    Ok(())
}
