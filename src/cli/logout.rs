use crate::cli::open_workbook;
use crate::credentials::{CredentialStore, SheetCredentialStore};
use crate::error::Result;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let mut workbook = open_workbook(&load_settings()?)?;
    SheetCredentialStore::new(&mut workbook).clear()?;
    println!("Cached login cleared. The next sync will ask for a new passcode.");
    Ok(())
}
