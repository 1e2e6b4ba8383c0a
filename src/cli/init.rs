use std::path::PathBuf;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path, InboxSettings};
use crate::workbook::{create_all_sheets, SqliteWorkbook};

pub fn run(data_dir: Option<String>, email: Option<String>, maildir: Option<String>) -> Result<()> {
    let mut settings = load_settings()?;

    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    if let Some(email) = email {
        settings.email = email.trim().to_string();
    }
    if let Some(path) = maildir {
        settings.inbox = InboxSettings::Maildir {
            path: shellexpand_path(&path),
        };
    }
    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;

    let mut workbook = SqliteWorkbook::open(&settings.db_path())?;
    create_all_sheets(&mut workbook)?;

    println!("Initialized penny at {}", resolved.display());
    if settings.email.is_empty() {
        println!("No login email set yet. Run `penny init --email <address>` before syncing.");
    }
    Ok(())
}
