use std::path::Path;

use crate::cli::open_workbook;
use crate::credentials::SystemClock;
use crate::error::Result;
use crate::http::ReqwestClient;
use crate::inbox::{Inbox, MaildirInbox};
use crate::pipeline::run_sync;
use crate::settings::{load_settings, shellexpand_path, InboxSettings, Settings};

#[cfg(feature = "prompt")]
fn prompt_inbox() -> Result<Box<dyn Inbox>> {
    Ok(Box::new(crate::inbox::PromptInbox))
}

#[cfg(not(feature = "prompt"))]
fn prompt_inbox() -> Result<Box<dyn Inbox>> {
    Err(crate::error::PennyError::Settings(
        "this build cannot prompt for passcodes; run `penny init --maildir <path>`".to_string(),
    ))
}

fn inbox_for(settings: &Settings) -> Result<Box<dyn Inbox>> {
    match &settings.inbox {
        InboxSettings::Prompt => prompt_inbox(),
        InboxSettings::Maildir { path } => Ok(Box::new(MaildirInbox::new(
            Path::new(&shellexpand_path(path)),
            &settings.passcode_sender,
            &settings.passcode_subject,
        ))),
    }
}

pub fn run() -> Result<()> {
    let settings = load_settings()?;
    let mut workbook = open_workbook(&settings)?;
    let http = ReqwestClient::new()?;
    let mut inbox = inbox_for(&settings)?;

    let report = run_sync(&mut workbook, &settings, &http, inbox.as_mut(), &SystemClock)?;

    println!(
        "Accounts: {} added, {} updated",
        report.accounts.added, report.accounts.updated
    );
    println!(
        "Transactions: {} fetched from {} account(s), {} new, {} already stored",
        report.fetched_transactions,
        report.selected_accounts,
        report.transactions.inserted,
        report.transactions.skipped
    );
    if report.selected_accounts == 0 {
        println!("No accounts are marked for pulling. Use `penny accounts pull <ID>`.");
    }
    Ok(())
}
