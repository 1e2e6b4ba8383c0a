//! One full sync run: log in, pull accounts, pull flagged transactions.

use crate::categorizer::load_rules;
use crate::credentials::{acquire_token, Clock, SheetCredentialStore};
use crate::error::{PennyError, Result};
use crate::fetcher::GraphQlClient;
use crate::http::HttpClient;
use crate::inbox::Inbox;
use crate::models::CategoryRule;
use crate::selector::select_pull_account_ids;
use crate::session::SessionClient;
use crate::settings::Settings;
use crate::syncer::{
    sort_transactions, sync_accounts, sync_transactions, AccountSyncResult, TransactionSyncResult,
};
use crate::workbook::{require_sheet, Workbook, AUTO_CATEGORY, SETTINGS};

#[derive(Debug, Default)]
pub struct SyncReport {
    pub accounts: AccountSyncResult,
    pub selected_accounts: usize,
    pub fetched_transactions: usize,
    pub transactions: TransactionSyncResult,
}

/// Everything that can be checked without the network: required sheets,
/// rule patterns, login identity.
fn preflight(workbook: &dyn Workbook, settings: &Settings) -> Result<Vec<CategoryRule>> {
    require_sheet(workbook, SETTINGS)?;
    require_sheet(workbook, AUTO_CATEGORY)?;
    let rules = load_rules(workbook)?;
    if settings.email.trim().is_empty() {
        return Err(PennyError::Settings(
            "no login email configured; run `penny init --email <address>`".to_string(),
        ));
    }
    Ok(rules)
}

pub fn run_sync(
    workbook: &mut dyn Workbook,
    settings: &Settings,
    http: &dyn HttpClient,
    inbox: &mut dyn Inbox,
    clock: &dyn Clock,
) -> Result<SyncReport> {
    let rules = preflight(workbook, settings)?;
    tracing::debug!(rules = rules.len(), "preflight passed");

    let session = SessionClient::new(http, &settings.auth_url, &settings.deployment_id, &settings.email);
    let credential = {
        let mut store = SheetCredentialStore::new(&mut *workbook);
        acquire_token(&mut store, clock, &session, inbox)?
    };

    let api = GraphQlClient::new(http, &settings.api_url, &credential.token);
    let mut report = SyncReport::default();

    let accounts = api.fetch_accounts()?;
    report.accounts = sync_accounts(workbook, &accounts)?;

    let account_ids = select_pull_account_ids(workbook)?;
    report.selected_accounts = account_ids.len();
    let transactions = if account_ids.is_empty() {
        tracing::info!("no accounts marked for pulling");
        Vec::new()
    } else {
        api.fetch_transactions(&account_ids)?
    };
    report.fetched_transactions = transactions.len();
    report.transactions = sync_transactions(workbook, &transactions, &rules)?;

    if settings.sort_after_sync && report.transactions.inserted > 0 {
        sort_transactions(workbook)?;
    }
    Ok(report)
}
