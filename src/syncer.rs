use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::categorizer::categorize;
use crate::error::Result;
use crate::models::{Account, CategoryRule, Transaction};
use crate::workbook::{
    ensure_sheet, Row, Workbook, ACCOUNTS, ACCOUNTS_HEADER, TRANSACTIONS, TRANSACTIONS_HEADER,
};

#[derive(Debug, Default, PartialEq)]
pub struct AccountSyncResult {
    pub added: usize,
    pub updated: usize,
}

#[derive(Debug, Default, PartialEq)]
pub struct TransactionSyncResult {
    pub inserted: usize,
    pub skipped: usize,
}

fn account_cells(account: &Account) -> Row {
    vec![
        account.id.clone(),
        account.institution_name().to_string(),
        account.name.clone(),
        account
            .current_balance()
            .map(|b| b.to_string())
            .unwrap_or_default(),
    ]
}

// ---------------------------------------------------------------------------
// Accounts: upsert by ID
// ---------------------------------------------------------------------------

/// Upsert fetched accounts. Existing rows get institution, name and balance
/// overwritten in place; the pull flag column is never written. Unknown IDs
/// are appended with a blank pull flag.
pub fn sync_accounts(workbook: &mut dyn Workbook, accounts: &[Account]) -> Result<AccountSyncResult> {
    ensure_sheet(workbook, ACCOUNTS, ACCOUNTS_HEADER)?;

    let existing = workbook.rows(ACCOUNTS)?;
    let mut index: HashMap<String, usize> = HashMap::new();
    for (i, row) in existing.iter().enumerate() {
        if let Some(id) = row.first() {
            index.entry(id.clone()).or_insert(i);
        }
    }

    let mut result = AccountSyncResult::default();
    let mut updates: Vec<(usize, Row)> = Vec::new();
    let mut staged: Vec<Row> = Vec::new();
    for account in accounts {
        let cells = account_cells(account);
        match index.get(&account.id).copied() {
            Some(i) if i < existing.len() => {
                updates.push((i, cells));
                result.updated += 1;
            }
            // Repeated within this batch: last fetch wins.
            Some(i) => staged[i - existing.len()][..cells.len()].clone_from_slice(&cells),
            None => {
                index.insert(account.id.clone(), existing.len() + staged.len());
                let mut row = cells;
                row.push(String::new());
                staged.push(row);
                result.added += 1;
            }
        }
    }

    workbook.write_rows(ACCOUNTS, &updates)?;
    if !staged.is_empty() {
        workbook.append_rows(ACCOUNTS, &staged)?;
    }
    tracing::info!(added = result.added, updated = result.updated, "accounts synced");
    Ok(result)
}

// ---------------------------------------------------------------------------
// Transactions: insert if absent
// ---------------------------------------------------------------------------

/// Insert transactions whose ID is not yet in the sheet, categorized by the
/// first matching rule. New rows land as one batch directly below the header,
/// in input order. Stored rows are never touched.
pub fn sync_transactions(
    workbook: &mut dyn Workbook,
    transactions: &[Transaction],
    rules: &[CategoryRule],
) -> Result<TransactionSyncResult> {
    ensure_sheet(workbook, TRANSACTIONS, TRANSACTIONS_HEADER)?;

    let mut known: HashSet<String> = workbook
        .rows(TRANSACTIONS)?
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .collect();

    let mut result = TransactionSyncResult::default();
    let mut staged: Vec<Row> = Vec::new();
    for txn in transactions {
        if !known.insert(txn.id.clone()) {
            result.skipped += 1;
            continue;
        }
        let (category, sub_category) = categorize(&txn.description, rules);
        tracing::debug!(
            id = %txn.id,
            account = %txn.account.name,
            check_number = txn.check_number(),
            category,
            "staging transaction"
        );
        staged.push(vec![
            txn.id.clone(),
            txn.account.id.clone(),
            txn.date.clone(),
            txn.description.clone(),
            category.to_string(),
            sub_category.to_string(),
            txn.amount.to_string(),
        ]);
    }

    workbook.insert_rows_after_header(TRANSACTIONS, &staged)?;
    result.inserted = staged.len();
    tracing::info!(inserted = result.inserted, skipped = result.skipped, "transactions synced");
    Ok(result)
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

fn sort_key(row: &Row) -> (Option<NaiveDate>, Option<Decimal>) {
    let date = row
        .get(2)
        .and_then(|d| NaiveDate::parse_from_str(d.get(..10).unwrap_or(d), "%Y-%m-%d").ok());
    let amount = row.get(6).and_then(|a| Decimal::from_str(a).ok());
    (date, amount)
}

fn newest_first(a: &Row, b: &Row) -> Ordering {
    let (a_date, a_amount) = sort_key(a);
    let (b_date, b_amount) = sort_key(b);
    b_date.cmp(&a_date).then(b_amount.cmp(&a_amount))
}

/// Sort the Transactions sheet by date, then amount, both descending. Rows
/// with an unparseable date sink to the bottom.
pub fn sort_transactions(workbook: &mut dyn Workbook) -> Result<()> {
    let mut rows = workbook.rows(TRANSACTIONS)?;
    rows.sort_by(newest_first);
    workbook.replace_rows(TRANSACTIONS, &rows)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::categorizer::compile_pattern;
    use crate::models::{AccountRef, Balance, Institution};
    use crate::selector::set_pull_flag;
    use crate::workbook::tests::{row, test_workbook};
    use rust_decimal_macros::dec;

    pub(crate) fn account(id: &str, name: &str, balance: Decimal) -> Account {
        Account {
            id: id.to_string(),
            name: name.to_string(),
            institution: Some(Institution {
                name: "First Bank".to_string(),
            }),
            balance: Some(Balance {
                current: Some(balance),
            }),
        }
    }

    pub(crate) fn txn(id: &str, date: &str, description: &str, amount: Decimal) -> Transaction {
        Transaction {
            id: id.to_string(),
            amount,
            date: date.to_string(),
            description: description.to_string(),
            account: AccountRef {
                id: "A1".to_string(),
                name: "Checking".to_string(),
            },
            source: None,
        }
    }

    fn rule(pattern: &str, category: &str, sub_category: &str) -> CategoryRule {
        CategoryRule {
            pattern: compile_pattern(pattern).unwrap(),
            category: category.to_string(),
            sub_category: sub_category.to_string(),
        }
    }

    #[test]
    fn test_empty_store_gains_account_with_blank_pull_flag() {
        let (_dir, mut wb) = test_workbook();
        let result = sync_accounts(&mut wb, &[account("A1", "Checking", dec!(100.25))]).unwrap();
        assert_eq!(result, AccountSyncResult { added: 1, updated: 0 });
        assert_eq!(
            wb.rows(ACCOUNTS).unwrap(),
            vec![row(&["A1", "First Bank", "Checking", "100.25", ""])]
        );
    }

    #[test]
    fn test_account_sync_is_idempotent() {
        let (_dir, mut wb) = test_workbook();
        let accounts = vec![account("A1", "Checking", dec!(10)), account("A2", "Savings", dec!(20))];
        sync_accounts(&mut wb, &accounts).unwrap();
        let once = wb.rows(ACCOUNTS).unwrap();
        let second = sync_accounts(&mut wb, &accounts).unwrap();
        assert_eq!(second, AccountSyncResult { added: 0, updated: 2 });
        assert_eq!(wb.rows(ACCOUNTS).unwrap(), once);
    }

    #[test]
    fn test_account_update_overwrites_in_place_and_keeps_pull_flag() {
        let (_dir, mut wb) = test_workbook();
        sync_accounts(&mut wb, &[account("A1", "Checking", dec!(10))]).unwrap();
        wb.write_row(ACCOUNTS, 0, &row(&["A1", "First Bank", "Checking", "10", "Yes"])).unwrap();

        sync_accounts(&mut wb, &[account("A1", "Renamed", dec!(99.99))]).unwrap();
        assert_eq!(
            wb.rows(ACCOUNTS).unwrap(),
            vec![row(&["A1", "First Bank", "Renamed", "99.99", "Yes"])]
        );
    }

    #[test]
    fn test_many_existing_accounts_update_in_one_pass() {
        let (_dir, mut wb) = test_workbook();
        let ids = ["A1", "A2", "A3", "A4"];
        let first: Vec<Account> = ids.iter().map(|id| account(id, "Old", dec!(1))).collect();
        sync_accounts(&mut wb, &first).unwrap();
        set_pull_flag(&mut wb, "A3", true).unwrap();

        let mut second: Vec<Account> = ids.iter().rev().map(|id| account(id, "New", dec!(2))).collect();
        second.push(account("A5", "Fresh", dec!(3)));
        let result = sync_accounts(&mut wb, &second).unwrap();
        assert_eq!(result, AccountSyncResult { added: 1, updated: 4 });
        assert_eq!(
            wb.rows(ACCOUNTS).unwrap(),
            vec![
                row(&["A1", "First Bank", "New", "2", ""]),
                row(&["A2", "First Bank", "New", "2", ""]),
                row(&["A3", "First Bank", "New", "2", "Yes"]),
                row(&["A4", "First Bank", "New", "2", ""]),
                row(&["A5", "First Bank", "Fresh", "3", ""]),
            ]
        );
    }

    #[test]
    fn test_duplicate_account_in_one_batch_appends_once() {
        let (_dir, mut wb) = test_workbook();
        let result = sync_accounts(
            &mut wb,
            &[account("A1", "Old", dec!(1)), account("A1", "New", dec!(2))],
        )
        .unwrap();
        assert_eq!(result.added, 1);
        assert_eq!(
            wb.rows(ACCOUNTS).unwrap(),
            vec![row(&["A1", "First Bank", "New", "2", ""])]
        );
    }

    #[test]
    fn test_account_without_balance_writes_blank() {
        let (_dir, mut wb) = test_workbook();
        let mut acct = account("A1", "Cash", dec!(0));
        acct.balance = None;
        acct.institution = None;
        sync_accounts(&mut wb, &[acct]).unwrap();
        assert_eq!(wb.rows(ACCOUNTS).unwrap(), vec![row(&["A1", "", "Cash", "", ""])]);
    }

    #[test]
    fn test_new_transactions_are_categorized_and_inserted_on_top() {
        let (_dir, mut wb) = test_workbook();
        sync_transactions(&mut wb, &[txn("T0", "2024-01-01", "old", dec!(1))], &[]).unwrap();

        let rules = vec![rule("invoice", "Biz", "Inv"), rule("inv", "Other", "X")];
        let result = sync_transactions(
            &mut wb,
            &[
                txn("T2", "2024-02-02", "Invoice #123", dec!(-50)),
                txn("T1", "2024-02-01", "Grocer", dec!(-12.34)),
            ],
            &rules,
        )
        .unwrap();
        assert_eq!(result, TransactionSyncResult { inserted: 2, skipped: 0 });
        assert_eq!(
            wb.rows(TRANSACTIONS).unwrap(),
            vec![
                row(&["T2", "A1", "2024-02-02", "Invoice #123", "Biz", "Inv", "-50"]),
                row(&["T1", "A1", "2024-02-01", "Grocer", "", "", "-12.34"]),
                row(&["T0", "A1", "2024-01-01", "old", "", "", "1"]),
            ]
        );
    }

    #[test]
    fn test_stored_transaction_is_never_mutated_or_duplicated() {
        let (_dir, mut wb) = test_workbook();
        sync_transactions(&mut wb, &[txn("T1", "2024-02-01", "Coffee", dec!(-3))], &[]).unwrap();
        wb.write_row(TRANSACTIONS, 0, &row(&["T1", "A1", "2024-02-01", "Coffee", "Food", "Cafe"])).unwrap();
        let before = wb.rows(TRANSACTIONS).unwrap();

        let rules = vec![rule("coffee", "Drinks", "Hot")];
        let result = sync_transactions(
            &mut wb,
            &[txn("T1", "2024-02-01", "Coffee changed", dec!(-4))],
            &rules,
        )
        .unwrap();
        assert_eq!(result, TransactionSyncResult { inserted: 0, skipped: 1 });
        assert_eq!(wb.rows(TRANSACTIONS).unwrap(), before);
    }

    #[test]
    fn test_duplicate_transaction_in_one_batch_inserts_once() {
        let (_dir, mut wb) = test_workbook();
        let t = txn("T1", "2024-02-01", "Coffee", dec!(-3));
        let result = sync_transactions(&mut wb, &[t.clone(), t], &[]).unwrap();
        assert_eq!(result, TransactionSyncResult { inserted: 1, skipped: 1 });
        assert_eq!(wb.rows(TRANSACTIONS).unwrap().len(), 1);
    }

    #[test]
    fn test_sort_transactions_by_date_then_amount_desc() {
        let (_dir, mut wb) = test_workbook();
        sync_transactions(
            &mut wb,
            &[
                txn("a", "2024-01-05", "x", dec!(5)),
                txn("b", "2024-03-01", "x", dec!(-1)),
                txn("c", "2024-03-01", "x", dec!(20)),
                txn("d", "not a date", "x", dec!(1)),
            ],
            &[],
        )
        .unwrap();
        sort_transactions(&mut wb).unwrap();
        let ids: Vec<String> = wb.rows(TRANSACTIONS).unwrap().into_iter().map(|r| r[0].clone()).collect();
        assert_eq!(ids, vec!["c", "b", "a", "d"]);
    }
}
