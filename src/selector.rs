use crate::error::{PennyError, Result};
use crate::workbook::{Workbook, ACCOUNTS};

const ID_COLUMN: usize = 0;
const PULL_COLUMN: usize = 4;
pub const PULL_YES: &str = "Yes";

/// IDs of accounts whose pull flag is exactly `Yes`, in sheet order.
pub fn select_pull_account_ids(workbook: &dyn Workbook) -> Result<Vec<String>> {
    let ids = workbook
        .rows(ACCOUNTS)?
        .into_iter()
        .filter(|row| row.get(PULL_COLUMN).map(String::as_str) == Some(PULL_YES))
        .filter_map(|row| row.into_iter().nth(ID_COLUMN))
        .filter(|id| !id.is_empty())
        .collect();
    Ok(ids)
}

/// Set or clear the pull flag for one account.
pub fn set_pull_flag(workbook: &mut dyn Workbook, account_id: &str, pull: bool) -> Result<()> {
    let rows = workbook.rows(ACCOUNTS)?;
    let index = rows
        .iter()
        .position(|row| row.get(ID_COLUMN).map(String::as_str) == Some(account_id))
        .ok_or_else(|| PennyError::Other(format!("Unknown account: {account_id}")))?;

    let mut cells = rows[index].clone();
    cells.resize(PULL_COLUMN + 1, String::new());
    cells[PULL_COLUMN] = if pull { PULL_YES.to_string() } else { String::new() };
    workbook.write_row(ACCOUNTS, index, &cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::tests::{row, test_workbook};
    use crate::workbook::ACCOUNTS_HEADER;

    #[test]
    fn test_yes_is_selected() {
        let (_dir, mut wb) = test_workbook();
        wb.create_sheet(ACCOUNTS, ACCOUNTS_HEADER).unwrap();
        wb.append_rows(ACCOUNTS, &[row(&["A1", "Bank", "Checking", "1", "Yes"])]).unwrap();
        assert_eq!(select_pull_account_ids(&wb).unwrap(), vec!["A1"]);
    }

    #[test]
    fn test_no_blank_and_other_casings_are_not_selected() {
        let (_dir, mut wb) = test_workbook();
        wb.create_sheet(ACCOUNTS, ACCOUNTS_HEADER).unwrap();
        wb.append_rows(
            ACCOUNTS,
            &[
                row(&["A1", "Bank", "Checking", "1", "No"]),
                row(&["A2", "Bank", "Savings", "1", ""]),
                row(&["A3", "Bank", "Card", "1", "yes"]),
                row(&["A4", "Bank", "Loan", "1"]),
            ],
        )
        .unwrap();
        assert!(select_pull_account_ids(&wb).unwrap().is_empty());
    }

    #[test]
    fn test_missing_accounts_sheet() {
        let (_dir, wb) = test_workbook();
        assert!(matches!(
            select_pull_account_ids(&wb),
            Err(PennyError::StoreNotFound(_))
        ));
    }

    #[test]
    fn test_set_pull_flag_round_trip() {
        let (_dir, mut wb) = test_workbook();
        wb.create_sheet(ACCOUNTS, ACCOUNTS_HEADER).unwrap();
        wb.append_rows(
            ACCOUNTS,
            &[row(&["A1", "Bank", "Checking", "1", ""]), row(&["A2", "Bank", "Savings", "2"])],
        )
        .unwrap();
        set_pull_flag(&mut wb, "A2", true).unwrap();
        assert_eq!(select_pull_account_ids(&wb).unwrap(), vec!["A2"]);
        set_pull_flag(&mut wb, "A2", false).unwrap();
        assert!(select_pull_account_ids(&wb).unwrap().is_empty());
        assert!(set_pull_flag(&mut wb, "missing", true).is_err());
    }
}
