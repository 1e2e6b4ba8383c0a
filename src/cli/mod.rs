pub mod accounts;
pub mod export;
pub mod init;
pub mod logout;
pub mod rules;
pub mod status;
pub mod sync;

use clap::{Parser, Subcommand};

use crate::error::{PennyError, Result};
use crate::settings::Settings;
use crate::workbook::SqliteWorkbook;

/// Open the configured workbook, refusing to create one implicitly.
pub(crate) fn open_workbook(settings: &Settings) -> Result<SqliteWorkbook> {
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(PennyError::Settings(format!(
            "No workbook found at {}\nRun `penny init` to create one.",
            db_path.display()
        )));
    }
    SqliteWorkbook::open(&db_path)
}

#[derive(Parser)]
#[command(
    name = "penny",
    version,
    about = "Pull bank accounts and transactions from Quiltt into a local workbook.",
    long_about = "Pull bank accounts and transactions from Quiltt into a local workbook.\n\nRun without a command to sync."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up penny: choose a data directory and login email, create the workbook.
    Init {
        /// Path for penny data (default: ~/Documents/penny)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Email address the Quiltt passcode is sent to
        #[arg(long)]
        email: Option<String>,
        /// Read passcodes from this maildir instead of asking on the terminal
        #[arg(long)]
        maildir: Option<String>,
    },
    /// Log in if needed, then pull accounts and flagged transactions.
    Sync,
    /// Manage accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Manage auto-categorization rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Write a sheet (Accounts, Transactions, AutoCategory) as CSV.
    Export {
        /// Sheet name
        sheet: String,
        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<String>,
    },
    /// Forget the cached login token.
    Logout,
    /// Show configuration and workbook summary.
    Status,
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// List synced accounts.
    List,
    /// Mark an account so its transactions are pulled on sync.
    Pull {
        /// Account ID (shown in `penny accounts list`)
        id: String,
        /// Stop pulling this account instead
        #[arg(long)]
        off: bool,
    },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Append a rule. Earlier rules win.
    Add {
        /// Regular expression matched case-insensitively against descriptions
        pattern: String,
        /// Category to assign
        #[arg(long)]
        category: String,
        /// Sub-category to assign
        #[arg(long = "sub-category", default_value = "")]
        sub_category: String,
    },
    /// List rules in evaluation order.
    List,
    /// Delete a rule by its number.
    Delete {
        /// Rule number (shown in `penny rules list`)
        number: usize,
    },
}
