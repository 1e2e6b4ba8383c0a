mod categorizer;
mod cli;
mod credentials;
mod db;
mod error;
mod fetcher;
mod fmt;
mod http;
mod inbox;
mod logging;
mod models;
mod pipeline;
mod selector;
mod session;
mod settings;
mod syncer;
mod workbook;

use clap::Parser;

use cli::{AccountsCommands, Cli, Commands, RulesCommands};

fn main() {
    let cli = Cli::parse();

    let level = settings::load_settings()
        .map(|s| s.log_level)
        .unwrap_or_else(|_| "info".to_string());
    logging::setup_logging(&level);

    let result = match cli.command {
        None | Some(Commands::Sync) => cli::sync::run(),
        Some(Commands::Init {
            data_dir,
            email,
            maildir,
        }) => cli::init::run(data_dir, email, maildir),
        Some(Commands::Accounts { command }) => match command {
            AccountsCommands::List => cli::accounts::list(),
            AccountsCommands::Pull { id, off } => cli::accounts::pull(&id, off),
        },
        Some(Commands::Rules { command }) => match command {
            RulesCommands::Add {
                pattern,
                category,
                sub_category,
            } => cli::rules::add(&pattern, &category, &sub_category),
            RulesCommands::List => cli::rules::list(),
            RulesCommands::Delete { number } => cli::rules::delete(number),
        },
        Some(Commands::Export { sheet, output }) => cli::export::run(&sheet, output),
        Some(Commands::Logout) => cli::logout::run(),
        Some(Commands::Status) => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
