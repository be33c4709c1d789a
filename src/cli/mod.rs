//! Command-line surface: argument tree, handlers and user-facing output.

mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;

use crate::{config::resolve_ledger_dir, errors::LedgerError};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit:  ",
    env!("BEAN_COMPOSE_BUILD_HASH"),
    "\nbuilt:   ",
    env!("BEAN_COMPOSE_BUILD_TIMESTAMP"),
    "\nprofile: ",
    env!("BEAN_COMPOSE_BUILD_PROFILE"),
);

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("The transaction did not proceed.")]
    Declined,
}

#[derive(Debug, Parser)]
#[command(
    name = "bean-compose",
    version,
    long_version = LONG_VERSION,
    about = "Compose, insert and tidy entries of a plain-text ledger"
)]
pub struct Cli {
    /// Ledger directory. Defaults to $BEAN_COMPOSE_DIR, then $BEANCOUNT_TRANSACTION_DIR.
    #[arg(short, long, global = true, value_name = "DIRECTORY")]
    pub directory: Option<PathBuf>,
    /// Disable colored output.
    #[arg(long, global = true)]
    pub plain: bool,
    /// Only print warnings, errors and results.
    #[arg(short, long, global = true)]
    pub quiet: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compose a new transaction and insert it in date order.
    Add(AddArgs),
    /// Insert the transactions of another ledger file verbatim.
    Import(ImportArgs),
    /// Fuzzy-search templates, accounts, payees or narrations.
    Search(SearchArgs),
    /// Align amounts in ledger files.
    Format(FormatArgs),
    /// Run consistency checks over the ledger.
    Check {
        #[arg(value_enum)]
        what: CheckKind,
    },
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Template label from the templates file.
    #[arg(short, long, value_name = "LABEL")]
    pub template: Option<String>,
    /// Entry date (`2024-03-01`, `01/03/2024`, `today`, `2 days ago`, ...).
    #[arg(long)]
    pub date: Option<String>,
    #[arg(short, long)]
    pub payee: Option<String>,
    #[arg(short, long)]
    pub narration: Option<String>,
    /// Tag to attach; may be repeated.
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
    /// Flag the entry `!` instead of `*`.
    #[arg(long)]
    pub incomplete: bool,
    /// Offer splits for valued lines.
    #[arg(long)]
    pub split: bool,
    /// Print the entry without writing it.
    #[arg(long)]
    pub dry_run: bool,
    /// Create a missing target file without asking.
    #[arg(long)]
    pub create: bool,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    pub file: PathBuf,
    /// Create missing target files without asking.
    #[arg(long)]
    pub create: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchKind {
    Templates,
    Accounts,
    Payees,
    Narrations,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(value_enum)]
    pub kind: SearchKind,
    /// Search term; lists everything when omitted.
    #[arg(short, long)]
    pub search: Option<String>,
    /// Maximum number of results.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatTarget {
    Transactions,
}

#[derive(Debug, Args)]
pub struct FormatArgs {
    #[arg(value_enum)]
    pub target: FormatTarget,
    /// Column the currency should start at.
    #[arg(long, conflicts_with = "auto_width")]
    pub currency_column: Option<usize>,
    /// Align on the widest account and amount instead of a fixed column.
    #[arg(long)]
    pub auto_width: bool,
    #[arg(long)]
    pub prefix_width: Option<usize>,
    #[arg(long)]
    pub num_width: Option<usize>,
    #[arg(long)]
    pub indent_width: Option<usize>,
    /// Skip the `.backup` copy.
    #[arg(long)]
    pub no_backup: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CheckKind {
    TransactionDates,
    Syntax,
}

/// Runs one parsed command line.
pub fn run(cli: Cli) -> Result<(), CliError> {
    output::set_preferences(output::OutputPreferences {
        plain_mode: cli.plain || std::env::var_os("NO_COLOR").is_some(),
        quiet_mode: cli.quiet,
    });
    let dir = resolve_ledger_dir(cli.directory)?;
    tracing::debug!(dir = %dir.display(), command = ?cli.command, "running command");
    match cli.command {
        Command::Add(args) => commands::add(&dir, args),
        Command::Import(args) => commands::import(&dir, args),
        Command::Search(args) => commands::search(&dir, args),
        Command::Format(args) => commands::format(&dir, args),
        Command::Check { what } => commands::check(&dir, what),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn add_collects_repeated_tags() {
        let cli = Cli::try_parse_from([
            "bean-compose",
            "-d",
            "/ledger",
            "add",
            "-t",
            "rent",
            "--tag",
            "home",
            "--tag",
            "#2024",
            "--split",
        ])
        .unwrap();
        let Command::Add(args) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.template.as_deref(), Some("rent"));
        assert_eq!(args.tags, vec!["home", "#2024"]);
        assert!(args.split);
        assert_eq!(cli.directory, Some(PathBuf::from("/ledger")));
    }

    #[test]
    fn check_kinds_are_kebab_case() {
        let cli = Cli::try_parse_from(["bean-compose", "check", "transaction-dates"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Check {
                what: CheckKind::TransactionDates
            }
        ));
    }

    #[test]
    fn currency_column_conflicts_with_auto_width() {
        assert!(Cli::try_parse_from([
            "bean-compose",
            "format",
            "transactions",
            "--auto-width",
            "--currency-column",
            "60",
        ])
        .is_err());
    }
}
