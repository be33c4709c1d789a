#![allow(dead_code)]

use std::{fs, path::Path};

use assert_cmd::Command;
use tempfile::TempDir;

pub const MAIN: &str = "\
2020-01-01 open Assets:Cash
2020-01-01 open Assets:Bank
2020-01-01 open Assets:Receivable
2020-01-01 open Expenses:Food
2020-01-01 open Expenses:Housing
";

pub const TRANSACTIONS: &str = "\
2024-01-05 * \"Bakery\" \"Bread\"
\tExpenses:Food  2.00 EUR
\tAssets:Cash

2024-01-20 * \"Landlord\" \"Rent\"
\tExpenses:Housing  950.00 EUR
\tAssets:Bank
";

pub const TEMPLATES: &str = "\
rent:
  payee: Landlord
  narration: Rent
  lines:
    - account: Expenses:Housing
      value: 950.00 EUR
      splits:
        - account: Assets:Receivable
          value: -0.5
    - account: Assets:Bank
      no_value: true
";

/// Creates a ledger directory with accounts, two transactions and one template.
pub fn ledger() -> TempDir {
    let temp = TempDir::new().expect("create temp dir");
    fs::write(temp.path().join("main.beancount"), MAIN).expect("write main file");
    fs::write(temp.path().join("transactions.beancount"), TRANSACTIONS)
        .expect("write transactions");
    fs::write(temp.path().join("templates.yaml"), TEMPLATES).expect("write templates");
    temp
}

/// The binary pointed at `dir`, isolated from the caller's environment.
pub fn bean(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bean-compose").expect("binary built");
    cmd.env_remove("BEAN_COMPOSE_DIR")
        .env_remove("BEANCOUNT_TRANSACTION_DIR")
        .env_remove("BEAN_COMPOSE_TEST_INPUTS")
        .env("BEAN_COMPOSE_CACHE", dir.join(".cache"))
        .env("NO_COLOR", "1")
        .arg("-d")
        .arg(dir);
    cmd
}

pub fn transactions(dir: &Path) -> String {
    fs::read_to_string(dir.join("transactions.beancount")).expect("read transactions")
}
