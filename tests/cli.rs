use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn penny(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("penny").unwrap();
    cmd.env("HOME", home.path()).env_remove("RUST_LOG");
    cmd
}

fn init(home: &TempDir, email: Option<&str>) {
    let data_dir = home.path().join("data");
    let mut cmd = penny(home);
    cmd.arg("init").arg("--data-dir").arg(&data_dir);
    if let Some(email) = email {
        cmd.arg("--email").arg(email);
    }
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Initialized penny"));
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    penny(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("accounts"))
        .stdout(predicate::str::contains("rules"))
        .stdout(predicate::str::contains("logout"));
}

#[test]
fn commands_require_init() {
    let home = TempDir::new().unwrap();
    penny(&home)
        .args(["accounts", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("penny init"));
}

#[test]
fn init_writes_settings_and_workbook() {
    let home = TempDir::new().unwrap();
    init(&home, Some("alice@example.com"));

    assert!(home.path().join(".config/penny/settings.json").exists());
    assert!(home.path().join("data/penny.db").exists());

    penny(&home)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("alice@example.com"))
        .stdout(predicate::str::contains("Transactions:"))
        .stdout(predicate::str::contains("none cached"));
}

#[test]
fn rules_add_list_delete() {
    let home = TempDir::new().unwrap();
    init(&home, None);

    penny(&home)
        .args(["rules", "add", "coffee|espresso", "--category", "Food", "--sub-category", "Cafe"])
        .assert()
        .success();
    penny(&home)
        .args(["rules", "add", "shell", "--category", "Auto"])
        .assert()
        .success();

    penny(&home)
        .args(["rules", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("coffee|espresso"))
        .stdout(predicate::str::contains("Cafe"))
        .stdout(predicate::str::contains("shell"));

    penny(&home).args(["rules", "delete", "1"]).assert().success();
    penny(&home)
        .args(["rules", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("coffee").not())
        .stdout(predicate::str::contains("shell"));

    penny(&home)
        .args(["rules", "delete", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No rule number 5"));
}

#[test]
fn rules_add_rejects_bad_pattern() {
    let home = TempDir::new().unwrap();
    init(&home, None);
    penny(&home)
        .args(["rules", "add", "(unclosed", "--category", "X"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn accounts_list_on_empty_workbook() {
    let home = TempDir::new().unwrap();
    init(&home, None);
    penny(&home)
        .args(["accounts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pull?"));
}

#[test]
fn export_refuses_settings_sheet() {
    let home = TempDir::new().unwrap();
    init(&home, None);
    penny(&home)
        .args(["export", "settings"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot export"));
    penny(&home)
        .args(["export", "autocategory"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Pattern,Category,Sub-Category"));
}

#[test]
fn sync_without_email_fails_before_network() {
    let home = TempDir::new().unwrap();
    init(&home, None);
    penny(&home)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no login email configured"));
}

#[test]
fn logout_without_cached_login_succeeds() {
    let home = TempDir::new().unwrap();
    init(&home, None);
    penny(&home)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cached login cleared"));
}
