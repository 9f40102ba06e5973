use assert_cmd::Command;
use predicates::prelude::*;

fn shelf() -> Command {
    let mut cmd = Command::cargo_bin("shelf").unwrap();
    let empty = std::env::temp_dir().join("shelf-cli-no-config");
    cmd.current_dir(std::env::temp_dir())
        .env_remove("SHELF_ENV")
        .env_remove("RUST_LOG")
        .env("SHELF_CONFIG_DIR", empty)
        .env("SHELF_DATABASE__URL", "sqlite::memory:");
    cmd
}

#[test]
fn help_lists_subcommands() {
    shelf()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("routes"));
}

#[test]
fn check_prints_effective_settings() {
    shelf()
        .arg("check")
        .env("SHELF_SERVER__PORT", "9099")
        .assert()
        .success()
        .stdout(predicate::str::contains("environment:      Local"))
        .stdout(predicate::str::contains(":9099"))
        .stdout(predicate::str::contains("sqlite::memory:"));
}

#[test]
fn unknown_environment_fails() {
    shelf()
        .arg("check")
        .env("SHELF_ENV", "qa")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported environment 'qa'"));
}

#[test]
fn routes_lists_every_resource() {
    shelf()
        .arg("routes")
        .assert()
        .success()
        .stdout(predicate::str::contains("/api/books/{id}"))
        .stdout(predicate::str::contains("/api/authors/"))
        .stdout(predicate::str::contains("DELETE"));
}

#[test]
fn migrate_applies_pending_migrations() {
    shelf()
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("applied 6 migrations"));
}
