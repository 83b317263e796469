use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

// Orchestrator scenarios over mock sources
mod integration;

const ALL_SOURCES: &str = "APT,Flatpak,Snap,AppImage,Pacman,DNF";

/// A command isolated from the user's config, with every source switched off.
fn orbit(home: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("orbit"));
    cmd.env("HOME", home.path())
        .env("ORBIT_DISABLED_SOURCES", ALL_SOURCES)
        .env("ORBIT_BACKUP_LOCATION", home.path().join("backups"))
        .arg("--config")
        .arg(home.path().join("config.toml"));
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("orbit"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("update-all"))
        .stdout(predicate::str::contains("doctor"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("orbit"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("orbit"));
}

#[test]
fn test_completions_bash() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("orbit"));
    cmd.args(["completions", "bash"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("_orbit"))
        .stdout(predicate::str::contains("complete"));
}

#[test]
fn test_completions_zsh() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("orbit"));
    cmd.args(["completions", "zsh"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("#compdef orbit"));
}

#[test]
fn test_unknown_source_is_rejected() {
    let home = TempDir::new().unwrap();
    orbit(&home)
        .args(["search", "vim", "--source", "homebrew"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown source"));
}

#[test]
fn test_config_prints_effective_settings() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("config.toml"), "privilege_command = \"doas\"\n").unwrap();

    orbit(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("privilege_command: doas"))
        .stdout(predicate::str::contains("- Flatpak"));
}

#[test]
fn test_invalid_config_fails() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("config.toml"), "privilege_command = \"\"\n").unwrap();

    orbit(&home)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_doctor_with_every_source_disabled() {
    let home = TempDir::new().unwrap();
    orbit(&home)
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("No sources are enabled."));
}

#[test]
fn test_stats_json_with_no_sources() {
    let home = TempDir::new().unwrap();
    orbit(&home)
        .args(["stats", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total\": 0"))
        .stdout(predicate::str::contains("\"conflicts\": 0"));
}

#[test]
fn test_list_with_no_sources() {
    let home = TempDir::new().unwrap();
    orbit(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No packages found."));
}

#[test]
fn test_install_on_disabled_source_fails() {
    let home = TempDir::new().unwrap();
    orbit(&home)
        .args(["install", "vim", "--source", "apt"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("APT is not enabled."));
}

#[test]
fn test_backup_export_then_list() {
    let home = TempDir::new().unwrap();
    orbit(&home)
        .args(["backup", "export"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Backed up 0 packages to"));

    orbit(&home)
        .args(["backup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("orbit_backup_"));
}

#[test]
fn test_backup_list_empty() {
    let home = TempDir::new().unwrap();
    orbit(&home)
        .args(["backup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No backups in"));
}

#[test]
fn test_install_defaults_to_preferred_source() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("config.toml"), "preferred_source = \"Snap\"\n").unwrap();

    orbit(&home)
        .args(["install", "vlc"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Snap is not enabled."));
}
