//! Runs the `pantry` binary for the commands that need no database.

use std::process::Command;

fn pantry(config_home: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pantry"));
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("PANTRY_DATABASE_URL")
        .env_remove("PANTRY_OWNER")
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn init_writes_config_and_refuses_to_overwrite() {
    let tmp = tempfile::TempDir::new().unwrap();

    let out = pantry(tmp.path())
        .args(["init", "--db-url", "postgresql://db:5432/pantry", "--owner-id", "alice"])
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let path = tmp.path().join("pantry").join("config.toml");
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("postgresql://db:5432/pantry"));
    assert!(text.contains("alice"));
    assert!(text.contains("[suggest]"));

    let again = pantry(tmp.path()).arg("init").output().unwrap();
    assert!(!again.status.success());
    assert!(String::from_utf8_lossy(&again.stderr).contains("--force"));

    let forced = pantry(tmp.path())
        .args(["init", "--force", "--owner-id", "bob"])
        .output()
        .unwrap();
    assert!(forced.status.success());
    assert!(std::fs::read_to_string(&path).unwrap().contains("bob"));
}

#[test]
fn help_lists_every_command() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = pantry(tmp.path()).arg("--help").output().unwrap();
    assert!(out.status.success());
    let help = String::from_utf8_lossy(&out.stdout);
    for cmd in ["init", "db-init", "item", "seed", "eat", "log", "report", "plan"] {
        assert!(help.contains(cmd), "missing {cmd} in:\n{help}");
    }
}

#[test]
fn malformed_config_file_is_reported() {
    let tmp = tempfile::TempDir::new().unwrap();
    let dir = tmp.path().join("pantry");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "this is not toml [").unwrap();

    let out = pantry(tmp.path()).args(["item", "list"]).output().unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("failed to parse config file"));
}
