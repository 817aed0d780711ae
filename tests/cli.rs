//! Binary-level checks that need no running server.

use std::process::Command;

#[test]
fn test_help_works_without_production_secret() {
    let output = Command::new(env!("CARGO_BIN_EXE_idgate"))
        .arg("--help")
        .env("IDGATE_ENV", "production")
        .env_remove("IDGATE_JWT_SECRET")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("serve"));
    assert!(stdout.contains("token"));
}

#[test]
fn test_serve_still_refuses_placeholder_secret_in_production() {
    let output = Command::new(env!("CARGO_BIN_EXE_idgate"))
        .arg("serve")
        .env("IDGATE_ENV", "production")
        .env_remove("IDGATE_JWT_SECRET")
        .output()
        .unwrap();

    assert!(!output.status.success());
}
