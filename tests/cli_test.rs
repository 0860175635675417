use assert_fs::prelude::*;
use predicates::prelude::*;

const CREDENTIAL_VARS: &[&str] = &[
    "GOOGLE_ACCESS_TOKEN",
    "GOOGLE_SERVICE_ACCOUNT_KEY",
    "GOOGLE_SERVICE_ACCOUNT_JSON",
    "OPENAI_API_KEY",
    "SUMMARIZER_PROVIDER",
];

fn command() -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_drive_knowledge_base"));
    for var in CREDENTIAL_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[tokio::test]
async fn test_missing_credentials_fails_without_output() {
    let temp = assert_fs::TempDir::new().unwrap();
    let output = temp.child("kb.md");

    let result = command()
        .arg("-o")
        .arg(output.path())
        .output()
        .await
        .unwrap();

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(
        stderr.contains("Failed to authenticate to Google Drive"),
        "unexpected stderr: {}",
        stderr
    );
    output.assert(predicate::path::missing());
}

#[tokio::test]
async fn test_unreadable_service_account_key_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let output = temp.child("kb.md");

    let status = command()
        .arg("-o")
        .arg(output.path())
        .arg("-c")
        .arg(temp.path().join("missing-key.json"))
        .status()
        .await
        .unwrap();

    assert!(!status.success());
    output.assert(predicate::path::missing());
}

#[tokio::test]
async fn test_missing_openai_key_fails_before_walking() {
    let temp = assert_fs::TempDir::new().unwrap();
    let output = temp.child("kb.md");

    let result = command()
        .env("GOOGLE_ACCESS_TOKEN", "test-token")
        .env("DRIVE_API_BASE", "http://127.0.0.1:9")
        .arg("-o")
        .arg(output.path())
        .arg("--provider")
        .arg("openai")
        .output()
        .await
        .unwrap();

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("Failed to set up summarizer"), "unexpected stderr: {}", stderr);
    output.assert(predicate::path::missing());
}

#[tokio::test]
async fn test_invalid_provider_is_rejected() {
    let status = command()
        .arg("--provider")
        .arg("carrier-pigeon")
        .status()
        .await
        .unwrap();

    assert!(!status.success());
}
