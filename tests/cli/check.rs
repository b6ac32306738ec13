use anyhow::Result;

use crate::CliTest;

const SOURCE: &str = r#"{"nav": {"home": "Startseite", "back": "Zurück"}}"#;

#[test]
fn test_check_reports_pending_work() -> Result<()> {
    let test = CliTest::with_source(SOURCE)?;

    let output = test.check_command().output()?;
    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(output.status.code(), Some(1), "stdout: {}", stdout);
    assert!(stdout.contains("en \u{2190} de"));
    assert!(stdout.contains("2 pending"));
    assert!(stdout.contains("locsync sync"));
    assert!(!test.root().join("locales/en.json").exists());

    Ok(())
}

#[test]
fn test_check_passes_after_sync() -> Result<()> {
    let test = CliTest::with_source(SOURCE)?;
    assert!(test.sync_command().status()?.success());

    let output = test.check_command().output()?;
    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout);
    assert!(stdout.contains("All locales are up to date"));

    Ok(())
}

#[test]
fn test_check_detects_source_edit() -> Result<()> {
    let test = CliTest::with_source(SOURCE)?;
    assert!(test.sync_command().status()?.success());
    test.write_file(
        "locales/de.json",
        r#"{"nav": {"home": "Start", "back": "Zurück"}}"#,
    )?;

    let output = test.check_command().output()?;
    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("1 pending"));

    Ok(())
}

#[test]
fn test_check_full_marks_everything_pending() -> Result<()> {
    let test = CliTest::with_source(SOURCE)?;
    assert!(test.sync_command().status()?.success());

    let output = test.check_command().arg("--full").output()?;
    assert_eq!(output.status.code(), Some(1));

    Ok(())
}
