use anyhow::Result;
use pretty_assertions::assert_eq;

use crate::CliTest;

const SOURCE: &str = r#"{
  "greeting": {
    "hello": "Hallo {{name}}"
  },
  "brand_original": "Acme"
}"#;

#[test]
fn test_sync_cascades_through_pivot() -> Result<()> {
    let test = CliTest::with_source(SOURCE)?;

    let output = test.sync_command().output()?;
    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout);
    assert!(stdout.contains("Synced 2 languages, 2 leaves translated"));

    assert_eq!(
        test.read_file("locales/en.json")?,
        "{\n  \"greeting\": {\n    \"hello\": \"[en] Hallo {{name}}\"\n  },\n  \"brand_original\": \"Acme\"\n}\n"
    );
    assert_eq!(
        test.read_file("locales/fr.json")?,
        "{\n  \"greeting\": {\n    \"hello\": \"[fr] [en] Hallo {{name}}\"\n  },\n  \"brand_original\": \"Acme\"\n}\n"
    );
    assert!(test.root().join("locales/.i18n_manifest/en.from-de.json").exists());
    assert!(test.root().join("locales/.i18n_manifest/fr.from-en.json").exists());
    assert!(test.root().join("locales/.i18n_snapshot/de.json").exists());

    Ok(())
}

#[test]
fn test_second_sync_is_idempotent() -> Result<()> {
    let test = CliTest::with_source(SOURCE)?;
    assert!(test.sync_command().status()?.success());
    let en = test.read_file("locales/en.json")?;
    let fr = test.read_file("locales/fr.json")?;

    let output = test.sync_command().output()?;
    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout.contains("0 leaves translated"));
    assert_eq!(test.read_file("locales/en.json")?, en);
    assert_eq!(test.read_file("locales/fr.json")?, fr);

    Ok(())
}

#[test]
fn test_human_edit_of_pivot_reaches_targets() -> Result<()> {
    let test = CliTest::with_source(SOURCE)?;
    assert!(test.sync_command().status()?.success());

    test.write_file(
        "locales/en.json",
        "{\n  \"greeting\": {\n    \"hello\": \"Hi {{name}}\"\n  },\n  \"brand_original\": \"Acme\"\n}\n",
    )?;
    assert!(test.sync_command().status()?.success());

    assert!(test.read_file("locales/en.json")?.contains("\"Hi {{name}}\""));
    assert!(test.read_file("locales/fr.json")?.contains("\"[fr] Hi {{name}}\""));

    Ok(())
}

#[test]
fn test_force_retranslates_edited_pivot_leaf() -> Result<()> {
    let test = CliTest::with_source(SOURCE)?;
    assert!(test.sync_command().status()?.success());
    test.write_file(
        "locales/en.json",
        "{\n  \"greeting\": {\n    \"hello\": \"Hi {{name}}\"\n  },\n  \"brand_original\": \"Acme\"\n}\n",
    )?;

    let status = test
        .sync_command()
        .args(["--force", "greeting"])
        .status()?;
    assert!(status.success());

    assert!(
        test.read_file("locales/en.json")?
            .contains("\"[en] Hallo {{name}}\"")
    );

    Ok(())
}

#[test]
fn test_dry_run_writes_nothing() -> Result<()> {
    let test = CliTest::with_source(SOURCE)?;

    let output = test.sync_command().arg("--dry-run").output()?;
    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout.contains("pending"));
    assert!(!test.root().join("locales/en.json").exists());
    assert!(!test.root().join("locales/.i18n_manifest").exists());
    assert!(!test.root().join("locales/.i18n_snapshot").exists());

    Ok(())
}

#[test]
fn test_locale_filter_limits_targets() -> Result<()> {
    let test = CliTest::with_source(SOURCE)?;

    let status = test
        .sync_command()
        .args(["--locale", "es"])
        .status()?;
    assert!(status.success());
    assert!(test.root().join("locales/en.json").exists());
    assert!(!test.root().join("locales/fr.json").exists());

    Ok(())
}

#[test]
fn test_missing_source_is_fatal() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(".locsyncrc.json", crate::MOCK_CONFIG)?;

    let output = test.sync_command().output()?;
    let stderr = String::from_utf8(output.stderr)?;
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("Source locale 'de' not found"));

    Ok(())
}

#[test]
fn test_missing_credentials_abort_before_writing() -> Result<()> {
    let test = CliTest::with_source(SOURCE)?;

    let output = test
        .sync_command()
        .args(["--provider", "openai"])
        .output()?;
    let stderr = String::from_utf8(output.stderr)?;
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("Failed to configure provider 'openai'"));
    assert!(stderr.contains("OPENAI_API_KEY"));
    assert!(!test.root().join("locales/en.json").exists());

    Ok(())
}

#[test]
fn test_provider_from_environment() -> Result<()> {
    let test = CliTest::with_source(SOURCE)?;
    test.write_file(
        ".locsyncrc.json",
        r#"{"localesRoot": "locales", "layout": "flat", "targetLocales": ["fr"]}"#,
    )?;

    let status = test
        .sync_command()
        .env("LOCSYNC_PROVIDER", "mock")
        .status()?;
    assert!(status.success());
    assert!(test.read_file("locales/en.json")?.contains("[en] Hallo"));

    Ok(())
}

#[test]
fn test_invalid_config_is_fatal() -> Result<()> {
    let test = CliTest::with_source(SOURCE)?;
    test.write_file(
        ".locsyncrc.json",
        r#"{"localesRoot": "locales", "provider": "mock", "pivotLocale": "de"}"#,
    )?;

    let output = test.sync_command().output()?;
    let stderr = String::from_utf8(output.stderr)?;
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("pivotLocale"));

    Ok(())
}
