use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context, Result};
use insta_cmd::get_cargo_bin;
use tempfile::TempDir;

mod check;
mod sync;

const BIN_NAME: &str = "locsync";

/// Flat project translating de -> en -> fr with the mock provider.
pub const MOCK_CONFIG: &str = r#"{
  "localesRoot": "locales",
  "sourceLocale": "de",
  "pivotLocale": "en",
  "targetLocales": ["fr"],
  "layout": "flat",
  "provider": "mock"
}"#;

pub struct CliTest {
    _temp_dir: TempDir,
    project: PathBuf,
}

impl CliTest {
    /// An empty project in a fresh temporary directory.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let project = temp_dir.path().canonicalize()?;
        Ok(Self {
            _temp_dir: temp_dir,
            project,
        })
    }

    /// A mock-provider project with the given source tree.
    pub fn with_source(source: &str) -> Result<Self> {
        let test = Self::new()?;
        test.write_file(".locsyncrc.json", MOCK_CONFIG)?;
        test.write_file("locales/de.json", source)?;
        Ok(test)
    }

    pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let target = self.project.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, content).with_context(|| format!("Failed to write {}", target.display()))
    }

    pub fn root(&self) -> &Path {
        &self.project
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(get_cargo_bin(BIN_NAME));
        cmd.current_dir(&self.project);
        // No inherited provider keys or LOCSYNC_* settings.
        cmd.env_clear();
        cmd.env("NO_COLOR", "1");
        cmd
    }

    pub fn sync_command(&self) -> Command {
        let mut cmd = self.command();
        cmd.arg("sync");
        cmd
    }

    pub fn check_command(&self) -> Command {
        let mut cmd = self.command();
        cmd.arg("check");
        cmd
    }

    pub fn read_file(&self, path: &str) -> Result<String> {
        let target = self.project.join(path);
        fs::read_to_string(&target).with_context(|| format!("Failed to read {}", target.display()))
    }
}
