use std::{env, fs};

use anyhow::{Context, Result};

use super::super::args::InitCommand;
use super::helper::finish;
use super::{CommandKind, CommandResult, CommandSummary, InitSummary};
use crate::config::{CONFIG_FILE_NAME, default_config_json};

pub fn init(cmd: InitCommand) -> Result<CommandResult> {
    let root = match cmd.root {
        Some(root) => root,
        None => env::current_dir().context("Failed to get current directory")?,
    };
    let config_path = root.join(CONFIG_FILE_NAME);

    let error = if config_path.exists() {
        Some(format!("{} already exists", CONFIG_FILE_NAME))
    } else {
        let mut content = default_config_json()?;
        content.push('\n');
        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        None
    };

    Ok(finish(
        CommandKind::Init,
        CommandSummary::Init(InitSummary {
            path: config_path,
            error,
        }),
        Vec::new(),
        0,
        false,
    ))
}
