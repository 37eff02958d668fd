//! # Init Command Module / 初始化命令模块
//!
//! This module implements the `init` command for the PromptSpec CLI,
//! which creates a new starter spec file.
//!
//! 此模块实现了 PromptSpec CLI 的 `init` 命令，
//! 用于创建新的入门测试配置文件。

use anyhow::{Context, Result};
use colored::*;
use dialoguer::Confirm;
use std::{fs, path::PathBuf};

use crate::infra::t;

const DEFAULT_SPEC: &str = r#"# PromptSpec test spec / PromptSpec 测试配置
# Run with: promptspec run promptspec.yaml
# Prompts and model names may reference environment variables as ${NAME}.
# 提示词和模型名可以用 ${NAME} 引用环境变量。

# Defaults applied to every test unless overridden / 应用于每个测试的默认值
defaults:
  model: "ollama/llama3"
  temperature: 0.7

tests:
  - description: "Replies with a greeting"
    prompt: "Say hello in one short sentence."
    assertions:
      - type: contains
        value: "hello"
      - type: latency
        threshold_ms: 5000

  - description: "Returns well-formed JSON"
    prompt: "Return a JSON object with keys name and age. Output only the JSON."
    assertions:
      - type: json_valid
      - type: no_pii

  - description: "Stays polite under pressure"
    prompt: "A customer says their order is three weeks late. Write a short reply."
    # Per-test override / 单个测试覆盖
    temperature: 0.2
    assertions:
      - type: sentiment
        condition: "polite"
      - type: regex
        pattern: "(sorry|apolog)"
"#;

/// Executes the init command with the provided arguments.
///
/// # Arguments
/// * `output` - Path for the new spec file
/// * `force` - Whether to overwrite an existing file without asking
/// * `non_interactive` - Never prompt; refuse to overwrite unless forced
pub fn execute(output: PathBuf, force: bool, non_interactive: bool) -> Result<()> {
    if output.exists() && !force {
        if non_interactive {
            println!(
                "{}",
                t!("init.file_exists", path = output.display()).red()
            );
            println!("{}", t!("init.use_force").yellow());
            return Ok(());
        }

        let overwrite = Confirm::new()
            .with_prompt(t!("init.confirm_overwrite", path = output.display()).to_string())
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !overwrite {
            println!("{}", t!("init.aborted").yellow());
            return Ok(());
        }
    }

    // Create parent directories if needed
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).with_context(|| {
                format!(
                    "{}",
                    t!("init.create_parent_dir_failed", path = parent.display())
                )
            })?;
        }
    }

    fs::write(&output, DEFAULT_SPEC)
        .with_context(|| format!("{}", t!("init.write_failed", path = output.display())))?;

    println!("{}", t!("init.success", path = output.display()).green());
    Ok(())
}
