//! # CLI Commands Module / 命令行命令模块
//!
//! Implements the subcommands exposed by the PromptSpec CLI.
//!
//! 实现 PromptSpec CLI 暴露的子命令。

pub mod init;
pub mod run;
