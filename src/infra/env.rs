//! # Environment Expansion Module / 环境变量展开模块
//!
//! Expands `${VAR}` and `$VAR` references in spec strings against the
//! process environment.
//!
//! 针对进程环境展开配置字符串中的 `${VAR}` 和 `$VAR` 引用。

use std::env::VarError;

/// Expands environment variable references in `text`.
///
/// Both `${NAME}` and `$NAME` forms are supported. A reference to a variable
/// that is not set in the process environment is an error; the spec loader
/// turns it into a load-time failure so a typoed variable name cannot
/// silently reach a model as a literal `$NAME`.
///
/// 展开 `text` 中的环境变量引用。引用未设置的变量是一个错误，
/// 配置加载器会将其转换为加载期失败。
pub fn expand(text: &str) -> Result<String, shellexpand::LookupError<VarError>> {
    shellexpand::env(text).map(|expanded| expanded.into_owned())
}
