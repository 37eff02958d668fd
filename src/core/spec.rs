//! # Spec Loading Module / 配置加载模块
//!
//! This module loads and validates the YAML test spec. Defaults are merged,
//! environment variables are expanded and every assertion is checked here,
//! at load time, so that no malformed test can reach a model call.
//!
//! 此模块加载并验证 YAML 测试配置。默认值合并、环境变量展开和所有断言检查
//! 都在加载期完成，任何畸形的测试都不会到达模型调用。

use serde::{Deserialize, Serialize};
use std::env::VarError;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::assertions::compile_pattern;
use crate::infra::env;

/// Sampling temperature applied when neither the test nor the defaults set one.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Everything that can go wrong while loading a spec. All of these are fatal,
/// surface before any execution, and map to their own process exit code.
///
/// 加载配置时可能出现的所有错误。它们都是致命的，在任何执行之前暴露，
/// 并映射到独立的进程退出码。
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("spec file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read spec file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Malformed YAML, an unknown assertion kind, or a missing required
    /// assertion parameter. serde reports the offending line and column.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
    #[error("spec must declare at least one test")]
    NoTests,
    #[error("test {index} ({description}): assertions list cannot be empty")]
    NoAssertions { index: usize, description: String },
    #[error("test {index} ({description}): no model given and no default model set")]
    MissingModel { index: usize, description: String },
    #[error("test {index} ({description}): invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        index: usize,
        description: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("test {index} ({description}): unresolved environment variable in {field}: {source}")]
    UnresolvedVar {
        index: usize,
        description: String,
        field: &'static str,
        #[source]
        source: shellexpand::LookupError<VarError>,
    },
}

/// A single pass/fail check applied to a model response.
///
/// Each kind carries exactly the parameters it requires; an unknown kind or
/// a missing parameter fails YAML deserialization and therefore the load.
///
/// 应用于模型响应的单个通过/失败检查。
/// 每种断言只携带它所需的参数；未知类型或缺失参数会使 YAML 反序列化失败。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assertion {
    /// Case-insensitive substring match. An empty `value` always passes.
    Contains { value: String },
    /// Regex search over the response text (case-insensitive, multi-line).
    Regex { pattern: String },
    /// The response text must parse as well-formed JSON, exactly as given.
    JsonValid,
    /// The measured call latency must not exceed the threshold (inclusive).
    Latency { threshold_ms: u64 },
    /// LLM-as-a-judge check of a natural-language condition about the text.
    Sentiment { condition: String },
    /// The response must not contain email/phone/SSN/credit-card patterns.
    NoPii,
}

impl Assertion {
    /// The spec-facing name of this assertion kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Assertion::Contains { .. } => "contains",
            Assertion::Regex { .. } => "regex",
            Assertion::JsonValid => "json_valid",
            Assertion::Latency { .. } => "latency",
            Assertion::Sentiment { .. } => "sentiment",
            Assertion::NoPii => "no_pii",
        }
    }
}

/// Global defaults applied to every test unless the test overrides them.
/// Merged at load time; the runner only ever sees fully resolved test cases.
///
/// 应用于每个测试的全局默认值。在加载期合并；运行器只会看到完全解析的测试用例。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub retries: Option<u32>,
}

/// A fully resolved test case: one prompt + model + assertion set, the unit
/// of execution. Immutable once loaded.
///
/// 完全解析的测试用例：一个提示词 + 模型 + 断言集合，是执行的基本单位。
/// 加载后不可变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Human-readable description, used for reporting.
    /// 人类可读的描述，用于报告。
    pub description: String,
    /// The prompt sent to the model, with env references already expanded.
    /// 发送给模型的提示词，环境变量引用已展开。
    pub prompt: String,
    /// Logical model identifier, e.g. `ollama/llama3` or `gpt-4`.
    /// 逻辑模型标识符，例如 `ollama/llama3` 或 `gpt-4`。
    pub model: String,
    /// Sampling temperature for the primary call.
    /// 主调用的采样温度。
    pub temperature: f64,
    /// Optional per-case call timeout, overriding the run default.
    /// 可选的单用例调用超时，覆盖运行默认值。
    pub timeout_secs: Option<u64>,
    /// Optional per-case rate-limit retry budget, overriding the run default.
    /// 可选的单用例限流重试次数，覆盖运行默认值。
    pub retries: Option<u32>,
    /// Ordered assertions evaluated against the response.
    /// 按顺序对响应求值的断言。
    pub assertions: Vec<Assertion>,
}

#[derive(Debug, Deserialize)]
struct RawSpec {
    #[serde(default)]
    defaults: Defaults,
    tests: Vec<RawTestCase>,
}

#[derive(Debug, Deserialize)]
struct RawTestCase {
    description: String,
    prompt: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    retries: Option<u32>,
    assertions: Vec<Assertion>,
}

/// Loads and validates a spec file, returning fully resolved test cases in
/// declaration order.
pub fn load_spec(path: &Path) -> Result<Vec<TestCase>, SpecError> {
    if !path.exists() {
        return Err(SpecError::NotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|source| SpecError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_spec(&text)
}

/// Parses and validates spec text. Split out from [`load_spec`] so tests can
/// exercise validation without touching the filesystem.
pub fn parse_spec(text: &str) -> Result<Vec<TestCase>, SpecError> {
    let raw: RawSpec = serde_yaml_ng::from_str(text)?;
    if raw.tests.is_empty() {
        return Err(SpecError::NoTests);
    }
    let defaults = raw.defaults;
    raw.tests
        .into_iter()
        .enumerate()
        .map(|(i, test)| resolve_test(i + 1, test, &defaults))
        .collect()
}

/// Resolves one raw test against the defaults: merges parameters, expands
/// environment references and validates every assertion.
fn resolve_test(
    index: usize,
    raw: RawTestCase,
    defaults: &Defaults,
) -> Result<TestCase, SpecError> {
    if raw.assertions.is_empty() {
        return Err(SpecError::NoAssertions {
            index,
            description: raw.description,
        });
    }

    let model_raw = match raw.model.or_else(|| defaults.model.clone()) {
        Some(model) => model,
        None => {
            return Err(SpecError::MissingModel {
                index,
                description: raw.description,
            });
        }
    };

    let model = env::expand(&model_raw).map_err(|source| SpecError::UnresolvedVar {
        index,
        description: raw.description.clone(),
        field: "model",
        source,
    })?;
    let prompt = env::expand(&raw.prompt).map_err(|source| SpecError::UnresolvedVar {
        index,
        description: raw.description.clone(),
        field: "prompt",
        source,
    })?;

    for assertion in &raw.assertions {
        if let Assertion::Regex { pattern } = assertion {
            compile_pattern(pattern).map_err(|source| SpecError::InvalidRegex {
                index,
                description: raw.description.clone(),
                pattern: pattern.clone(),
                source,
            })?;
        }
    }

    Ok(TestCase {
        description: raw.description,
        prompt,
        model,
        temperature: raw
            .temperature
            .or(defaults.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE),
        timeout_secs: raw.timeout_secs.or(defaults.timeout_secs),
        retries: raw.retries.or(defaults.retries),
        assertions: raw.assertions,
    })
}
