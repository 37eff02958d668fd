//! # Data Models Module / 数据模型模块
//!
//! This module defines the core data structures used throughout PromptSpec.
//! It includes models for model responses, assertion results, per-case
//! outcomes and the aggregated run summary.
//!
//! 此模块定义了整个 PromptSpec 中使用的核心数据结构。
//! 它包括模型响应、断言结果、单用例结果和汇总的运行摘要。

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::spec::TestCase;
use crate::infra::t;

/// Enumerates the possible reasons for a test case failure.
/// This helps in categorizing errors for reporting and handling.
/// 枚举测试用例失败的可能原因。
/// 这有助于对错误进行分类，以便报告和处理。
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum FailureReason {
    /// The model replied but at least one assertion failed.
    /// 模型有回复，但至少一个断言失败。
    Assertion,
    /// The call exceeded its configured timeout.
    /// 调用超出了其配置的超时时间。
    Timeout,
    /// The provider kept throttling the call until the retry budget ran out.
    /// 提供商持续限流，直到重试次数耗尽。
    RateLimitExhausted,
    /// Any other transport-level failure.
    /// 其他传输层失败。
    Transport,
}

/// The model's reply to a single test case, as observed by the runner.
/// Latency is measured by the runner from dispatch to response; judge calls
/// made later during assertion evaluation do not count towards it.
///
/// 运行器观察到的模型对单个测试用例的回复。
/// 延迟由运行器从发出到响应测量；断言求值期间的裁判调用不计入。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    pub text: String,
    pub latency: Duration,
}

/// The verdict of one assertion against one response, with a human-readable
/// explanation either way. Explanations for failing assertions name what was
/// violated (e.g. which PII category was detected).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionResult {
    /// The spec-facing assertion kind, e.g. `contains`.
    pub kind: String,
    pub passed: bool,
    pub explanation: String,
}

impl AssertionResult {
    pub fn pass(kind: &str, explanation: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            passed: true,
            explanation: explanation.into(),
        }
    }

    pub fn fail(kind: &str, explanation: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            passed: false,
            explanation: explanation.into(),
        }
    }
}

/// Represents the final result of a single test case execution.
///
/// A case passes iff the model call succeeded and every assertion passed.
/// A call failure short-circuits assertion evaluation (there is nothing to
/// assert against) and carries its own `FailureReason`, so reports never
/// conflate "the call broke" with "an assertion failed".
///
/// 表示单个测试用例执行的最终结果。
/// 当且仅当模型调用成功且所有断言都通过时，用例才算通过。
/// 调用失败会跳过断言求值，并携带独立的 `FailureReason`。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CaseResult {
    /// The case passed: the call succeeded and every assertion held.
    /// 用例通过：调用成功且所有断言成立。
    Passed {
        case: TestCase,
        response: ModelResponse,
        /// One result per declared assertion, in declaration order.
        /// 每个声明的断言一个结果，按声明顺序。
        assertions: Vec<AssertionResult>,
        /// The number of rate-limit retries before the call went through.
        /// 调用成功前经历的限流重试次数。
        retries: u32,
    },
    /// The case failed, either on the call itself or on an assertion.
    /// 用例失败，可能是调用本身失败，也可能是断言失败。
    Failed {
        case: TestCase,
        /// Present when the model replied but an assertion failed;
        /// absent when the call itself failed.
        /// 模型有回复但断言失败时存在；调用本身失败时为空。
        response: Option<ModelResponse>,
        assertions: Vec<AssertionResult>,
        reason: FailureReason,
        /// Transport failure detail, when the call itself failed.
        /// 调用本身失败时的传输错误详情。
        error: Option<String>,
        retries: u32,
    },
    /// The case never started because the run was aborted first.
    /// 由于运行先被中止，用例从未开始执行。
    Skipped { case: TestCase },
}

impl CaseResult {
    pub fn case(&self) -> &TestCase {
        match self {
            CaseResult::Passed { case, .. } => case,
            CaseResult::Failed { case, .. } => case,
            CaseResult::Skipped { case } => case,
        }
    }

    /// Gets the description of the test case for display.
    /// 获取测试用例的描述以供显示。
    pub fn description(&self) -> &str {
        &self.case().description
    }

    pub fn passed(&self) -> bool {
        matches!(self, CaseResult::Passed { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CaseResult::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, CaseResult::Skipped { .. })
    }

    /// Gets the measured call latency. Returns None when no reply arrived.
    /// 获取测量的调用延迟。没有回复时返回 None。
    pub fn latency(&self) -> Option<Duration> {
        match self {
            CaseResult::Passed { response, .. } => Some(response.latency),
            CaseResult::Failed { response, .. } => response.as_ref().map(|r| r.latency),
            CaseResult::Skipped { .. } => None,
        }
    }

    /// Gets the number of rate-limit retries recorded for the case.
    /// 获取该用例记录的限流重试次数。
    pub fn retries(&self) -> u32 {
        match self {
            CaseResult::Passed { retries, .. } => *retries,
            CaseResult::Failed { retries, .. } => *retries,
            CaseResult::Skipped { .. } => 0,
        }
    }

    pub fn assertion_results(&self) -> &[AssertionResult] {
        match self {
            CaseResult::Passed { assertions, .. } => assertions,
            CaseResult::Failed { assertions, .. } => assertions,
            CaseResult::Skipped { .. } => &[],
        }
    }

    /// Gets the response text, if a reply arrived.
    pub fn response_text(&self) -> Option<&str> {
        match self {
            CaseResult::Passed { response, .. } => Some(response.text.as_str()),
            CaseResult::Failed { response, .. } => response.as_ref().map(|r| r.text.as_str()),
            CaseResult::Skipped { .. } => None,
        }
    }

    /// Gets the status of the case as a localized string for display.
    /// 以本地化字符串形式获取用例状态以供显示。
    pub fn status_str(&self, locale: &str) -> String {
        match self {
            CaseResult::Passed { .. } => t!("status.passed", locale = locale).to_string(),
            CaseResult::Failed { reason, .. } => match reason {
                FailureReason::Assertion => t!("status.failed", locale = locale).to_string(),
                FailureReason::Timeout => t!("status.timeout", locale = locale).to_string(),
                FailureReason::RateLimitExhausted => {
                    t!("status.rate_limited", locale = locale).to_string()
                }
                FailureReason::Transport => t!("status.transport", locale = locale).to_string(),
            },
            CaseResult::Skipped { .. } => t!("status.skipped", locale = locale).to_string(),
        }
    }

    /// One line summarizing why the case failed, for the report table.
    /// Prefers the transport error, then the first failing assertion.
    pub fn failure_summary(&self) -> Option<String> {
        match self {
            CaseResult::Failed {
                error, assertions, ..
            } => error.clone().or_else(|| {
                assertions
                    .iter()
                    .find(|a| !a.passed)
                    .map(|a| format!("[{}] {}", a.kind, a.explanation))
            }),
            _ => None,
        }
    }
}

/// Aggregated results of a whole run, in the spec's declaration order
/// regardless of completion order.
///
/// 整个运行的汇总结果，无论完成顺序如何，都按配置声明顺序排列。
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub results: Vec<CaseResult>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn from_results(results: Vec<CaseResult>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed()).count();
        let failed = results.iter().filter(|r| r.is_failure()).count();
        let skipped = results.iter().filter(|r| r.is_skipped()).count();
        Self {
            results,
            total,
            passed,
            failed,
            skipped,
        }
    }

    /// Success rate as a percentage of all cases.
    /// 成功率，占所有用例的百分比。
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.passed as f64 / self.total as f64) * 100.0
    }

    /// Mean latency across the cases that actually got a reply.
    /// 实际收到回复的用例的平均延迟。
    pub fn average_latency(&self) -> Option<Duration> {
        let latencies: Vec<Duration> = self.results.iter().filter_map(|r| r.latency()).collect();
        if latencies.is_empty() {
            return None;
        }
        let sum: Duration = latencies.iter().sum();
        Some(sum / latencies.len() as u32)
    }

    /// True when every case passed and none were skipped by an abort;
    /// drives the process exit code.
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }
}
