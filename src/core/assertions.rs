//! # Assertion Engine Module / 断言引擎模块
//!
//! One evaluator per assertion kind, each taking the model's response and the
//! assertion's declared parameters and returning a verdict with an
//! explanation. Evaluators are stateless and pure, except `sentiment`, which
//! performs a judge call through the gateway under its own timeout.
//!
//! 每种断言对应一个求值器，接收模型响应和断言声明的参数，返回带解释的判定。
//! 求值器是无状态的纯函数，唯一例外是 `sentiment`，
//! 它会在自己的超时约束下通过网关发起一次裁判调用。

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;
use std::time::Duration;

use crate::core::models::{AssertionResult, ModelResponse};
use crate::core::spec::Assertion;
use crate::infra::gateway::{Gateway, GatewayError, InvokeRequest};

/// PII categories checked by `no_pii`, with the pattern each one matches.
/// 由 `no_pii` 检查的 PII 类别及各自匹配的模式。
static PII_PATTERNS: Lazy<[(&'static str, Regex); 4]> = Lazy::new(|| {
    [
        (
            "email",
            Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid pattern"),
        ),
        (
            "phone",
            Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").expect("valid pattern"),
        ),
        (
            "ssn",
            Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("valid pattern"),
        ),
        (
            "credit_card",
            Regex::new(r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b").expect("valid pattern"),
        ),
    ]
});

/// Compiles a user-supplied `regex` assertion pattern with the flags the
/// evaluator uses. The spec loader calls this at load time so an invalid
/// pattern fails the load instead of a test.
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
}

/// Evaluates assertions against model responses. Holds the gateway handle and
/// judge parameters needed by `sentiment`; everything else is pure.
pub struct AssertionEngine {
    gateway: Arc<dyn Gateway>,
    judge_model: String,
    judge_timeout: Duration,
}

impl AssertionEngine {
    pub fn new(gateway: Arc<dyn Gateway>, judge_model: String, judge_timeout: Duration) -> Self {
        Self {
            gateway,
            judge_model,
            judge_timeout,
        }
    }

    /// Runs a single assertion against a response.
    ///
    /// Never returns an error: an evaluator problem (including a failed judge
    /// call) is a failing `AssertionResult` with its own explanation, so one
    /// broken assertion can never abort a run.
    ///
    /// 对响应运行单个断言。永远不会返回错误：求值器故障（包括失败的裁判调用）
    /// 表现为带解释的失败结果，因此单个断言故障不会中止运行。
    pub async fn evaluate(&self, assertion: &Assertion, response: &ModelResponse) -> AssertionResult {
        match assertion {
            Assertion::Contains { value } => check_contains(&response.text, value),
            Assertion::Regex { pattern } => check_regex(&response.text, pattern),
            Assertion::JsonValid => check_json_valid(&response.text),
            Assertion::Latency { threshold_ms } => check_latency(response.latency, *threshold_ms),
            Assertion::Sentiment { condition } => {
                self.check_sentiment(&response.text, condition).await
            }
            Assertion::NoPii => check_no_pii(&response.text),
        }
    }

    /// LLM-as-a-judge evaluation of a qualitative condition.
    ///
    /// The judge call runs under its own timeout so a hung judge cannot stall
    /// the run, and its duration is never added to the case latency.
    async fn check_sentiment(&self, text: &str, condition: &str) -> AssertionResult {
        let request = InvokeRequest {
            model: self.judge_model.clone(),
            prompt: judge_prompt(text, condition),
            // Deterministic verdicts: the judge must not get creative.
            temperature: 0.0,
            timeout: self.judge_timeout,
        };

        let outcome = match tokio::time::timeout(self.judge_timeout, self.gateway.invoke(request))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.judge_timeout)),
        };

        match outcome {
            Ok(reply) => {
                let verdict = reply.text.trim().to_uppercase();
                if verdict.contains("YES") {
                    AssertionResult::pass(
                        "sentiment",
                        format!("judge confirmed the output is {condition}"),
                    )
                } else {
                    AssertionResult::fail(
                        "sentiment",
                        format!(
                            "output is not {condition} (judge said: {})",
                            reply.text.trim()
                        ),
                    )
                }
            }
            Err(e) => AssertionResult::fail("sentiment", format!("judge call failed: {e}")),
        }
    }
}

fn judge_prompt(text: &str, condition: &str) -> String {
    format!(
        "Analyze the following text and determine if it has a {condition} tone.\n\n\
         Text: \"{text}\"\n\n\
         Does this text have a {condition} tone? Reply ONLY with 'YES' or 'NO'."
    )
}

fn check_contains(text: &str, value: &str) -> AssertionResult {
    if value.is_empty() {
        return AssertionResult::pass("contains", "empty value matches any output");
    }
    if text.to_lowercase().contains(&value.to_lowercase()) {
        AssertionResult::pass("contains", format!("output contains '{value}'"))
    } else {
        AssertionResult::fail("contains", format!("output does not contain '{value}'"))
    }
}

fn check_regex(text: &str, pattern: &str) -> AssertionResult {
    // Patterns are validated at load time, so a compile failure here means
    // the case was constructed without going through the loader.
    let regex = match compile_pattern(pattern) {
        Ok(regex) => regex,
        Err(e) => {
            return AssertionResult::fail("regex", format!("invalid regex pattern '{pattern}': {e}"));
        }
    };
    if regex.is_match(text) {
        AssertionResult::pass("regex", format!("output matches pattern '{pattern}'"))
    } else {
        AssertionResult::fail("regex", format!("output does not match pattern '{pattern}'"))
    }
}

fn check_json_valid(text: &str) -> AssertionResult {
    // The text is parsed exactly as returned; surrounding prose or stray
    // formatting is the model's failure, not something to strip here.
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(_) => AssertionResult::pass("json_valid", "output is well-formed JSON"),
        Err(e) => AssertionResult::fail("json_valid", format!("output is not valid JSON: {e}")),
    }
}

fn check_latency(latency: Duration, threshold_ms: u64) -> AssertionResult {
    let measured = latency.as_millis();
    if measured <= u128::from(threshold_ms) {
        AssertionResult::pass(
            "latency",
            format!("latency {measured}ms within threshold {threshold_ms}ms"),
        )
    } else {
        AssertionResult::fail(
            "latency",
            format!("latency {measured}ms exceeds threshold {threshold_ms}ms"),
        )
    }
}

fn check_no_pii(text: &str) -> AssertionResult {
    let detected: Vec<&str> = PII_PATTERNS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(text))
        .map(|(category, _)| *category)
        .collect();

    if detected.is_empty() {
        AssertionResult::pass("no_pii", "no PII detected")
    } else {
        AssertionResult::fail("no_pii", format!("PII detected: {}", detected.join(", ")))
    }
}
