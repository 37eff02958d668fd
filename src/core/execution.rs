//! # Test Execution Engine Module / 测试执行引擎模块
//!
//! This module provides the core functionality for executing prompt test
//! cases. It handles the complete lifecycle from dispatching the model call
//! to assertion evaluation, including timeouts, rate-limit retries and
//! result collection.
//!
//! 此模块为执行提示词测试用例提供核心功能。
//! 它处理从发起模型调用到断言求值的完整生命周期，
//! 包括超时、限流重试和结果收集。

use colored::*;
use futures::{stream, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::assertions::AssertionEngine;
use crate::core::models::{CaseResult, FailureReason, ModelResponse, RunSummary};
use crate::core::spec::TestCase;
use crate::infra::gateway::{Gateway, GatewayError, InvokeRequest};
use crate::infra::t;

/// Default number of concurrently in-flight model calls.
pub const DEFAULT_MAX_CONCURRENT: usize = 5;
/// Default rate-limit retry budget per case.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default per-call timeout.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Knobs for a single run. Everything has a sensible default; the CLI layer
/// overrides from flags.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Strict upper bound on concurrently in-flight gateway calls.
    /// 并发在途网关调用的严格上限。
    pub max_concurrent: usize,
    /// Rate-limit retries per case before giving up.
    /// 每个用例在放弃前的限流重试次数。
    pub max_retries: u32,
    /// Per-call timeout, unless the case overrides it.
    /// 单次调用超时，除非用例覆盖。
    pub call_timeout: Duration,
    /// Optional run-level deadline. When it fires, cases not yet started are
    /// skipped; in-flight cases finish on their own schedule.
    /// 可选的运行级截止时间。触发时，尚未开始的用例被跳过；
    /// 在途用例按自己的节奏结束。
    pub run_timeout: Option<Duration>,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_retries: DEFAULT_MAX_RETRIES,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            run_timeout: None,
        }
    }
}

/// Orchestrates a batch of test cases: fans them out through the gateway
/// with bounded parallelism, applies the assertion engine to each reply and
/// aggregates the per-case outcomes into a [`RunSummary`].
pub struct Runner {
    gateway: Arc<dyn Gateway>,
    engine: AssertionEngine,
    options: RunnerOptions,
}

impl Runner {
    pub fn new(gateway: Arc<dyn Gateway>, engine: AssertionEngine, options: RunnerOptions) -> Self {
        Self {
            gateway,
            engine,
            options,
        }
    }

    /// Executes all cases and returns the aggregated summary.
    ///
    /// Cases are scheduled across a bounded pool of at most `max_concurrent`
    /// in-flight executions; completion order is unconstrained, but the
    /// summary preserves the spec's declaration order. Each case's result is
    /// written exactly once, by the task that produced it — the only shared
    /// state is the collected result set.
    ///
    /// Cancelling `stop_token` (Ctrl-C, or the run timeout) stops admission:
    /// cases that have not started yet complete as `Skipped`, while cases
    /// already in flight finish or time out on their own schedule. One case's
    /// failure never aborts its siblings.
    ///
    /// 执行所有用例并返回汇总结果。用例在至多 `max_concurrent` 个在途执行的
    /// 有界池中调度；完成顺序不受约束，但摘要保持配置的声明顺序。
    /// 取消 `stop_token` 会停止准入：尚未开始的用例记为 `Skipped`，
    /// 在途用例按自己的节奏结束。单个用例的失败永远不会中止其兄弟用例。
    pub async fn run(&self, cases: Vec<TestCase>, stop_token: CancellationToken) -> RunSummary {
        if let Some(deadline) = self.options.run_timeout {
            let token = stop_token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                token.cancel();
            });
        }

        let mut indexed: Vec<(usize, CaseResult)> = stream::iter(cases.into_iter().enumerate())
            .map(|(index, case)| {
                let stop_token = stop_token.clone();
                async move {
                    // Admission check: a cancelled run skips everything that
                    // has not started yet.
                    if stop_token.is_cancelled() {
                        println!("{}", t!("run.case_skipped", name = &case.description).dimmed());
                        return (index, CaseResult::Skipped { case });
                    }
                    (index, self.run_case(case).await)
                }
            })
            .buffer_unordered(self.options.max_concurrent.max(1))
            .collect()
            .await;

        // Completion order is arbitrary; reports must follow spec order.
        indexed.sort_by_key(|(index, _)| *index);
        RunSummary::from_results(indexed.into_iter().map(|(_, result)| result).collect())
    }

    /// Runs one case: dispatch under a per-call timeout, retry on rate
    /// limiting with exponential backoff, then evaluate assertions.
    ///
    /// The backoff sleep holds only this case's pool slot; sibling cases keep
    /// executing within the remaining capacity.
    async fn run_case(&self, case: TestCase) -> CaseResult {
        let timeout = case
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.options.call_timeout);
        let max_retries = case.retries.unwrap_or(self.options.max_retries);
        let mut backoff = INITIAL_BACKOFF;
        let mut attempt: u32 = 0;

        loop {
            let request = InvokeRequest {
                model: case.model.clone(),
                prompt: case.prompt.clone(),
                temperature: case.temperature,
                timeout,
            };

            let started = Instant::now();
            let outcome = match tokio::time::timeout(timeout, self.gateway.invoke(request)).await {
                Ok(result) => result,
                Err(_) => Err(GatewayError::Timeout(timeout)),
            };
            let latency = started.elapsed();

            match outcome {
                Ok(reply) => {
                    let response = ModelResponse {
                        text: reply.text,
                        latency,
                    };
                    if attempt > 0 {
                        println!(
                            "{}",
                            t!(
                                "run.case_recovered",
                                name = &case.description,
                                retries = attempt
                            )
                            .yellow()
                        );
                    }
                    return self.evaluate_case(case, response, attempt).await;
                }
                Err(GatewayError::RateLimited(detail)) => {
                    if attempt >= max_retries {
                        println!(
                            "{}",
                            t!(
                                "run.rate_limit_exhausted",
                                name = &case.description,
                                retries = max_retries
                            )
                            .red()
                        );
                        return CaseResult::Failed {
                            case,
                            response: None,
                            assertions: Vec::new(),
                            reason: FailureReason::RateLimitExhausted,
                            error: Some(detail),
                            retries: attempt,
                        };
                    }
                    attempt += 1;
                    println!(
                        "{}",
                        t!(
                            "run.case_retrying",
                            name = &case.description,
                            attempt = attempt,
                            backoff = backoff.as_secs()
                        )
                        .yellow()
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2).min(MAX_BACKOFF);
                }
                Err(GatewayError::Timeout(after)) => {
                    println!(
                        "{}",
                        t!(
                            "run.case_timeout",
                            name = &case.description,
                            timeout = after.as_millis()
                        )
                        .red()
                    );
                    return CaseResult::Failed {
                        case,
                        response: None,
                        assertions: Vec::new(),
                        reason: FailureReason::Timeout,
                        error: Some(format!("call timed out after {}ms", after.as_millis())),
                        retries: attempt,
                    };
                }
                Err(error @ GatewayError::Other(_)) => {
                    println!(
                        "{}",
                        t!("run.case_call_failed", name = &case.description).red()
                    );
                    return CaseResult::Failed {
                        case,
                        response: None,
                        assertions: Vec::new(),
                        reason: FailureReason::Transport,
                        error: Some(error.to_string()),
                        retries: attempt,
                    };
                }
            }
        }
    }

    /// Evaluates every assertion against the reply and AND-reduces the
    /// verdicts. All assertions run even after one fails, so the report can
    /// show every violation at once.
    async fn evaluate_case(
        &self,
        case: TestCase,
        response: ModelResponse,
        retries: u32,
    ) -> CaseResult {
        let mut assertions = Vec::with_capacity(case.assertions.len());
        let mut all_passed = true;

        for assertion in &case.assertions {
            let result = self.engine.evaluate(assertion, &response).await;
            all_passed &= result.passed;
            assertions.push(result);
        }

        if all_passed {
            println!(
                "{}",
                t!(
                    "run.case_passed",
                    name = &case.description,
                    latency = response.latency.as_millis()
                )
                .green()
            );
            CaseResult::Passed {
                case,
                response,
                assertions,
                retries,
            }
        } else {
            println!("{}", t!("run.case_failed", name = &case.description).red());
            CaseResult::Failed {
                case,
                response: Some(response),
                assertions,
                reason: FailureReason::Assertion,
                error: None,
                retries,
            }
        }
    }
}
