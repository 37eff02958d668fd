//! # Console Reporting Module / 控制台报告模块
//!
//! This module handles the display of run results in the console.
//! It provides functionality for printing colorful, formatted summaries with
//! internationalization support.
//!
//! 此模块处理控制台中运行结果的显示。
//! 它提供打印彩色格式化摘要的功能，支持国际化。

use colored::*;

use crate::core::models::{CaseResult, RunSummary};
use crate::infra::t;

/// Longest output/error excerpt shown in the summary table.
const PREVIEW_LEN: usize = 48;

/// Prints a formatted summary of the run to the console.
/// Displays one row per case with status, description, latency and retry
/// information, followed by a totals line with the success rate.
///
/// 在控制台打印格式化的运行摘要。
/// 每个用例显示一行，包括状态、描述、延迟和重试信息，
/// 最后是带成功率的总计行。
///
/// # Output Format / 输出格式
/// ```text
/// --- Prompt Test Summary ---
///   - Passed       | Replies with a greeting                  |      812ms
///   - Failed       | Returns well-formed JSON                 |     1204ms  [json_valid] output is not valid JSON...
///   - Rate Limited | Stays polite under pressure              |        N/A  (3 retries)
/// ```
pub fn print_summary(summary: &RunSummary, locale: &str) {
    println!("\n{}", t!("report.summary_banner", locale = locale).bold());

    for result in &summary.results {
        let status_str = result.status_str(locale);
        let latency_str = result
            .latency()
            .map(|latency| format!("{}ms", latency.as_millis()))
            .unwrap_or_else(|| "N/A".to_string());

        let retries_str = {
            let retries = result.retries();
            if retries > 0 {
                format!(" ({retries} retries)")
            } else {
                String::new()
            }
        };

        let detail_str = result
            .failure_summary()
            .map(|detail| preview(&detail, PREVIEW_LEN))
            .unwrap_or_default();

        let status_colored = match result {
            CaseResult::Passed { .. } => status_str.green(),
            CaseResult::Failed { .. } => status_str.red(),
            CaseResult::Skipped { .. } => status_str.dimmed(),
        };

        println!(
            "  - {:<14} | {:<40} | {:>10}{} {}",
            status_colored,
            preview(result.description(), 40),
            latency_str,
            retries_str,
            detail_str.dimmed()
        );
    }

    let average_latency_str = summary
        .average_latency()
        .map(|latency| format!("{}ms", latency.as_millis()))
        .unwrap_or_else(|| "N/A".to_string());

    println!(
        "\n{}",
        t!(
            "report.totals",
            locale = locale,
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            rate = format!("{:.1}", summary.success_rate()),
            latency = average_latency_str
        )
    );
}

/// Prints detailed information about every failing case: the failure reason,
/// an excerpt of the model output and each failing assertion's explanation.
/// Called in verbose mode so a CI log shows every violation, not just the
/// first one.
///
/// 打印每个失败用例的详细信息：失败原因、模型输出摘录以及每个失败断言的解释。
/// 在详细模式下调用，这样 CI 日志可以显示所有违规，而不仅仅是第一个。
pub fn print_failure_details(summary: &RunSummary, locale: &str) {
    let failures: Vec<&CaseResult> = summary.results.iter().filter(|r| r.is_failure()).collect();
    if failures.is_empty() {
        return;
    }

    println!(
        "\n{}",
        t!("report.failure_banner", locale = locale).red().bold()
    );
    println!("{}", "-".repeat(80));

    for (i, result) in failures.iter().enumerate() {
        println!(
            "[{}/{}] {} '{}'",
            i + 1,
            failures.len(),
            t!("report.failure_header", locale = locale).red(),
            result.description().cyan()
        );
        println!(
            "  {} {}",
            t!("report.failure_status", locale = locale),
            result.status_str(locale).red()
        );

        if let CaseResult::Failed { error: Some(error), .. } = result {
            println!("  {} {}", t!("report.failure_error", locale = locale), error);
        }

        if let Some(text) = result.response_text() {
            println!(
                "  {} {}",
                t!("report.failure_output", locale = locale),
                preview(text, 200)
            );
        }

        for assertion in result.assertion_results().iter().filter(|a| !a.passed) {
            println!(
                "  {} [{}] {}",
                "✗".red(),
                assertion.kind,
                assertion.explanation
            );
        }

        println!("{}", "-".repeat(80));
    }
}

/// Truncates text to at most `max` characters on a char boundary.
fn preview(text: &str, max: usize) -> String {
    let flattened = text.replace('\n', " ");
    if flattened.chars().count() <= max {
        flattened
    } else {
        let truncated: String = flattened.chars().take(max).collect();
        format!("{truncated}...")
    }
}
