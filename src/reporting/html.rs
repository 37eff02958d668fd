//! # HTML Reporting Module / HTML 报告模块
//!
//! This module handles the generation of standalone HTML run reports:
//! summary statistics, a detailed per-case table and the per-assertion
//! breakdown, with the stylesheet embedded so the file travels alone.
//!
//! 此模块处理独立 HTML 运行报告的生成：
//! 统计摘要、按用例的详细表格和按断言的明细，样式表内嵌，文件可单独分发。

use anyhow::{Context, Result};
use chrono::Local;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fs;
use std::path::Path;

use crate::core::models::{CaseResult, RunSummary};
use crate::infra::t;

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const REPORT_STYLE: &str = include_str!("assets/report.css");

/// Generates a standalone HTML report from a run summary.
///
/// # Arguments / 参数
/// * `summary` - The aggregated run results / 汇总的运行结果
/// * `output_path` - Where the HTML file is written / HTML 文件的写入位置
/// * `locale` - The locale used for labels / 标签使用的语言区域
pub fn generate_html_report(summary: &RunSummary, output_path: &Path, locale: &str) -> Result<()> {
    let markup = html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (t!("html.title", locale = locale)) }
                style { (PreEscaped(REPORT_STYLE)) }
            }
            body {
                h1 { (t!("html.header", locale = locale)) }
                div.summary-container {
                    (stat_card(summary.total, &t!("html.total", locale = locale), ""))
                    (stat_card(summary.passed, &t!("html.passed", locale = locale), "passed-text"))
                    (stat_card(summary.failed, &t!("html.failed", locale = locale), "failed-text"))
                    (stat_card(summary.skipped, &t!("html.skipped", locale = locale), "skipped-text"))
                }
                p.rate-line {
                    (t!("html.success_rate", locale = locale)) ": "
                    (format!("{:.1}%", summary.success_rate()))
                }
                table {
                    thead {
                        tr {
                            th { (t!("html.col_case", locale = locale)) }
                            th.status-col { (t!("html.col_status", locale = locale)) }
                            th.latency-col { (t!("html.col_latency", locale = locale)) }
                            th { (t!("html.col_assertions", locale = locale)) }
                        }
                    }
                    tbody {
                        @for result in &summary.results {
                            tr class=(status_class(result)) {
                                td { (result.description()) }
                                td.status-col { (result.status_str(locale)) }
                                td.latency-col {
                                    @match result.latency() {
                                        Some(latency) => { (latency.as_millis()) "ms" }
                                        None => { "N/A" }
                                    }
                                }
                                td { (assertion_list(result)) }
                            }
                        }
                    }
                }
                p.timestamp {
                    (t!("html.generated", locale = locale)) " "
                    (Local::now().format("%Y-%m-%d %H:%M:%S"))
                }
            }
        }
    };

    fs::write(output_path, markup.into_string())
        .with_context(|| format!("Failed to write HTML report to {}", output_path.display()))
}

fn stat_card(count: usize, label: &str, class: &str) -> Markup {
    html! {
        div.summary-item {
            span.count.(class) { (count) }
            span.label { (label) }
        }
    }
}

fn assertion_list(result: &CaseResult) -> Markup {
    html! {
        @if let CaseResult::Failed { error: Some(error), .. } = result {
            span.assertion-error { (error) }
        }
        ul.assertions {
            @for assertion in result.assertion_results() {
                li class=(if assertion.passed { "assertion-pass" } else { "assertion-fail" }) {
                    span.kind { "[" (assertion.kind) "] " }
                    (assertion.explanation)
                }
            }
        }
    }
}

fn status_class(result: &CaseResult) -> &'static str {
    match result {
        CaseResult::Passed { .. } => "status-passed",
        CaseResult::Failed { .. } => "status-failed",
        CaseResult::Skipped { .. } => "status-skipped",
    }
}
