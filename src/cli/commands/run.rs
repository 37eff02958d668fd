//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command for the PromptSpec CLI,
//! which executes every test case in a YAML spec and reports the results.
//!
//! 此模块实现了 PromptSpec CLI 的 `run` 命令，
//! 执行 YAML 配置中的所有测试用例并报告结果。

use anyhow::Result;
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        assertions::AssertionEngine,
        execution::{Runner, RunnerOptions},
        spec::load_spec,
    },
    infra::{
        gateway::{Gateway, GatewayConfig, HttpGateway},
        t,
    },
    reporting::{
        console::{print_failure_details, print_summary},
        html::generate_html_report,
    },
};

/// Resolved `run` arguments, filled in by the CLI layer.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub spec: PathBuf,
    pub max_concurrent: usize,
    pub verbose: bool,
    pub judge_model: Option<String>,
    pub call_timeout: Duration,
    pub run_timeout: Option<Duration>,
    pub max_retries: u32,
    pub html: Option<PathBuf>,
}

/// Executes the run command with the provided arguments.
///
/// # Returns
/// The process exit code: 0 when every case passed, 1 when any case failed
/// or was skipped by an abort. Spec-load errors propagate as `SpecError`
/// and are mapped to exit code 2 in `main`.
pub async fn execute(args: RunArgs, locale: &str) -> Result<ExitCode> {
    println!(
        "{}",
        t!("run.loading_spec", locale = locale, path = args.spec.display())
    );
    let cases = load_spec(&args.spec)?;

    let gateway_config = GatewayConfig::from_env(args.judge_model.clone());
    let judge_model = gateway_config.judge_model.clone();
    println!(
        "{}",
        t!("run.judge_model", locale = locale, model = judge_model.yellow())
    );

    let gateway: Arc<dyn Gateway> = Arc::new(HttpGateway::new(gateway_config)?);
    let engine = AssertionEngine::new(gateway.clone(), judge_model, args.call_timeout);
    let options = RunnerOptions {
        max_concurrent: args.max_concurrent,
        max_retries: args.max_retries,
        call_timeout: args.call_timeout,
        run_timeout: args.run_timeout,
    };
    let runner = Runner::new(gateway, engine, options);

    let stop_token = setup_signal_handler(locale);

    println!(
        "{}",
        t!(
            "run.executing",
            locale = locale,
            count = cases.len(),
            jobs = args.max_concurrent
        )
        .bold()
    );

    let summary = runner.run(cases, stop_token).await;

    print_summary(&summary, locale);
    if args.verbose {
        print_failure_details(&summary, locale);
    }

    if let Some(report_path) = &args.html {
        println!(
            "{}",
            t!("run.html_generating", locale = locale, path = report_path.display())
        );
        // A broken report must not change the run's exit code.
        if let Err(e) = generate_html_report(&summary, report_path, locale) {
            eprintln!("{} {e:#}", t!("run.html_failed", locale = locale).red());
        }
    }

    if summary.all_passed() {
        println!("\n{}", t!("run.all_passed", locale = locale).green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("\n{}", t!("run.some_failed", locale = locale).red().bold());
        Ok(ExitCode::from(1))
    }
}

/// Sets up a signal handler for graceful shutdown. Cancelling the token
/// stops admission of new cases; in-flight cases finish on their own.
fn setup_signal_handler(locale: &str) -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    let locale = locale.to_string();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            println!(
                "\n{}",
                t!("run.shutdown_signal", locale = &locale).yellow()
            );
            token_clone.cancel();
        }
    });

    token
}
