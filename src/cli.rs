// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::{env, path::PathBuf, process::ExitCode, time::Duration};

use crate::core::execution::{DEFAULT_CALL_TIMEOUT, DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_RETRIES};
use crate::infra::t;

pub mod commands;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` argument.
fn pre_parse_language() -> String {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        if let Some(lang) = args.get(pos + 1) {
            return lang.clone();
        }
    }
    // Fallback to system language detection
    sys_locale::get_locale().unwrap_or_else(|| "en".to_string())
}

fn build_cli(locale: &str) -> Command {
    Command::new("promptspec")
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli.about", locale = locale).to_string())
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli.arg_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cli.run_about", locale = locale).to_string())
                .arg(
                    Arg::new("spec")
                        .help(t!("cli.arg_spec", locale = locale).to_string())
                        .value_name("SPEC_FILE")
                        .default_value("promptspec.yaml")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("max-concurrent")
                        .short('c')
                        .long("max-concurrent")
                        .help(t!("cli.arg_max_concurrent", locale = locale).to_string())
                        .value_name("N")
                        .default_value("5")
                        .value_parser(clap::value_parser!(usize))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("verbose")
                        .short('v')
                        .long("verbose")
                        .help(t!("cli.arg_verbose", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("judge-model")
                        .short('j')
                        .long("judge-model")
                        .help(t!("cli.arg_judge_model", locale = locale).to_string())
                        .value_name("MODEL")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("timeout-secs")
                        .long("timeout-secs")
                        .help(t!("cli.arg_timeout", locale = locale).to_string())
                        .value_name("SECONDS")
                        .default_value("30")
                        .value_parser(clap::value_parser!(u64))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("run-timeout-secs")
                        .long("run-timeout-secs")
                        .help(t!("cli.arg_run_timeout", locale = locale).to_string())
                        .value_name("SECONDS")
                        .value_parser(clap::value_parser!(u64))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("max-retries")
                        .long("max-retries")
                        .help(t!("cli.arg_max_retries", locale = locale).to_string())
                        .value_name("N")
                        .default_value("3")
                        .value_parser(clap::value_parser!(u32))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("html")
                        .long("html")
                        .help(t!("cli.arg_html", locale = locale).to_string())
                        .value_name("HTML")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cli.init_about", locale = locale).to_string())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help(t!("cli.arg_output", locale = locale).to_string())
                        .value_name("PATH")
                        .default_value("promptspec.yaml")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help(t!("cli.arg_force", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("cli.arg_non_interactive", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("version").about(t!("cli.version_about", locale = locale).to_string()))
}

pub async fn run() -> Result<ExitCode> {
    // Pre-parse language and initialize i18n first.
    let language = pre_parse_language();
    rust_i18n::set_locale(&language);

    let matches = build_cli(&language).get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let args = commands::run::RunArgs {
                spec: run_matches
                    .get_one::<PathBuf>("spec")
                    .cloned()
                    .unwrap_or_else(|| PathBuf::from("promptspec.yaml")),
                max_concurrent: run_matches
                    .get_one::<usize>("max-concurrent")
                    .copied()
                    .unwrap_or(DEFAULT_MAX_CONCURRENT),
                verbose: run_matches.get_flag("verbose"),
                judge_model: run_matches.get_one::<String>("judge-model").cloned(),
                call_timeout: run_matches
                    .get_one::<u64>("timeout-secs")
                    .copied()
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_CALL_TIMEOUT),
                run_timeout: run_matches
                    .get_one::<u64>("run-timeout-secs")
                    .copied()
                    .map(Duration::from_secs),
                max_retries: run_matches
                    .get_one::<u32>("max-retries")
                    .copied()
                    .unwrap_or(DEFAULT_MAX_RETRIES),
                html: run_matches.get_one::<PathBuf>("html").cloned(),
            };
            commands::run::execute(args, &language).await
        }
        Some(("init", init_matches)) => {
            let output = init_matches
                .get_one::<PathBuf>("output")
                .cloned()
                .unwrap_or_else(|| PathBuf::from("promptspec.yaml"));
            let force = init_matches.get_flag("force");
            let non_interactive = init_matches.get_flag("non-interactive");
            commands::init::execute(output, force, non_interactive)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(("version", _)) => {
            println!("promptspec {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            // No subcommand given; clap has already printed help info.
            Ok(ExitCode::SUCCESS)
        }
    }
}
