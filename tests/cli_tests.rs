use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

/// The `version` subcommand prints the crate version and exits successfully.
///
/// `version` 子命令打印 crate 版本并成功退出。
#[test]
fn test_version_subcommand() {
    let mut cmd = Command::cargo_bin("promptspec").unwrap();
    cmd.arg("version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("promptspec"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

/// A missing spec file is a spec-load error: exit code 2, nothing executed.
///
/// 缺失的配置文件属于加载错误：退出码 2，不执行任何测试。
#[test]
fn test_missing_spec_file_exits_with_spec_error_code() {
    let mut cmd = Command::cargo_bin("promptspec").unwrap();
    cmd.arg("run")
        .arg("tests/fixtures/definitely_not_there.yaml")
        .arg("--lang")
        .arg("en");

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("Spec error:"))
        .stderr(predicate::str::contains("not found"));
}

/// Malformed YAML is reported before any model call, with exit code 2.
///
/// 畸形的 YAML 在任何模型调用之前被报告，退出码为 2。
#[test]
fn test_malformed_yaml_exits_with_spec_error_code() {
    let mut cmd = Command::cargo_bin("promptspec").unwrap();
    cmd.arg("run")
        .arg("tests/fixtures/invalid.yaml")
        .arg("--lang")
        .arg("en");

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("Spec error:"));
}

#[test]
fn test_unknown_assertion_kind_exits_with_spec_error_code() {
    let mut cmd = Command::cargo_bin("promptspec").unwrap();
    cmd.arg("run")
        .arg("tests/fixtures/unknown_assertion.yaml")
        .arg("--lang")
        .arg("en");

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("word_count"));
}

#[test]
fn test_invalid_regex_exits_with_spec_error_code() {
    let mut cmd = Command::cargo_bin("promptspec").unwrap();
    cmd.arg("run")
        .arg("tests/fixtures/bad_regex.yaml")
        .arg("--lang")
        .arg("en");

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("invalid regex pattern"));
}

#[test]
fn test_unresolved_env_var_exits_with_spec_error_code() {
    let mut cmd = Command::cargo_bin("promptspec").unwrap();
    cmd.arg("run")
        .arg("tests/fixtures/unresolved_env.yaml")
        .arg("--lang")
        .arg("en");

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("unresolved environment variable"));
}

/// `init` scaffolds a runnable starter spec.
///
/// `init` 生成一个可直接运行的入门配置。
#[test]
fn test_init_creates_starter_spec() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("promptspec.yaml");

    let mut cmd = Command::cargo_bin("promptspec").unwrap();
    cmd.arg("init")
        .arg("--output")
        .arg(&output)
        .arg("--non-interactive")
        .arg("--lang")
        .arg("en");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Created starter spec"));

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("tests:"));
    assert!(written.contains("assertions:"));
}

/// Without `--force`, `init` refuses to clobber an existing file in
/// non-interactive mode.
#[test]
fn test_init_refuses_to_overwrite_without_force() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("promptspec.yaml");
    std::fs::write(&output, "keep me\n").unwrap();

    let mut cmd = Command::cargo_bin("promptspec").unwrap();
    cmd.arg("init")
        .arg("--output")
        .arg(&output)
        .arg("--non-interactive")
        .arg("--lang")
        .arg("en");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    assert_eq!(std::fs::read_to_string(&output).unwrap(), "keep me\n");
}

#[test]
fn test_init_force_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("promptspec.yaml");
    std::fs::write(&output, "old contents\n").unwrap();

    let mut cmd = Command::cargo_bin("promptspec").unwrap();
    cmd.arg("init")
        .arg("--output")
        .arg(&output)
        .arg("--force")
        .arg("--non-interactive")
        .arg("--lang")
        .arg("en");

    cmd.assert().success();
    assert!(std::fs::read_to_string(&output).unwrap().contains("tests:"));
}
