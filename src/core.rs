//! # Core Module / 核心模块
//!
//! This module contains the core functionality of PromptSpec,
//! including spec loading, data models, the assertion engine and the
//! test runner.
//!
//! 此模块包含 PromptSpec 的核心功能，
//! 包括配置加载、数据模型、断言引擎和测试运行器。

pub mod assertions;
pub mod execution;
pub mod models;
pub mod spec;

// Re-exports
pub use assertions::AssertionEngine;
pub use execution::Runner;
pub use models::RunSummary;
pub use spec::{load_spec, Assertion, SpecError, TestCase};
