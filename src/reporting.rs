//! # Reporting Module / 报告模块
//!
//! This module handles the generation and display of run reports in multiple
//! formats: a colored console summary and an optional standalone HTML file.
//!
//! 此模块处理多种格式的运行报告生成和显示：
//! 彩色控制台摘要和可选的独立 HTML 文件。

pub mod console;
pub mod html;

// Re-export common reporting functions
pub use console::{print_failure_details, print_summary};
pub use html::generate_html_report;
