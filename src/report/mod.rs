//! Result rendering.
//!
//! Turns a fetched task document into terminal text, Markdown or JSON.

pub mod charts;
pub mod generator;

pub use generator::{generate_json_report, generate_markdown_report, generate_terminal_report};

use crate::config::{OutputFormat, RenderConfig};
use crate::models::Task;
use anyhow::Result;

/// Render a task in the requested format.
pub fn render(task: &Task, format: OutputFormat, config: &RenderConfig) -> Result<String> {
    match format {
        OutputFormat::Terminal => Ok(generate_terminal_report(task, config)),
        OutputFormat::Markdown => Ok(generate_markdown_report(task, config)),
        OutputFormat::Json => generate_json_report(task),
    }
}
