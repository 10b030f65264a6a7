//! Report generation for task results.
//!
//! This module renders a task document and its analysis result as a
//! terminal summary, a Markdown document or pretty-printed JSON.

use crate::config::{ChartKind, RenderConfig};
use crate::models::{AnalysisResult, Task};
use crate::report::charts::{
    bar, format_percent, percent_value, rank_interests, render_category, render_interests, shares,
};
use anyhow::Result;

fn chart_name(kind: ChartKind) -> &'static str {
    match kind {
        ChartKind::Bar => "bar",
        ChartKind::Radar => "radar",
        ChartKind::Doughnut => "doughnut",
    }
}

/// Escape text for a Markdown table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Generate the plain-text terminal view of a task.
pub fn generate_terminal_report(task: &Task, config: &RenderConfig) -> String {
    let mut output = String::new();

    output.push_str(&format!("📋 Task {}", task.id));
    if !task.platform.is_empty() || !task.profile_id.is_empty() {
        output.push_str(&format!(" ({} / {})", task.platform, task.profile_id));
    }
    output.push('\n');
    output.push_str(&format!(
        "   Status: {} {} | Progress: {}\n",
        task.status.emoji(),
        task.status,
        task.progress
    ));
    if let Some(duration) = task.duration_seconds() {
        output.push_str(&format!("   Duration: {:.1}s\n", duration));
    }
    if let Some(ref message) = task.message {
        output.push_str(&format!("   Message: {}\n", message));
    }
    if let Some(ref error) = task.error {
        output.push_str(&format!("   Error: {}\n", error));
    }

    let Some(ref result) = task.result else {
        output.push_str("\n   No result available yet.\n");
        return output;
    };

    if let Some(score) = result.authenticity_score {
        output.push_str(&format!(
            "\n🛡️  Authenticity score: {}  {}\n",
            format_percent(score),
            bar(percent_value(score) as f64 / 100.0, config.bar_width)
        ));
    }

    let categories = result.categories();
    if !categories.is_empty() {
        output.push_str("\n📊 Content analysis\n");
        for category in &categories {
            let kind = config.chart_for(&category.name);
            output.push_str(&format!("\n   {} ({})\n", category.name, chart_name(kind)));
            for line in render_category(category, kind, config.bar_width) {
                output.push_str(&format!("     {}\n", line));
            }
        }
    }

    if !result.predicted_interests.is_empty() {
        output.push_str("\n🎯 Predicted interests\n");
        for line in render_interests(
            &result.predicted_interests,
            config.max_interests,
            config.bar_width,
        ) {
            output.push_str(&format!("   {}\n", line));
        }
    }

    output
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(task: &Task, config: &RenderConfig) -> String {
    let mut output = String::new();

    output.push_str("# Profile Analysis Report\n\n");
    output.push_str(&generate_metadata_section(task));

    match task.result {
        Some(ref result) => {
            output.push_str(&generate_score_section(result));
            output.push_str(&generate_content_section(result, config));
            output.push_str(&generate_interests_section(result, config));
        }
        None => output.push_str("No result is available for this task yet.\n\n"),
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(task: &Task) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Task:** `{}`\n", task.id));
    if !task.platform.is_empty() {
        section.push_str(&format!("- **Platform:** {}\n", task.platform));
    }
    if !task.profile_id.is_empty() {
        section.push_str(&format!("- **Profile:** {}\n", task.profile_id));
    }
    section.push_str(&format!(
        "- **Status:** {} {}\n",
        task.status.emoji(),
        task.status
    ));
    section.push_str(&format!("- **Progress:** {}\n", task.progress));
    if let Some(created) = task.created_at {
        section.push_str(&format!(
            "- **Created:** {}\n",
            created.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    if let Some(completed) = task.completed_at {
        section.push_str(&format!(
            "- **Completed:** {}\n",
            completed.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    if let Some(duration) = task.duration_seconds() {
        section.push_str(&format!("- **Duration:** {:.1}s\n", duration));
    }
    if let Some(ref error) = task.error {
        section.push_str(&format!("- **Error:** {}\n", error));
    }
    section.push('\n');

    section
}

fn generate_score_section(result: &AnalysisResult) -> String {
    let Some(score) = result.authenticity_score else {
        return String::new();
    };

    format!(
        "## Authenticity Score\n\n**{}** `{}`\n\n",
        format_percent(score),
        bar(percent_value(score) as f64 / 100.0, 20)
    )
}

/// Generate one table per analysis category.
fn generate_content_section(result: &AnalysisResult, config: &RenderConfig) -> String {
    let categories = result.categories();
    if categories.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Content Analysis\n\n");

    for category in &categories {
        let kind = config.chart_for(&category.name);
        section.push_str(&format!("### {}\n\n", category.name));

        if category.metrics.is_empty() {
            section.push_str("No data.\n\n");
            continue;
        }

        match kind {
            ChartKind::Doughnut => {
                section.push_str("| Metric | Share |\n");
                section.push_str("|:---|---:|\n");
                for (metric, share) in category.metrics.iter().zip(shares(category)) {
                    section.push_str(&format!(
                        "| {} | {:.1}% |\n",
                        escape_cell(&metric.label),
                        share
                    ));
                }
            }
            ChartKind::Radar => {
                section.push_str("| Metric | Score |\n");
                section.push_str("|:---|---:|\n");
                for metric in &category.metrics {
                    section.push_str(&format!(
                        "| {} | {} |\n",
                        escape_cell(&metric.label),
                        format_percent(metric.value)
                    ));
                }
            }
            ChartKind::Bar => {
                section.push_str("| Metric | Value |\n");
                section.push_str("|:---|---:|\n");
                for metric in &category.metrics {
                    section.push_str(&format!(
                        "| {} | {} |\n",
                        escape_cell(&metric.label),
                        metric.value
                    ));
                }
            }
        }
        section.push('\n');
    }

    section
}

/// Generate the ranked interest table.
fn generate_interests_section(result: &AnalysisResult, config: &RenderConfig) -> String {
    if result.predicted_interests.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Predicted Interests\n\n");
    section.push_str("| # | Interest | Confidence |\n");
    section.push_str("|:---:|:---|---:|\n");

    for (rank, interest) in rank_interests(&result.predicted_interests, config.max_interests)
        .iter()
        .enumerate()
    {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            rank + 1,
            escape_cell(&interest.interest),
            format_percent(interest.confidence)
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by profilewatch*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(task: &Task) -> Result<String> {
    serde_json::to_string_pretty(task).map_err(Into::into)
}
