//! Plain-text charts for analysis categories and predicted interests.

use crate::config::ChartKind;
use crate::models::{CategoryScores, PredictedInterest};

const FILLED: char = '█';
const EMPTY: char = '░';

/// Integer percentage of a score: values in `0..=1` are fractions,
/// larger values are already percentages. Always within `0..=100`.
pub fn percent_value(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    let scaled = if (0.0..=1.0).contains(&value) {
        value * 100.0
    } else {
        value
    };
    scaled.round().clamp(0.0, 100.0) as u8
}

/// Format a score as `NN%`.
pub fn format_percent(value: f64) -> String {
    format!("{}%", percent_value(value))
}

/// A bar of `width` cells, filled to `fraction` (clamped to `0..=1`).
pub fn bar(fraction: f64, width: usize) -> String {
    let fraction = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    let filled = (fraction * width as f64).round() as usize;
    let mut out = String::with_capacity(width * 3);
    out.extend(std::iter::repeat(FILLED).take(filled));
    out.extend(std::iter::repeat(EMPTY).take(width - filled));
    out
}

/// Share of each metric in the category total, as percentages.
pub fn shares(category: &CategoryScores) -> Vec<f64> {
    let total: f64 = category.metrics.iter().map(|m| m.value.max(0.0)).sum();
    category
        .metrics
        .iter()
        .map(|m| {
            if total > 0.0 {
                m.value.max(0.0) / total * 100.0
            } else {
                0.0
            }
        })
        .collect()
}

fn label_width<'a>(labels: impl Iterator<Item = &'a str>) -> usize {
    labels.map(|l| l.chars().count()).max().unwrap_or(0)
}

/// Render one category with the given chart kind, one line per metric.
pub fn render_category(category: &CategoryScores, kind: ChartKind, width: usize) -> Vec<String> {
    if category.metrics.is_empty() {
        return vec!["no data".to_string()];
    }

    let pad = label_width(category.metrics.iter().map(|m| m.label.as_str()));

    match kind {
        ChartKind::Bar => {
            let max = category
                .metrics
                .iter()
                .map(|m| m.value)
                .fold(0.0_f64, f64::max);
            category
                .metrics
                .iter()
                .map(|m| {
                    let fraction = if max > 0.0 { m.value / max } else { 0.0 };
                    format!("{:<pad$}  {}  {}", m.label, bar(fraction, width), m.value)
                })
                .collect()
        }
        ChartKind::Radar => category
            .metrics
            .iter()
            .map(|m| {
                let pct = percent_value(m.value);
                format!(
                    "{:<pad$}  {}  {:>3}%",
                    m.label,
                    bar(pct as f64 / 100.0, width),
                    pct
                )
            })
            .collect(),
        ChartKind::Doughnut => category
            .metrics
            .iter()
            .zip(shares(category))
            .map(|(m, share)| {
                format!(
                    "{:<pad$}  {}  {:>5.1}%",
                    m.label,
                    bar(share / 100.0, width),
                    share
                )
            })
            .collect(),
    }
}

/// Interests by descending confidence, ties in input order, at most `max`.
pub fn rank_interests(interests: &[PredictedInterest], max: usize) -> Vec<&PredictedInterest> {
    let mut ranked: Vec<&PredictedInterest> = interests.iter().collect();
    ranked.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(max);
    ranked
}

/// Ranked interest list with confidence bars.
pub fn render_interests(interests: &[PredictedInterest], max: usize, width: usize) -> Vec<String> {
    let ranked = rank_interests(interests, max);
    let pad = label_width(ranked.iter().map(|i| i.interest.as_str()));

    ranked
        .iter()
        .enumerate()
        .map(|(rank, interest)| {
            let pct = percent_value(interest.confidence);
            format!(
                "{:>2}. {:<pad$}  {}  {:>3}%",
                rank + 1,
                interest.interest,
                bar(pct as f64 / 100.0, width),
                pct
            )
        })
        .collect()
}
