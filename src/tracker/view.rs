//! Terminal progress display for a polled task.

use crate::api::ApiError;
use crate::config::RoutesConfig;
use crate::models::{StatusReport, TaskStatus};
use crate::tracker::navigation::Route;
use crate::tracker::poller::PollObserver;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress bar driven by poll updates.
pub struct ProgressView {
    bar: ProgressBar,
    base_url: String,
    routes: RoutesConfig,
}

impl ProgressView {
    /// Create the view; a hidden bar is used when `show` is false.
    pub fn new(base_url: impl Into<String>, routes: RoutesConfig, show: bool) -> Self {
        let bar = if show {
            let pb = ProgressBar::new(100);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        } else {
            ProgressBar::hidden()
        };

        Self {
            bar,
            base_url: base_url.into(),
            routes,
        }
    }

    /// Status label followed by the server message, if any.
    pub fn status_line(report: &StatusReport) -> String {
        match report.message.as_deref().filter(|m| !m.trim().is_empty()) {
            Some(message) => format!("{} {} - {}", report.status.emoji(), report.status, message),
            None => format!("{} {}", report.status.emoji(), report.status),
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn message(&self) -> String {
        self.bar.message()
    }
}

impl PollObserver for ProgressView {
    fn on_update(&mut self, report: &StatusReport) {
        self.bar.set_position(u64::from(report.progress.percent()));
        let line = Self::status_line(report);

        match report.status {
            TaskStatus::Completed => self.bar.finish_with_message(line),
            TaskStatus::Failed | TaskStatus::Cancelled => self.bar.abandon_with_message(line),
            TaskStatus::Pending | TaskStatus::Processing => self.bar.set_message(line),
        }
    }

    fn on_error(&mut self, error: &ApiError) {
        self.bar.abandon_with_message(format!("❌ {}", error));
    }

    fn on_navigate(&mut self, route: &Route) {
        self.bar
            .println(format!("➡️  {}", route.url(&self.base_url, &self.routes)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Progress;

    fn make_report(status: TaskStatus, progress: f64, message: Option<&str>) -> StatusReport {
        StatusReport {
            status,
            progress: Progress::from_raw(progress),
            message: message.map(String::from),
            error: None,
        }
    }

    #[test]
    fn test_status_line() {
        let report = make_report(TaskStatus::Processing, 40.0, Some("Fetching posts"));
        assert_eq!(ProgressView::status_line(&report), "🔄 Processing - Fetching posts");

        let report = make_report(TaskStatus::Pending, 0.0, Some("  "));
        assert_eq!(ProgressView::status_line(&report), "⏳ Pending");
    }

    #[test]
    fn test_update_moves_bar() {
        let mut view = ProgressView::new("http://localhost:5000", RoutesConfig::default(), false);
        view.on_update(&make_report(TaskStatus::Processing, 55.4, Some("Scoring")));

        assert_eq!(view.position(), 55);
        assert_eq!(view.message(), "🔄 Processing - Scoring");
    }

    #[test]
    fn test_error_replaces_message() {
        let mut view = ProgressView::new("http://localhost:5000", RoutesConfig::default(), false);
        view.on_error(&ApiError::Http {
            status: 503,
            message: "worker offline".to_string(),
        });
        assert_eq!(view.message(), "❌ worker offline");
    }
}
