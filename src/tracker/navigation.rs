//! Dashboard routes a tracked task leads to.

use crate::config::RoutesConfig;
use std::fmt;

/// A page of the dashboard, identified by task id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Status page of a running task
    TaskView(String),
    /// Result page of a completed task
    ResultView(String),
}

impl Route {
    pub fn task_id(&self) -> &str {
        match self {
            Route::TaskView(id) | Route::ResultView(id) => id,
        }
    }

    /// Path of this route, with the percent-encoded id substituted into the template.
    pub fn path(&self, routes: &RoutesConfig) -> String {
        let template = match self {
            Route::TaskView(_) => &routes.task_view,
            Route::ResultView(_) => &routes.result_view,
        };
        template.replace("{id}", &urlencoding::encode(self.task_id()))
    }

    /// Absolute URL of this route on the dashboard at `base_url`.
    pub fn url(&self, base_url: &str, routes: &RoutesConfig) -> String {
        let path = self.path(routes);
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::TaskView(id) => write!(f, "task view {}", id),
            Route::ResultView(id) => write!(f, "result view {}", id),
        }
    }
}
