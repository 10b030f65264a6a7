//! Task status polling.
//!
//! [`TaskPoller`] requests a task's status at a fixed interval while its
//! [`PollingFlag`] is set, forwards every accepted report to a
//! [`PollObserver`] and stops for good once a terminal state is seen.
//! Exactly one status request is outstanding at a time: each response is
//! awaited before the delay to the next one starts.

use crate::api::{ApiError, TaskApi};
use crate::models::{StatusReport, TaskStatus};
use crate::tracker::navigation::Route;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default delay between two status requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Session-scoped switch that keeps a poller running.
///
/// Clones share the same switch. The poller only checks it between
/// iterations, so clearing it never aborts a request already in flight.
#[derive(Debug, Clone)]
pub struct PollingFlag(Arc<AtomicBool>);

impl PollingFlag {
    /// A new, active flag.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Default for PollingFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives what the poller observes, in order.
pub trait PollObserver {
    /// An accepted status report (progress, status label, message).
    fn on_update(&mut self, report: &StatusReport);

    /// A failure that ended polling.
    fn on_error(&mut self, error: &ApiError);

    /// The task completed and its result page should be shown.
    fn on_navigate(&mut self, route: &Route);
}

/// How a polling session ended, short of an error.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The task completed; `route` is the result view to move to.
    Completed { route: Route, report: StatusReport },
    /// The task was cancelled.
    Cancelled { report: StatusReport },
    /// The polling flag was cleared before a terminal state was seen.
    Stopped { last: Option<StatusReport> },
}

impl PollOutcome {
    /// Process exit code: 0 once completed, 3 when the task did not finish.
    pub fn exit_code(&self) -> i32 {
        match self {
            PollOutcome::Completed { .. } => 0,
            PollOutcome::Cancelled { .. } | PollOutcome::Stopped { .. } => 3,
        }
    }
}

/// Polls one task until it reaches a terminal state or the flag is cleared.
pub struct TaskPoller<A, O> {
    api: A,
    observer: O,
    task_id: String,
    flag: PollingFlag,
    interval: Duration,
    last: Option<StatusReport>,
    finished: bool,
}

impl<A: TaskApi, O: PollObserver> TaskPoller<A, O> {
    pub fn new(api: A, observer: O, task_id: impl Into<String>, flag: PollingFlag) -> Self {
        Self {
            api,
            observer,
            task_id: task_id.into(),
            flag,
            interval: DEFAULT_POLL_INTERVAL,
            last: None,
            finished: false,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn flag(&self) -> &PollingFlag {
        &self.flag
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// The most recent accepted status report.
    pub fn last_report(&self) -> Option<&StatusReport> {
        self.last.as_ref()
    }

    /// Whether a terminal state has been observed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Poll until the task is terminal, a request fails, or the flag is cleared.
    ///
    /// A `failed` task is reported as `Err(ApiError::TaskFailed)`, so that all
    /// failures reach the caller the same way.
    pub async fn run(&mut self) -> Result<PollOutcome, ApiError> {
        info!(
            "Polling task {} every {}ms",
            self.task_id,
            self.interval.as_millis()
        );

        loop {
            if self.finished || !self.flag.is_active() {
                debug!("Polling of task {} stopped", self.task_id);
                return Ok(PollOutcome::Stopped {
                    last: self.last.clone(),
                });
            }

            let report = match self.api.task_status(&self.task_id).await {
                Ok(report) => report,
                Err(e) => return Err(self.fail(e)),
            };

            if let Some(outcome) = self.apply(report)? {
                return Ok(outcome);
            }

            tokio::time::sleep(self.interval).await;
        }
    }

    /// Ask the backend to cancel the task, stop polling and reload its status.
    ///
    /// Once a terminal state has been seen this makes no request and returns
    /// the terminal report.
    pub async fn cancel(&mut self) -> Result<StatusReport, ApiError> {
        if self.finished {
            if let Some(ref last) = self.last {
                debug!(
                    "Task {} is already {}, not cancelling",
                    self.task_id, last.status
                );
                return Ok(last.clone());
            }
        }

        info!("Cancelling task {}", self.task_id);

        match self.api.cancel_task(&self.task_id).await {
            Ok(Some(message)) => info!("Cancel accepted: {}", message),
            Ok(None) => info!("Cancel accepted"),
            Err(e) => return Err(self.fail(e)),
        }

        self.flag.stop();

        let report = match self.api.task_status(&self.task_id).await {
            Ok(report) => report,
            Err(e) => return Err(self.fail(e)),
        };
        self.apply(report.clone())?;

        Ok(self.last.clone().unwrap_or(report))
    }

    /// Stop polling and surface the error.
    fn fail(&mut self, error: ApiError) -> ApiError {
        self.flag.stop();
        warn!("Polling of task {} failed: {}", self.task_id, error);
        self.observer.on_error(&error);
        error
    }

    /// Accept a report and settle the session if it is terminal.
    fn apply(&mut self, report: StatusReport) -> Result<Option<PollOutcome>, ApiError> {
        if let Some(ref previous) = self.last {
            if !previous.status.can_advance_to(report.status) {
                warn!(
                    "Ignoring status {} for task {}: already {}",
                    report.status, self.task_id, previous.status
                );
                return Ok(None);
            }
        }

        debug!(
            "Task {}: {} {}",
            self.task_id, report.status, report.progress
        );
        self.observer.on_update(&report);
        self.last = Some(report.clone());

        if !report.status.is_terminal() {
            return Ok(None);
        }

        self.finished = true;
        self.flag.stop();

        match report.status {
            TaskStatus::Completed => {
                let route = Route::ResultView(self.task_id.clone());
                info!("Task {} completed", self.task_id);
                self.observer.on_navigate(&route);
                Ok(Some(PollOutcome::Completed { route, report }))
            }
            TaskStatus::Failed => {
                let error = ApiError::TaskFailed(report.failure_text());
                warn!("Task {} failed: {}", self.task_id, error);
                self.observer.on_error(&error);
                Err(error)
            }
            TaskStatus::Cancelled => {
                info!("Task {} was cancelled", self.task_id);
                Ok(Some(PollOutcome::Cancelled { report }))
            }
            TaskStatus::Pending | TaskStatus::Processing => Ok(None),
        }
    }
}
