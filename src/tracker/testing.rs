//! Scripted API and recording observer shared by tracker tests.

use crate::api::{ApiError, TaskApi};
use crate::models::{Progress, StatusReport, Task, TaskStatus};
use crate::tracker::navigation::Route;
use crate::tracker::poller::{PollObserver, PollingFlag};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub fn report(status: TaskStatus, progress: u8) -> StatusReport {
    StatusReport {
        status,
        progress: Progress::from_raw(progress as f64),
        message: None,
        error: None,
    }
}

#[derive(Default)]
struct Script {
    statuses: VecDeque<Result<StatusReport, ApiError>>,
    cancel: Option<Result<Option<String>, ApiError>>,
    submit: Option<Result<String, ApiError>>,
    submitted: Vec<Vec<(String, String)>>,
    status_calls: usize,
    cancel_calls: usize,
}

/// A `TaskApi` that replays canned responses and counts calls.
#[derive(Clone, Default)]
pub struct ScriptedApi {
    script: Arc<Mutex<Script>>,
}

impl ScriptedApi {
    pub fn with_statuses(statuses: Vec<Result<StatusReport, ApiError>>) -> Self {
        let api = Self::default();
        api.script.lock().unwrap().statuses = statuses.into();
        api
    }

    pub fn on_cancel(&self, response: Result<Option<String>, ApiError>) {
        self.script.lock().unwrap().cancel = Some(response);
    }

    pub fn on_submit(&self, response: Result<String, ApiError>) {
        self.script.lock().unwrap().submit = Some(response);
    }

    pub fn status_calls(&self) -> usize {
        self.script.lock().unwrap().status_calls
    }

    pub fn cancel_calls(&self) -> usize {
        self.script.lock().unwrap().cancel_calls
    }

    pub fn submitted(&self) -> Vec<Vec<(String, String)>> {
        self.script.lock().unwrap().submitted.clone()
    }
}

#[async_trait]
impl TaskApi for ScriptedApi {
    async fn start_analysis(
        &self,
        _action: &str,
        fields: &[(String, String)],
    ) -> Result<String, ApiError> {
        let mut script = self.script.lock().unwrap();
        script.submitted.push(fields.to_vec());
        script
            .submit
            .clone()
            .unwrap_or_else(|| Err(ApiError::Transport("no submit response scripted".into())))
    }

    async fn task_status(&self, _task_id: &str) -> Result<StatusReport, ApiError> {
        let mut script = self.script.lock().unwrap();
        script.status_calls += 1;
        script
            .statuses
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("status script exhausted".into())))
    }

    async fn cancel_task(&self, _task_id: &str) -> Result<Option<String>, ApiError> {
        let mut script = self.script.lock().unwrap();
        script.cancel_calls += 1;
        script.cancel.clone().unwrap_or(Ok(None))
    }

    async fn task(&self, task_id: &str) -> Result<Task, ApiError> {
        Err(ApiError::Http {
            status: 404,
            message: format!("task {} not scripted", task_id),
        })
    }
}

/// Observer that records every callback, optionally clearing a flag after
/// a number of updates.
#[derive(Default)]
pub struct RecordingObserver {
    pub updates: Vec<StatusReport>,
    pub errors: Vec<String>,
    pub routes: Vec<Route>,
    stop_after: Option<(usize, PollingFlag)>,
}

impl RecordingObserver {
    pub fn stopping_after(updates: usize, flag: PollingFlag) -> Self {
        Self {
            stop_after: Some((updates, flag)),
            ..Self::default()
        }
    }
}

impl PollObserver for RecordingObserver {
    fn on_update(&mut self, report: &StatusReport) {
        self.updates.push(report.clone());
        if let Some((limit, ref flag)) = self.stop_after {
            if self.updates.len() >= limit {
                flag.stop();
            }
        }
    }

    fn on_error(&mut self, error: &ApiError) {
        self.errors.push(error.to_string());
    }

    fn on_navigate(&mut self, route: &Route) {
        self.routes.push(route.clone());
    }
}
