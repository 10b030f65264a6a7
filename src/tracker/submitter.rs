//! Start-analysis form submission.

use crate::api::{ApiError, TaskApi};
use crate::tracker::navigation::Route;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// The submit control is disabled; a submission already went out.
    #[error("A submission is already in progress")]
    Disabled,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Form fields in submission order, plus the names that must be filled in.
#[derive(Debug, Clone, Default)]
pub struct AnalysisForm {
    fields: Vec<(String, String)>,
    required: Vec<String>,
}

impl AnalysisForm {
    pub fn new(required: Vec<String>) -> Self {
        Self {
            fields: Vec::new(),
            required,
        }
    }

    /// Builder-style [`AnalysisForm::set`].
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field, replacing an earlier value of the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Reject the form if a required field is missing or blank.
    pub fn validate(&self) -> Result<(), FormError> {
        for name in &self.required {
            match self.get(name) {
                Some(value) if !value.trim().is_empty() => {}
                _ => return Err(FormError::MissingField(name.clone())),
            }
        }
        Ok(())
    }
}

/// Sends analysis forms and tracks the state of the submit control.
///
/// The control is disabled while a submission is out and stays disabled
/// after a success, since the caller moves on to the task view. A failure
/// re-enables it and keeps the error text for display.
pub struct FormSubmitter<A> {
    api: A,
    action: String,
    enabled: bool,
    last_error: Option<String>,
}

impl<A: TaskApi> FormSubmitter<A> {
    pub fn new(api: A, action: impl Into<String>) -> Self {
        Self {
            api,
            action: action.into(),
            enabled: true,
            last_error: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Error text of the last failed submission.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Validate and send the form; on success returns the task view to move to.
    pub async fn submit(&mut self, form: &AnalysisForm) -> Result<Route, FormError> {
        if !self.enabled {
            return Err(FormError::Disabled);
        }

        if let Err(e) = form.validate() {
            self.last_error = Some(e.to_string());
            return Err(e);
        }

        self.enabled = false;
        self.last_error = None;
        info!("Submitting analysis form to {}", self.action);

        match self.api.start_analysis(&self.action, form.fields()).await {
            Ok(task_id) => {
                info!("Analysis started as task {}", task_id);
                Ok(Route::TaskView(task_id))
            }
            Err(e) => {
                warn!("Submission failed: {}", e);
                self.enabled = true;
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutesConfig;
    use crate::tracker::testing::ScriptedApi;

    fn make_form() -> AnalysisForm {
        AnalysisForm::new(vec!["platform".to_string(), "profile_id".to_string()])
            .field("platform", "instagram")
            .field("profile_id", "jane.doe")
    }

    #[tokio::test]
    async fn test_success_navigates_to_task_view() {
        let api = ScriptedApi::default();
        api.on_submit(Ok("42".to_string()));
        let mut submitter = FormSubmitter::new(api.clone(), "/api/analyze");

        let route = submitter.submit(&make_form()).await.unwrap();
        assert_eq!(route, Route::TaskView("42".to_string()));
        assert_eq!(route.path(&RoutesConfig::default()), "/tasks/42");
        assert!(!submitter.is_enabled());
        assert_eq!(
            api.submitted(),
            vec![vec![
                ("platform".to_string(), "instagram".to_string()),
                ("profile_id".to_string(), "jane.doe".to_string()),
            ]]
        );
    }

    #[tokio::test]
    async fn test_failure_reenables_and_shows_message() {
        let api = ScriptedApi::default();
        api.on_submit(Err(ApiError::Rejected("rate limited".to_string())));
        let mut submitter = FormSubmitter::new(api, "/api/analyze");

        let err = submitter.submit(&make_form()).await.unwrap_err();
        assert_eq!(err.to_string(), "rate limited");
        assert!(submitter.is_enabled());
        assert_eq!(submitter.last_error(), Some("rate limited"));
    }

    #[tokio::test]
    async fn test_http_error_message_is_verbatim() {
        let api = ScriptedApi::default();
        api.on_submit(Err(ApiError::Http {
            status: 429,
            message: "rate limited".to_string(),
        }));
        let mut submitter = FormSubmitter::new(api, "/api/analyze");

        assert!(submitter.submit(&make_form()).await.is_err());
        assert!(submitter.is_enabled());
        assert_eq!(submitter.last_error(), Some("rate limited"));
    }

    #[tokio::test]
    async fn test_missing_field_rejected_before_network() {
        let api = ScriptedApi::default();
        let mut submitter = FormSubmitter::new(api.clone(), "/api/analyze");
        let form = AnalysisForm::new(vec!["platform".to_string(), "profile_id".to_string()])
            .field("platform", "instagram")
            .field("profile_id", "   ");

        let err = submitter.submit(&form).await.unwrap_err();
        assert_eq!(err, FormError::MissingField("profile_id".to_string()));
        assert!(api.submitted().is_empty());
        assert!(submitter.is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_after_success() {
        let api = ScriptedApi::default();
        api.on_submit(Ok("7".to_string()));
        let mut submitter = FormSubmitter::new(api.clone(), "/api/analyze");

        submitter.submit(&make_form()).await.unwrap();
        let err = submitter.submit(&make_form()).await.unwrap_err();
        assert_eq!(err, FormError::Disabled);
        assert_eq!(api.submitted().len(), 1);
    }

    #[test]
    fn test_set_replaces_existing_field() {
        let mut form = make_form();
        form.set("platform", "twitter");
        form.set("depth", "full");
        assert_eq!(form.get("platform"), Some("twitter"));
        assert_eq!(form.fields().len(), 3);
    }
}
