//! Client-side task tracking: starting analyses, polling their status and
//! resolving the dashboard routes to move to.

pub mod navigation;
pub mod poller;
pub mod submitter;
pub mod view;

pub use navigation::Route;
pub use poller::{PollObserver, PollOutcome, PollingFlag, TaskPoller};
pub use submitter::{AnalysisForm, FormError, FormSubmitter};
pub use view::ProgressView;

#[cfg(test)]
pub(crate) mod testing;
