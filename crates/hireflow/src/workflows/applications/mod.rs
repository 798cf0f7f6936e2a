//! Application tracking: the status state machine, the read-models derived from the cached
//! application list, the resume upload gate, and the service tying them to the API.

pub mod cache;
pub mod domain;
pub mod index;
pub mod resume;
pub mod service;
pub mod stats;
pub mod transitions;

#[cfg(test)]
pub(crate) mod tests;

pub use cache::{ApplicationCache, FetchTicket};
pub use domain::{
    Application, ApplicationDetails, ApplicationId, ApplicationStatus, ResumeAttachment,
    UnknownStatus,
};
pub use index::{has_applied, AppliedIndex};
pub use resume::{check_resume, ResumeError, ResumeFile, MAX_RESUME_BYTES};
pub use service::{ApplicationWorkflowService, TransitionOutcome};
pub use stats::ApplicationStats;
pub use transitions::{available_actions, plan_transition, Actor, TransitionError, TransitionPlan};
