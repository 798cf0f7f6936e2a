use crate::api::{ApiError, ApiErrorKind};
use crate::workflows::applications::{
    ApplicationId, ApplicationStatus, ResumeError, TransitionError,
};
use crate::workflows::jobs::JobId;
use crate::workflows::session::UserRole;
use crate::workflows::validation::ValidationErrors;

const RETRY_PROMPT: &str =
    "Something went wrong while contacting the job board. Please try again.";

/// Error raised by the workflow manager.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("sign in to continue")]
    NotAuthenticated,
    #[error("{role} accounts cannot perform this action")]
    Forbidden { role: UserRole },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("application {0} is not part of the current view")]
    UnknownApplication(ApplicationId),
    #[error("job {0} was not found")]
    UnknownJob(JobId),
    #[error("you have already applied to job {0}")]
    AlreadyApplied(JobId),
    #[error("an application for job {0} was already submitted")]
    DuplicateApplication(JobId),
    #[error("application {application_id} was updated elsewhere: {detail}")]
    StateConflict {
        application_id: ApplicationId,
        server_status: Option<ApplicationStatus>,
        detail: String,
    },
    #[error("your session has expired, please sign in again")]
    SessionExpired,
    #[error(transparent)]
    Resume(#[from] ResumeError),
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl WorkflowError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::Api(err)
                if err.kind.is_retryable() || err.kind == ApiErrorKind::Decode =>
            {
                RETRY_PROMPT.to_string()
            }
            WorkflowError::Api(err) => err.message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, WorkflowError::SessionExpired)
    }
}
