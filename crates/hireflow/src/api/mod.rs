//! Seam between the workflow manager and the remote job-board API.
//!
//! Every operation resolves to `Ok(payload)` or a tagged [`ApiError`]; callers branch on
//! [`ApiErrorKind`] and never inspect response bodies themselves.

pub mod http;
pub mod wire;

use std::fmt;

use async_trait::async_trait;

use crate::workflows::applications::{Application, ApplicationId, ApplicationStatus, ResumeFile};
use crate::workflows::jobs::{Job, JobDraft, JobId};
use crate::workflows::session::{AuthToken, Credentials, User};

pub use http::HttpJobBoardApi;
pub use wire::{
    ApplyRequest, AuthPayload, EmployeeApplications, Envelope, ProfilePayload, RegisterRequest,
    ResumeReference, StatusUpdate, UploadedResume,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// The server rejected the request body (400/422).
    Validation,
    /// Missing or expired token (401). Ends the session.
    Unauthorized,
    /// Authenticated but not allowed (403).
    Forbidden,
    NotFound,
    /// The resource changed underneath the request (409).
    Conflict,
    Server,
    Transport,
    Decode,
}

impl ApiErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => ApiErrorKind::Validation,
            401 => ApiErrorKind::Unauthorized,
            403 => ApiErrorKind::Forbidden,
            404 => ApiErrorKind::NotFound,
            409 => ApiErrorKind::Conflict,
            _ => ApiErrorKind::Server,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ApiErrorKind::Validation => "validation",
            ApiErrorKind::Unauthorized => "unauthorized",
            ApiErrorKind::Forbidden => "forbidden",
            ApiErrorKind::NotFound => "not found",
            ApiErrorKind::Conflict => "conflict",
            ApiErrorKind::Server => "server",
            ApiErrorKind::Transport => "transport",
            ApiErrorKind::Decode => "decode",
        }
    }

    /// Failures where the user can only try again later.
    pub const fn is_retryable(self) -> bool {
        matches!(self, ApiErrorKind::Server | ApiErrorKind::Transport)
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::from_status(status),
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Transport, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Decode, message)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Operations the job-board API offers. Authenticated calls take the session token
/// explicitly; implementations hold no session state of their own.
#[async_trait]
pub trait JobBoardApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> ApiResult<AuthPayload>;
    async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthPayload>;
    async fn profile(&self, token: &AuthToken) -> ApiResult<User>;

    async fn list_jobs(&self, token: &AuthToken) -> ApiResult<Vec<Job>>;
    async fn get_job(&self, token: &AuthToken, job_id: JobId) -> ApiResult<Job>;
    async fn employer_jobs(&self, token: &AuthToken) -> ApiResult<Vec<Job>>;
    async fn create_job(&self, token: &AuthToken, draft: &JobDraft) -> ApiResult<Job>;
    async fn update_job(&self, token: &AuthToken, job_id: JobId, draft: &JobDraft)
        -> ApiResult<Job>;
    async fn delete_job(&self, token: &AuthToken, job_id: JobId) -> ApiResult<()>;
    async fn toggle_job_active(&self, token: &AuthToken, job_id: JobId) -> ApiResult<Job>;

    async fn apply(&self, token: &AuthToken, request: &ApplyRequest) -> ApiResult<Application>;
    async fn employee_applications(&self, token: &AuthToken) -> ApiResult<EmployeeApplications>;
    async fn employer_applications(&self, token: &AuthToken) -> ApiResult<Vec<Application>>;
    async fn update_application_status(
        &self,
        token: &AuthToken,
        application_id: ApplicationId,
        status: ApplicationStatus,
    ) -> ApiResult<()>;
    async fn upload_resume(&self, token: &AuthToken, file: &ResumeFile)
        -> ApiResult<UploadedResume>;
}
