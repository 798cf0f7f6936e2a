//! JSON payloads exchanged with the job-board API. Field names follow the API, which mixes
//! snake_case resources with camelCase request bodies.

use serde::{Deserialize, Serialize};

use super::{ApiError, ApiErrorKind, ApiResult};
use crate::workflows::applications::{
    Application, ApplicationDetails, ApplicationStats, ApplicationStatus,
};
use crate::workflows::jobs::JobId;
use crate::workflows::session::{AuthToken, Registration, User, UserRole};

/// Response wrapper used by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn ok_with_message(data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
        }
    }

    /// Text to show for an unsuccessful envelope.
    pub fn failure_message(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }

    /// Unwrap a 2xx envelope, treating `success: false` as a server-side failure.
    pub fn into_data(self) -> ApiResult<Option<T>> {
        if self.success {
            return Ok(self.data);
        }
        let message = self
            .failure_message()
            .unwrap_or("request was not successful")
            .to_string();
        Err(ApiError::new(ApiErrorKind::Server, message))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: User,
    pub token: AuthToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePayload {
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub user_type: UserRole,
}

impl From<&Registration> for RegisterRequest {
    fn from(form: &Registration) -> Self {
        Self {
            email: form.email.trim().to_string(),
            password: form.password.clone(),
            name: form.name.trim().to_string(),
            user_type: form.role,
        }
    }
}

/// Reference to an already uploaded resume, as the apply endpoint expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeReference {
    pub filename: String,
    #[serde(rename = "originalName")]
    pub original_name: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedResume {
    pub filename: String,
    #[serde(rename = "originalName")]
    pub original_name: String,
    pub url: String,
    pub size: u64,
}

impl UploadedResume {
    pub fn reference(&self) -> ResumeReference {
        ResumeReference {
            filename: self.filename.clone(),
            original_name: self.original_name.clone(),
            size: self.size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyRequest {
    #[serde(rename = "jobId")]
    pub job_id: JobId,
    #[serde(
        rename = "resumeData",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub resume_data: Option<ResumeReference>,
    #[serde(
        rename = "applicationData",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub application_data: Option<ApplicationDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
}

/// Body of `GET /employee/applications`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeApplications {
    pub applications: Vec<Application>,
    #[serde(default)]
    pub stats: Option<ApplicationStats>,
}
