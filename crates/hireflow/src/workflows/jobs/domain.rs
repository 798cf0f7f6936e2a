use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::applications::AppliedIndex;
use crate::workflows::session::UserId;
use crate::workflows::validation::ValidationErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub i64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A posted job as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub employer_id: UserId,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub location: String,
    pub salary: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employer_name: Option<String>,
}

impl Job {
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.employer_id == user
    }
}

/// Editable fields of a job posting, used for both create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDraft {
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub location: String,
    pub salary: String,
}

impl JobDraft {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.title.trim().is_empty() {
            errors.push("title", "Job title is required");
        }
        if self.description.trim().is_empty() {
            errors.push("description", "Description is required");
        }
        if self.location.trim().is_empty() {
            errors.push("location", "Location is required");
        }
        errors.into_result()
    }
}

impl From<&Job> for JobDraft {
    fn from(job: &Job) -> Self {
        Self {
            title: job.title.clone(),
            description: job.description.clone(),
            requirements: job.requirements.clone(),
            location: job.location.clone(),
            salary: job.salary.clone(),
        }
    }
}

/// One row of the employee job listing with its "already applied" badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobListing {
    pub job: Job,
    pub already_applied: bool,
}

impl JobListing {
    /// Active jobs only, each flagged against the current applied index.
    pub fn build(jobs: &[Job], applied: &AppliedIndex) -> Vec<JobListing> {
        jobs.iter()
            .filter(|job| job.is_active)
            .map(|job| JobListing {
                job: job.clone(),
                already_applied: applied.contains(job.id),
            })
            .collect()
    }
}
