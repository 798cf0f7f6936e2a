use std::collections::HashSet;

use super::domain::Application;
use crate::workflows::jobs::JobId;

/// True when some application in `applications` targets `job_id`.
pub fn has_applied(job_id: JobId, applications: &[Application]) -> bool {
    applications
        .iter()
        .any(|application| application.job_id == job_id)
}

/// Set of job ids the current user has applied to, for flagging a whole listing at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedIndex {
    job_ids: HashSet<JobId>,
}

impl AppliedIndex {
    pub fn from_applications(applications: &[Application]) -> Self {
        Self::from_job_ids(applications.iter().map(|application| application.job_id))
    }

    pub fn from_job_ids(job_ids: impl IntoIterator<Item = JobId>) -> Self {
        Self {
            job_ids: job_ids.into_iter().collect(),
        }
    }

    pub fn contains(&self, job_id: JobId) -> bool {
        self.job_ids.contains(&job_id)
    }

    pub fn len(&self) -> usize {
        self.job_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.job_ids.is_empty()
    }
}
