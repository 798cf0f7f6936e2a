use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{Application, ApplicationStatus};

/// Per-status counts over an application list. Always rebuilt from the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationStats {
    pub total: usize,
    pub applied: usize,
    pub viewed: usize,
    pub shortlisted: usize,
    pub rejected: usize,
    pub accepted: usize,
}

impl ApplicationStats {
    pub fn from_applications(applications: &[Application]) -> Self {
        let mut stats = Self {
            total: applications.len(),
            ..Self::default()
        };

        for application in applications {
            *stats.slot_mut(application.status) += 1;
        }

        stats
    }

    pub fn count(&self, status: ApplicationStatus) -> usize {
        match status {
            ApplicationStatus::Applied => self.applied,
            ApplicationStatus::Viewed => self.viewed,
            ApplicationStatus::Shortlisted => self.shortlisted,
            ApplicationStatus::Rejected => self.rejected,
            ApplicationStatus::Accepted => self.accepted,
        }
    }

    fn slot_mut(&mut self, status: ApplicationStatus) -> &mut usize {
        match status {
            ApplicationStatus::Applied => &mut self.applied,
            ApplicationStatus::Viewed => &mut self.viewed,
            ApplicationStatus::Shortlisted => &mut self.shortlisted,
            ApplicationStatus::Rejected => &mut self.rejected,
            ApplicationStatus::Accepted => &mut self.accepted,
        }
    }

    /// Applications that can still move (not rejected or accepted).
    pub fn in_progress(&self) -> usize {
        self.applied + self.viewed + self.shortlisted
    }

    /// Log a server-supplied summary that disagrees with `applications`. The list stays
    /// authoritative, so there is nothing to return.
    pub fn check_server_stats(server: Option<ApplicationStats>, applications: &[Application]) {
        let Some(reported) = server else {
            return;
        };
        let computed = Self::from_applications(applications);
        if reported != computed {
            warn!(
                ?reported,
                ?computed,
                "server application stats disagree with the application list"
            );
        }
    }
}
