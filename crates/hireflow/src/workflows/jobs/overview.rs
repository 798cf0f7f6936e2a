use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::domain::Job;
use crate::workflows::applications::Application;

/// Employer dashboard counters derived from the cached jobs and applications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmployerOverview {
    pub total_jobs: usize,
    pub active_jobs: usize,
    pub total_applications: usize,
    pub applications_this_month: usize,
}

impl EmployerOverview {
    pub fn compute(jobs: &[Job], applications: &[Application], today: NaiveDate) -> Self {
        Self {
            total_jobs: jobs.len(),
            active_jobs: jobs.iter().filter(|job| job.is_active).count(),
            total_applications: applications.len(),
            applications_this_month: applied_in_month(applications, today),
        }
    }
}

/// Applications whose `applied_at` falls in the same calendar month as `today`.
pub fn applied_in_month(applications: &[Application], today: NaiveDate) -> usize {
    applications
        .iter()
        .filter(|application| {
            let applied = application.applied_at.date_naive();
            applied.year() == today.year() && applied.month() == today.month()
        })
        .count()
}
