use chrono::NaiveDate;
use tracing::info;

use super::domain::{Job, JobDraft, JobId, JobListing};
use super::overview::EmployerOverview;
use crate::api::{ApiErrorKind, JobBoardApi};
use crate::workflows::applications::ApplicationWorkflowService;
use crate::workflows::error::WorkflowError;
use crate::workflows::session::UserRole;

impl<A> ApplicationWorkflowService<A>
where
    A: JobBoardApi + 'static,
{
    /// Fetch the jobs relevant to the signed-in user: own postings for employers, the public
    /// board for employees.
    pub async fn refresh_jobs(&mut self) -> Result<&[Job], WorkflowError> {
        let session = self.require_session()?;
        let role = session.role();
        let token = session.token.clone();

        let result = match role {
            UserRole::Employer => self.api.employer_jobs(&token).await,
            UserRole::Employee => self.api.list_jobs(&token).await,
        };
        let jobs = self.absorb(result)?;
        Ok(self.jobs.insert(jobs).as_slice())
    }

    /// Cached jobs, fetched first when missing.
    pub async fn jobs(&mut self) -> Result<&[Job], WorkflowError> {
        if self.jobs.is_none() {
            return self.refresh_jobs().await;
        }
        Ok(self.jobs.as_deref().unwrap_or_default())
    }

    /// The employee job board: active jobs, each flagged if the user already applied.
    pub async fn job_listing(&mut self) -> Result<Vec<JobListing>, WorkflowError> {
        self.require_role(UserRole::Employee)?;
        self.ensure_applications().await?;
        let applied = self.applications.applied_index();
        let jobs = self.jobs().await?;
        Ok(JobListing::build(jobs, &applied))
    }

    pub async fn job(&mut self, job_id: JobId) -> Result<Job, WorkflowError> {
        let token = self.require_session()?.token.clone();
        match self.api.get_job(&token, job_id).await {
            Err(err) if err.kind == ApiErrorKind::NotFound => {
                Err(WorkflowError::UnknownJob(job_id))
            }
            result => self.absorb(result),
        }
    }

    pub async fn post_job(&mut self, draft: JobDraft) -> Result<Job, WorkflowError> {
        draft.validate()?;
        let token = self.require_role(UserRole::Employer)?.token.clone();
        let result = self.api.create_job(&token, &draft).await;
        let job = self.absorb(result)?;
        info!(job_id = %job.id, title = %job.title, "job posted");
        self.jobs = None;
        Ok(job)
    }

    pub async fn update_job(
        &mut self,
        job_id: JobId,
        draft: JobDraft,
    ) -> Result<Job, WorkflowError> {
        draft.validate()?;
        let token = self.require_role(UserRole::Employer)?.token.clone();
        let result = self.api.update_job(&token, job_id, &draft).await;
        let job = self.absorb(result)?;
        info!(%job_id, "job updated");
        self.jobs = None;
        Ok(job)
    }

    pub async fn toggle_job_active(&mut self, job_id: JobId) -> Result<Job, WorkflowError> {
        let token = self.require_role(UserRole::Employer)?.token.clone();
        let result = self.api.toggle_job_active(&token, job_id).await;
        let job = self.absorb(result)?;
        info!(%job_id, active = job.is_active, "job visibility changed");
        self.jobs = None;
        Ok(job)
    }

    /// Delete a posting. The server drops its applications with it, so both caches go.
    pub async fn delete_job(&mut self, job_id: JobId) -> Result<(), WorkflowError> {
        let token = self.require_role(UserRole::Employer)?.token.clone();
        let result = self.api.delete_job(&token, job_id).await;
        self.absorb(result)?;
        info!(%job_id, "job deleted");
        self.jobs = None;
        self.applications.invalidate();
        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Dashboard counters for the signed-in employer.
    pub async fn employer_overview(
        &mut self,
        today: NaiveDate,
    ) -> Result<EmployerOverview, WorkflowError> {
        self.require_role(UserRole::Employer)?;
        self.ensure_applications().await?;
        if self.jobs.is_none() {
            self.refresh_jobs().await?;
        }
        let jobs = self.jobs.as_deref().unwrap_or_default();
        Ok(EmployerOverview::compute(
            jobs,
            self.applications.applications(),
            today,
        ))
    }
}
