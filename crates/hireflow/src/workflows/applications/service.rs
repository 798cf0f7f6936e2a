use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::cache::ApplicationCache;
use super::domain::{Application, ApplicationDetails, ApplicationId, ApplicationStatus};
use super::resume::ResumeFile;
use super::stats::ApplicationStats;
use super::transitions::{available_actions, plan_transition, Actor, TransitionPlan};
use crate::api::{ApiError, ApiErrorKind, ApiResult, ApplyRequest, JobBoardApi, RegisterRequest};
use crate::workflows::error::WorkflowError;
use crate::workflows::jobs::{Job, JobId};
use crate::workflows::session::{
    AuthToken, Credentials, Registration, Session, SessionContext, User, UserId, UserRole,
};

/// The application status workflow manager.
///
/// Holds the explicit session and the client caches, and is the only path through which
/// mutations reach the API. Every successful mutation invalidates the affected caches and
/// re-fetches them, so read-models are always derived from a server list.
pub struct ApplicationWorkflowService<A> {
    pub(crate) api: Arc<A>,
    pub(crate) session: SessionContext,
    pub(crate) applications: ApplicationCache,
    /// Employer: own postings. Employee: the public board. `None` until fetched.
    pub(crate) jobs: Option<Vec<Job>>,
}

/// Result of a transition the server accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    pub plan: TransitionPlan,
    /// Whether the follow-up fetch succeeded. When false the cache stays marked stale and the
    /// next read refetches it.
    pub refreshed: bool,
}

impl<A> ApplicationWorkflowService<A>
where
    A: JobBoardApi + 'static,
{
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            session: SessionContext::default(),
            applications: ApplicationCache::new(),
            jobs: None,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub async fn login(&mut self, credentials: Credentials) -> Result<User, WorkflowError> {
        credentials.validate()?;
        let payload = self.api.login(&credentials).await?;
        Ok(self.start_session(Session {
            user: payload.user,
            token: payload.token,
        }))
    }

    pub async fn register(&mut self, registration: Registration) -> Result<User, WorkflowError> {
        registration.validate()?;
        let payload = self
            .api
            .register(&RegisterRequest::from(&registration))
            .await?;
        Ok(self.start_session(Session {
            user: payload.user,
            token: payload.token,
        }))
    }

    /// Re-establish a session from a previously issued token.
    pub async fn restore(&mut self, token: AuthToken) -> Result<User, WorkflowError> {
        let user = self.api.profile(&token).await?;
        Ok(self.start_session(Session { user, token }))
    }

    pub fn logout(&mut self) -> Option<User> {
        self.reset_caches();
        self.session.logout()
    }

    fn start_session(&mut self, session: Session) -> User {
        let user = session.user.clone();
        self.reset_caches();
        self.session.login(session);
        user
    }

    fn reset_caches(&mut self) {
        self.applications.clear();
        self.jobs = None;
    }

    pub(crate) fn require_session(&self) -> Result<&Session, WorkflowError> {
        self.session.session().ok_or(WorkflowError::NotAuthenticated)
    }

    pub(crate) fn require_role(&self, role: UserRole) -> Result<&Session, WorkflowError> {
        let session = self.require_session()?;
        if session.role() == role {
            Ok(session)
        } else {
            Err(WorkflowError::Forbidden {
                role: session.role(),
            })
        }
    }

    /// Map an API failure, ending the session when the token is no longer accepted.
    pub(crate) fn absorb<T>(&mut self, result: ApiResult<T>) -> Result<T, WorkflowError> {
        result.map_err(|err| self.absorb_error(err))
    }

    pub(crate) fn absorb_error(&mut self, err: ApiError) -> WorkflowError {
        if err.kind == ApiErrorKind::Unauthorized {
            warn!(message = %err.message, "token rejected, ending session");
            self.logout();
            return WorkflowError::SessionExpired;
        }
        WorkflowError::Api(err)
    }

    /// Cached applications. May be stale; see [`Self::ensure_applications`].
    pub fn applications(&self) -> &[Application] {
        self.applications.applications()
    }

    pub fn application(&self, id: ApplicationId) -> Option<&Application> {
        self.applications.get(id)
    }

    /// Fetch the signed-in user's applications and replace the cache.
    ///
    /// Employees get their own submissions, employers the submissions to their postings.
    pub async fn refresh_applications(&mut self) -> Result<&[Application], WorkflowError> {
        let session = self.require_session()?;
        let role = session.role();
        let token = session.token.clone();
        let ticket = self.applications.begin_fetch();

        let fetched = match role {
            UserRole::Employee => {
                let result = self.api.employee_applications(&token).await;
                let payload = self.absorb(result)?;
                ApplicationStats::check_server_stats(payload.stats, &payload.applications);
                payload.applications
            }
            UserRole::Employer => {
                let result = self.api.employer_applications(&token).await;
                self.absorb(result)?
            }
        };

        self.applications.complete_fetch(ticket, fetched);
        Ok(self.applications.applications())
    }

    /// The cached list, fetched first if it was never loaded or has been invalidated.
    pub async fn ensure_applications(&mut self) -> Result<&[Application], WorkflowError> {
        if self.applications.needs_refresh() {
            return self.refresh_applications().await;
        }
        Ok(self.applications.applications())
    }

    pub fn stats(&self) -> ApplicationStats {
        self.applications.stats()
    }

    /// Whether the current cache already holds an application to `job_id`.
    pub fn has_applied(&self, job_id: JobId) -> bool {
        self.applications.has_applied(job_id)
    }

    /// Owner of `job_id` as far as the cached jobs tell. An employer's cache only holds their
    /// own postings, so for employers this is either their id or `None`, and ownership of
    /// anything else is left to the server's 403.
    pub(crate) fn job_owner(&self, job_id: JobId) -> Option<UserId> {
        self.jobs
            .as_deref()
            .and_then(|jobs| jobs.iter().find(|job| job.id == job_id))
            .map(|job| job.employer_id)
    }

    /// Status actions to offer for an application. Empty for employees, for terminal
    /// applications, and for applications not in the cache.
    pub fn available_actions(&self, application_id: ApplicationId) -> &'static [ApplicationStatus] {
        let (Some(session), Some(application)) = (
            self.session.session(),
            self.applications.get(application_id),
        ) else {
            return &[];
        };
        available_actions(
            Actor::from(session),
            application,
            self.job_owner(application.job_id),
        )
    }

    /// Move an application to `target`.
    ///
    /// Invalid or unauthorized transitions fail before any request. The cache is never
    /// patched optimistically: on success it is refetched, on a conflict it is refetched and
    /// the error carries the status the server now reports, on any other failure it is left
    /// as it was.
    pub async fn transition(
        &mut self,
        application_id: ApplicationId,
        target: ApplicationStatus,
    ) -> Result<TransitionOutcome, WorkflowError> {
        let session = self.require_session()?;
        let actor = Actor::from(session);
        let token = session.token.clone();
        let application = self
            .applications
            .get(application_id)
            .ok_or(WorkflowError::UnknownApplication(application_id))?;
        let plan = plan_transition(
            actor,
            application,
            self.job_owner(application.job_id),
            target,
        )?;

        let result = self
            .api
            .update_application_status(&token, plan.application_id, plan.to)
            .await;

        match result {
            Ok(()) => {
                info!(
                    application_id = %plan.application_id,
                    from = %plan.from,
                    to = %plan.to,
                    "application status changed"
                );
                self.applications.invalidate();
                let refreshed = self.refresh_after_mutation().await;
                Ok(TransitionOutcome { plan, refreshed })
            }
            Err(err) if err.kind == ApiErrorKind::Conflict => {
                warn!(
                    application_id = %plan.application_id,
                    message = %err.message,
                    "status change conflicted with the server state"
                );
                self.applications.invalidate();
                // A stale list only holds the status this client planned from.
                let server_status = if self.refresh_after_mutation().await {
                    self.applications.get(application_id).map(|app| app.status)
                } else {
                    None
                };
                let detail = match server_status {
                    Some(status) => format!("it is now {status}"),
                    None => err.message,
                };
                Err(WorkflowError::StateConflict {
                    application_id,
                    server_status,
                    detail,
                })
            }
            Err(err) => Err(self.absorb_error(err)),
        }
    }

    /// Submit an application to `job_id` as the signed-in employee.
    ///
    /// The resume, when given, is checked locally, then uploaded, and only once the upload
    /// returned a file reference is the application itself sent.
    pub async fn apply(
        &mut self,
        job_id: JobId,
        resume: Option<ResumeFile>,
        details: Option<ApplicationDetails>,
    ) -> Result<Application, WorkflowError> {
        let token = self.require_role(UserRole::Employee)?.token.clone();
        if let Some(file) = &resume {
            file.validate()?;
        }

        self.ensure_applications().await?;
        if self.applications.has_applied(job_id) {
            return Err(WorkflowError::AlreadyApplied(job_id));
        }

        let resume_data = match resume {
            Some(file) => {
                let result = self.api.upload_resume(&token, &file).await;
                let uploaded = self.absorb(result)?;
                info!(%job_id, filename = %uploaded.filename, "resume uploaded");
                Some(uploaded.reference())
            }
            None => None,
        };

        let request = ApplyRequest {
            job_id,
            resume_data,
            application_data: details,
        };
        let result = self.api.apply(&token, &request).await;

        match result {
            Ok(application) => {
                info!(%job_id, application_id = %application.id, "application submitted");
                self.applications.invalidate();
                self.jobs = None;
                self.refresh_after_mutation().await;
                Ok(application)
            }
            Err(err) if err.kind == ApiErrorKind::Conflict => {
                warn!(%job_id, message = %err.message, "duplicate application rejected by server");
                self.applications.invalidate();
                self.refresh_after_mutation().await;
                Err(WorkflowError::DuplicateApplication(job_id))
            }
            Err(err) => Err(self.absorb_error(err)),
        }
    }

    /// Refetch after a mutation the server already accepted. A failure here must not turn
    /// the mutation into an error; the cache stays stale instead.
    pub(crate) async fn refresh_after_mutation(&mut self) -> bool {
        match self.refresh_applications().await {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "could not refresh applications after update");
                false
            }
        }
    }
}
