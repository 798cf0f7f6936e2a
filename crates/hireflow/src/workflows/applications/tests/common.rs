use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::api::{
    ApiError, ApiResult, ApplyRequest, AuthPayload, EmployeeApplications, JobBoardApi,
    RegisterRequest, UploadedResume,
};
use crate::workflows::applications::{
    Application, ApplicationId, ApplicationStats, ApplicationStatus, ApplicationWorkflowService,
    ResumeFile,
};
use crate::workflows::jobs::{Job, JobDraft, JobId};
use crate::workflows::session::{AuthToken, Credentials, User, UserId, UserRole};

pub(crate) const PASSWORD: &str = "secret1";
pub(crate) const EMPLOYER: UserId = UserId(1);
pub(crate) const OTHER_EMPLOYER: UserId = UserId(2);
pub(crate) const EMPLOYEE: UserId = UserId(10);

pub(crate) fn timestamp(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn user(id: UserId, role: UserRole) -> User {
    User {
        id,
        email: format!("user{}@example.com", id.0),
        name: format!("User {}", id.0),
        user_type: role,
        created_at: timestamp(2025, 1, 1),
    }
}

pub(crate) fn job(id: i64, employer: UserId, active: bool) -> Job {
    Job {
        id: JobId(id),
        employer_id: employer,
        title: format!("Role {id}"),
        description: "Ship features".to_string(),
        requirements: "Rust".to_string(),
        location: "Remote".to_string(),
        salary: "$120k".to_string(),
        created_at: timestamp(2025, 1, 2),
        is_active: active,
        employer_name: None,
    }
}

pub(crate) fn application(id: i64, job_id: i64, status: ApplicationStatus) -> Application {
    application_applied_on(id, job_id, status, 2025, 3, 1)
}

pub(crate) fn application_applied_on(
    id: i64,
    job_id: i64,
    status: ApplicationStatus,
    year: i32,
    month: u32,
    day: u32,
) -> Application {
    let applied_at = timestamp(year, month, day);
    Application {
        id: ApplicationId(id),
        job_id: JobId(job_id),
        employee_id: EMPLOYEE,
        status,
        applied_at,
        updated_at: applied_at,
        job_title: Some(format!("Role {job_id}")),
        employer_name: None,
        employee_name: Some("User 10".to_string()),
        resume_filename: None,
        resume_url: None,
        file_size: None,
        cover_letter: None,
        phone_number: None,
        location: None,
    }
}

pub(crate) fn resume_pdf(size: usize) -> ResumeFile {
    ResumeFile::new("cv.pdf", "application/pdf", vec![b'%'; size])
}

#[derive(Default)]
struct FakeState {
    users: Vec<User>,
    tokens: HashMap<String, UserId>,
    jobs: Vec<Job>,
    applications: Vec<Application>,
    next_id: i64,
    calls: Vec<&'static str>,
    failures: HashMap<&'static str, ApiError>,
    reported_stats: Option<ApplicationStats>,
}

impl FakeState {
    fn authenticate(&self, token: &AuthToken) -> ApiResult<User> {
        let id = self
            .tokens
            .get(token.as_str())
            .ok_or_else(|| ApiError::from_status(401, "Invalid token"))?;
        self.users
            .iter()
            .find(|user| user.id == *id)
            .cloned()
            .ok_or_else(|| ApiError::from_status(401, "Invalid token"))
    }

    fn issue_token(&mut self, user: &User) -> AuthToken {
        let token = format!("tok-{}", user.id);
        self.tokens.insert(token.clone(), user.id);
        AuthToken::new(token)
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        100 + self.next_id
    }

    fn employer_of(&self, job_id: JobId) -> Option<UserId> {
        self.jobs
            .iter()
            .find(|job| job.id == job_id)
            .map(|job| job.employer_id)
    }

    fn owned_job(&mut self, user: &User, job_id: JobId) -> ApiResult<&mut Job> {
        let job = self
            .jobs
            .iter_mut()
            .find(|job| job.id == job_id)
            .ok_or_else(|| ApiError::from_status(404, "Job not found"))?;
        if job.employer_id != user.id {
            return Err(ApiError::from_status(403, "Access denied"));
        }
        Ok(job)
    }
}

/// In-memory stand-in for the job-board API with the server's rules: ownership checks,
/// duplicate application rejection, and the status state machine.
#[derive(Clone, Default)]
pub(crate) struct FakeApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeApi {
    pub(crate) fn seeded() -> Self {
        let fake = Self::default();
        {
            let mut state = fake.lock();
            state.users = vec![
                user(EMPLOYER, UserRole::Employer),
                user(OTHER_EMPLOYER, UserRole::Employer),
                user(EMPLOYEE, UserRole::Employee),
            ];
            state.jobs = vec![
                job(1, EMPLOYER, true),
                job(2, EMPLOYER, true),
                job(3, OTHER_EMPLOYER, true),
                job(4, EMPLOYER, false),
            ];
        }
        fake
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake state poisoned")
    }

    fn enter(&self, call: &'static str) -> ApiResult<std::sync::MutexGuard<'_, FakeState>> {
        let mut state = self.lock();
        state.calls.push(call);
        match state.failures.remove(call) {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }

    pub(crate) fn with_application(self, application: Application) -> Self {
        self.lock().applications.push(application);
        self
    }

    /// Make the next call to `call` fail with `error`.
    pub(crate) fn fail_next(&self, call: &'static str, error: ApiError) {
        self.lock().failures.insert(call, error);
    }

    /// Change a status behind the client's back, as another employer session would.
    pub(crate) fn set_status(&self, id: ApplicationId, status: ApplicationStatus) {
        let mut state = self.lock();
        if let Some(application) = state.applications.iter_mut().find(|app| app.id == id) {
            application.status = status;
        }
    }

    pub(crate) fn report_stats(&self, stats: ApplicationStats) {
        self.lock().reported_stats = Some(stats);
    }

    pub(crate) fn revoke_tokens(&self) {
        self.lock().tokens.clear();
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub(crate) fn count(&self, call: &str) -> usize {
        self.lock().calls.iter().filter(|name| **name == call).count()
    }

    pub(crate) fn reset_calls(&self) {
        self.lock().calls.clear();
    }

    pub(crate) fn status_of(&self, id: ApplicationId) -> Option<ApplicationStatus> {
        self.lock()
            .applications
            .iter()
            .find(|app| app.id == id)
            .map(|app| app.status)
    }
}

#[async_trait]
impl JobBoardApi for FakeApi {
    async fn login(&self, credentials: &Credentials) -> ApiResult<AuthPayload> {
        let mut state = self.enter("login")?;
        let user = state
            .users
            .iter()
            .find(|user| user.email == credentials.email)
            .cloned()
            .filter(|_| credentials.password == PASSWORD)
            .ok_or_else(|| ApiError::from_status(401, "Invalid credentials"))?;
        let token = state.issue_token(&user);
        Ok(AuthPayload { user, token })
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthPayload> {
        let mut state = self.enter("register")?;
        if state.users.iter().any(|user| user.email == request.email) {
            return Err(ApiError::from_status(400, "User already exists"));
        }
        let id = UserId(state.next_id());
        let user = User {
            id,
            email: request.email.clone(),
            name: request.name.clone(),
            user_type: request.user_type,
            created_at: timestamp(2025, 3, 1),
        };
        state.users.push(user.clone());
        let token = state.issue_token(&user);
        Ok(AuthPayload { user, token })
    }

    async fn profile(&self, token: &AuthToken) -> ApiResult<User> {
        self.enter("profile")?.authenticate(token)
    }

    async fn list_jobs(&self, token: &AuthToken) -> ApiResult<Vec<Job>> {
        let state = self.enter("list_jobs")?;
        state.authenticate(token)?;
        Ok(state.jobs.clone())
    }

    async fn get_job(&self, token: &AuthToken, job_id: JobId) -> ApiResult<Job> {
        let state = self.enter("get_job")?;
        state.authenticate(token)?;
        state
            .jobs
            .iter()
            .find(|job| job.id == job_id)
            .cloned()
            .ok_or_else(|| ApiError::from_status(404, "Job not found"))
    }

    async fn employer_jobs(&self, token: &AuthToken) -> ApiResult<Vec<Job>> {
        let state = self.enter("employer_jobs")?;
        let user = state.authenticate(token)?;
        Ok(state
            .jobs
            .iter()
            .filter(|job| job.employer_id == user.id)
            .cloned()
            .collect())
    }

    async fn create_job(&self, token: &AuthToken, draft: &JobDraft) -> ApiResult<Job> {
        let mut state = self.enter("create_job")?;
        let user = state.authenticate(token)?;
        let id = state.next_id();
        let mut created = job(id, user.id, true);
        created.title = draft.title.clone();
        created.description = draft.description.clone();
        created.location = draft.location.clone();
        state.jobs.push(created.clone());
        Ok(created)
    }

    async fn update_job(
        &self,
        token: &AuthToken,
        job_id: JobId,
        draft: &JobDraft,
    ) -> ApiResult<Job> {
        let mut state = self.enter("update_job")?;
        let user = state.authenticate(token)?;
        let job = state.owned_job(&user, job_id)?;
        job.title = draft.title.clone();
        job.description = draft.description.clone();
        job.requirements = draft.requirements.clone();
        job.location = draft.location.clone();
        job.salary = draft.salary.clone();
        Ok(job.clone())
    }

    async fn delete_job(&self, token: &AuthToken, job_id: JobId) -> ApiResult<()> {
        let mut state = self.enter("delete_job")?;
        let user = state.authenticate(token)?;
        state.owned_job(&user, job_id)?;
        state.jobs.retain(|job| job.id != job_id);
        state.applications.retain(|app| app.job_id != job_id);
        Ok(())
    }

    async fn toggle_job_active(&self, token: &AuthToken, job_id: JobId) -> ApiResult<Job> {
        let mut state = self.enter("toggle_job_active")?;
        let user = state.authenticate(token)?;
        let job = state.owned_job(&user, job_id)?;
        job.is_active = !job.is_active;
        Ok(job.clone())
    }

    async fn apply(&self, token: &AuthToken, request: &ApplyRequest) -> ApiResult<Application> {
        let mut state = self.enter("apply")?;
        let user = state.authenticate(token)?;
        if state
            .applications
            .iter()
            .any(|app| app.job_id == request.job_id && app.employee_id == user.id)
        {
            return Err(ApiError::from_status(409, "You have already applied to this job"));
        }
        let id = state.next_id();
        let mut created = application_applied_on(
            id,
            request.job_id.0,
            ApplicationStatus::Applied,
            2025,
            3,
            20,
        );
        created.employee_id = user.id;
        if let Some(resume) = &request.resume_data {
            created.resume_filename = Some(resume.filename.clone());
            created.file_size = Some(resume.size);
        }
        if let Some(details) = &request.application_data {
            created.cover_letter = Some(details.cover_letter.clone());
        }
        state.applications.push(created.clone());
        Ok(created)
    }

    async fn employee_applications(&self, token: &AuthToken) -> ApiResult<EmployeeApplications> {
        let state = self.enter("employee_applications")?;
        let user = state.authenticate(token)?;
        let applications: Vec<Application> = state
            .applications
            .iter()
            .filter(|app| app.employee_id == user.id)
            .cloned()
            .collect();
        let stats = state
            .reported_stats
            .unwrap_or_else(|| ApplicationStats::from_applications(&applications));
        Ok(EmployeeApplications {
            applications,
            stats: Some(stats),
        })
    }

    async fn employer_applications(&self, token: &AuthToken) -> ApiResult<Vec<Application>> {
        let state = self.enter("employer_applications")?;
        let user = state.authenticate(token)?;
        Ok(state
            .applications
            .iter()
            .filter(|app| state.employer_of(app.job_id) == Some(user.id))
            .cloned()
            .collect())
    }

    async fn update_application_status(
        &self,
        token: &AuthToken,
        application_id: ApplicationId,
        status: ApplicationStatus,
    ) -> ApiResult<()> {
        let mut state = self.enter("update_application_status")?;
        let user = state.authenticate(token)?;
        let job_id = state
            .applications
            .iter()
            .find(|app| app.id == application_id)
            .map(|app| app.job_id)
            .ok_or_else(|| ApiError::from_status(404, "Application not found"))?;
        if state.employer_of(job_id) != Some(user.id) {
            return Err(ApiError::from_status(403, "Access denied"));
        }
        let application = state
            .applications
            .iter_mut()
            .find(|app| app.id == application_id)
            .ok_or_else(|| ApiError::from_status(404, "Application not found"))?;
        if !application.status.can_transition_to(status) {
            return Err(ApiError::from_status(
                409,
                format!("Application is already {}", application.status),
            ));
        }
        application.status = status;
        Ok(())
    }

    async fn upload_resume(
        &self,
        token: &AuthToken,
        file: &ResumeFile,
    ) -> ApiResult<UploadedResume> {
        let mut state = self.enter("upload_resume")?;
        state.authenticate(token)?;
        let id = state.next_id();
        Ok(UploadedResume {
            filename: format!("resume-{id}.pdf"),
            original_name: file.file_name.clone(),
            url: format!("/uploads/resume-{id}.pdf"),
            size: file.size(),
        })
    }
}

pub(crate) async fn signed_in(
    fake: &FakeApi,
    user: UserId,
) -> ApplicationWorkflowService<FakeApi> {
    let mut service = ApplicationWorkflowService::new(Arc::new(fake.clone()));
    service
        .login(Credentials {
            email: format!("user{}@example.com", user.0),
            password: PASSWORD.to_string(),
        })
        .await
        .expect("seeded user signs in");
    fake.reset_calls();
    service
}
