use chrono::Utc;
use hireflow::api::{
    ApplyRequest, AuthPayload, EmployeeApplications, RegisterRequest, UploadedResume,
};
use hireflow::workflows::applications::{
    check_resume, Application, ApplicationId, ApplicationStats, ApplicationStatus,
};
use hireflow::workflows::jobs::{Job, JobDraft, JobId};
use hireflow::workflows::{AuthToken, Credentials, Registration, User, UserId, UserRole};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub readiness: Arc<AtomicBool>,
    pub metrics: Arc<PrometheusHandle>,
}

/// Failure classes of the sandbox API, one per HTTP status it answers with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Unprocessable(String),
}

impl SandboxError {
    pub fn status_code(&self) -> u16 {
        match self {
            SandboxError::BadRequest(_) => 400,
            SandboxError::Unauthorized(_) => 401,
            SandboxError::Forbidden(_) => 403,
            SandboxError::NotFound(_) => 404,
            SandboxError::Conflict(_) => 409,
            SandboxError::Unprocessable(_) => 422,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            SandboxError::BadRequest(message)
            | SandboxError::Unauthorized(message)
            | SandboxError::Forbidden(message)
            | SandboxError::NotFound(message)
            | SandboxError::Conflict(message)
            | SandboxError::Unprocessable(message) => message,
        }
    }
}

impl fmt::Display for SandboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.status_code())
    }
}

impl std::error::Error for SandboxError {}

type SandboxResult<T> = Result<T, SandboxError>;

struct Account {
    user: User,
    password: String,
}

struct StoredResume {
    owner: UserId,
    original_name: String,
    size: u64,
}

#[derive(Default)]
struct BoardState {
    accounts: Vec<Account>,
    tokens: HashMap<String, UserId>,
    jobs: BTreeMap<JobId, Job>,
    applications: BTreeMap<ApplicationId, Application>,
    resumes: HashMap<String, StoredResume>,
    next_id: i64,
}

impl BoardState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: UserId) -> Option<&User> {
        self.accounts
            .iter()
            .map(|account| &account.user)
            .find(|user| user.id == id)
    }

    fn job(&self, id: JobId) -> SandboxResult<&Job> {
        self.jobs
            .get(&id)
            .ok_or_else(|| SandboxError::NotFound("Job not found".to_string()))
    }

    fn owned_job_mut(&mut self, user: &User, id: JobId) -> SandboxResult<&mut Job> {
        let job = self
            .jobs
            .get_mut(&id)
            .ok_or_else(|| SandboxError::NotFound("Job not found".to_string()))?;
        if !job.is_owned_by(user.id) {
            return Err(SandboxError::Forbidden("Access denied".to_string()));
        }
        Ok(job)
    }
}

/// In-memory job board enforcing the API's rules server-side.
#[derive(Clone, Default)]
pub struct SandboxStore {
    state: Arc<Mutex<BoardState>>,
    token_counter: Arc<AtomicU64>,
}

fn require_role(user: &User, role: UserRole) -> SandboxResult<()> {
    if user.user_type == role {
        Ok(())
    } else {
        Err(SandboxError::Forbidden(format!(
            "Only {} accounts can do this",
            role.label()
        )))
    }
}

fn validation_failure(errors: hireflow::workflows::ValidationErrors) -> SandboxError {
    SandboxError::BadRequest(errors.to_string())
}

impl SandboxStore {
    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().expect("sandbox mutex poisoned")
    }

    fn issue_token(&self, state: &mut BoardState, user: &User) -> AuthToken {
        let serial = self.token_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let token = format!("tok-{serial:06}-{}", user.id);
        state.tokens.insert(token.clone(), user.id);
        AuthToken::new(token)
    }

    pub fn register(&self, request: RegisterRequest) -> SandboxResult<AuthPayload> {
        Registration {
            email: request.email.clone(),
            password: request.password.clone(),
            confirm_password: request.password.clone(),
            name: request.name.clone(),
            role: request.user_type,
        }
        .validate()
        .map_err(validation_failure)?;

        let mut state = self.lock();
        if state
            .accounts
            .iter()
            .any(|account| account.user.email.eq_ignore_ascii_case(&request.email))
        {
            return Err(SandboxError::BadRequest("User already exists".to_string()));
        }

        let user = User {
            id: UserId(state.next_id()),
            email: request.email,
            name: request.name,
            user_type: request.user_type,
            created_at: Utc::now(),
        };
        state.accounts.push(Account {
            user: user.clone(),
            password: request.password,
        });
        let token = self.issue_token(&mut state, &user);
        info!(user_id = %user.id, role = %user.user_type, "sandbox account registered");
        Ok(AuthPayload { user, token })
    }

    pub fn login(&self, credentials: Credentials) -> SandboxResult<AuthPayload> {
        let mut state = self.lock();
        let user = state
            .accounts
            .iter()
            .find(|account| {
                account.user.email.eq_ignore_ascii_case(credentials.email.trim())
                    && account.password == credentials.password
            })
            .map(|account| account.user.clone())
            .ok_or_else(|| SandboxError::Unauthorized("Invalid credentials".to_string()))?;
        let token = self.issue_token(&mut state, &user);
        Ok(AuthPayload { user, token })
    }

    pub fn authenticate(&self, token: &str) -> SandboxResult<User> {
        let state = self.lock();
        state
            .tokens
            .get(token)
            .and_then(|id| state.user(*id))
            .cloned()
            .ok_or_else(|| SandboxError::Unauthorized("Invalid or expired token".to_string()))
    }

    pub fn active_jobs(&self) -> Vec<Job> {
        let state = self.lock();
        state
            .jobs
            .values()
            .filter(|job| job.is_active)
            .cloned()
            .collect()
    }

    pub fn job(&self, id: JobId) -> SandboxResult<Job> {
        self.lock().job(id).cloned()
    }

    pub fn employer_jobs(&self, user: &User) -> SandboxResult<Vec<Job>> {
        require_role(user, UserRole::Employer)?;
        let state = self.lock();
        Ok(state
            .jobs
            .values()
            .filter(|job| job.is_owned_by(user.id))
            .cloned()
            .collect())
    }

    pub fn create_job(&self, user: &User, draft: JobDraft) -> SandboxResult<Job> {
        require_role(user, UserRole::Employer)?;
        draft.validate().map_err(validation_failure)?;

        let mut state = self.lock();
        let job = Job {
            id: JobId(state.next_id()),
            employer_id: user.id,
            title: draft.title,
            description: draft.description,
            requirements: draft.requirements,
            location: draft.location,
            salary: draft.salary,
            created_at: Utc::now(),
            is_active: true,
            employer_name: Some(user.name.clone()),
        };
        state.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    pub fn update_job(&self, user: &User, id: JobId, draft: JobDraft) -> SandboxResult<Job> {
        require_role(user, UserRole::Employer)?;
        draft.validate().map_err(validation_failure)?;

        let mut state = self.lock();
        let job = state.owned_job_mut(user, id)?;
        job.title = draft.title;
        job.description = draft.description;
        job.requirements = draft.requirements;
        job.location = draft.location;
        job.salary = draft.salary;
        Ok(job.clone())
    }

    pub fn toggle_job(&self, user: &User, id: JobId) -> SandboxResult<Job> {
        require_role(user, UserRole::Employer)?;
        let mut state = self.lock();
        let job = state.owned_job_mut(user, id)?;
        job.is_active = !job.is_active;
        Ok(job.clone())
    }

    /// Remove a job together with every application submitted to it.
    pub fn delete_job(&self, user: &User, id: JobId) -> SandboxResult<()> {
        require_role(user, UserRole::Employer)?;
        let mut state = self.lock();
        state.owned_job_mut(user, id)?;
        state.jobs.remove(&id);
        let before = state.applications.len();
        state.applications.retain(|_, application| application.job_id != id);
        info!(
            job_id = %id,
            removed_applications = before - state.applications.len(),
            "sandbox job deleted"
        );
        Ok(())
    }

    pub fn store_resume(
        &self,
        user: &User,
        original_name: String,
        mime_type: &str,
        size: u64,
    ) -> SandboxResult<UploadedResume> {
        require_role(user, UserRole::Employee)?;
        if size == 0 {
            return Err(SandboxError::Unprocessable("Resume file is empty".to_string()));
        }
        check_resume(mime_type, size)
            .map_err(|err| SandboxError::Unprocessable(err.to_string()))?;

        let mut state = self.lock();
        let serial = state.next_id();
        let extension = original_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_else(|| "bin".to_string());
        let filename = format!("resume-{}-{serial}.{extension}", user.id);
        state.resumes.insert(
            filename.clone(),
            StoredResume {
                owner: user.id,
                original_name: original_name.clone(),
                size,
            },
        );

        Ok(UploadedResume {
            url: format!("/uploads/{filename}"),
            filename,
            original_name,
            size,
        })
    }

    pub fn apply(&self, user: &User, request: ApplyRequest) -> SandboxResult<Application> {
        require_role(user, UserRole::Employee)?;
        let mut state = self.lock();

        let job = state.job(request.job_id)?;
        if !job.is_active {
            return Err(SandboxError::BadRequest(
                "This job is no longer accepting applications".to_string(),
            ));
        }
        let job_title = job.title.clone();
        let employer_name = state.user(job.employer_id).map(|owner| owner.name.clone());

        if state
            .applications
            .values()
            .any(|existing| existing.job_id == request.job_id && existing.employee_id == user.id)
        {
            return Err(SandboxError::Conflict(
                "You have already applied to this job".to_string(),
            ));
        }

        let resume = match &request.resume_data {
            Some(reference) => {
                let stored = state
                    .resumes
                    .get(&reference.filename)
                    .filter(|stored| stored.owner == user.id)
                    .ok_or_else(|| {
                        SandboxError::Unprocessable("Unknown resume upload".to_string())
                    })?;
                Some((
                    reference.filename.clone(),
                    stored.original_name.clone(),
                    stored.size,
                ))
            }
            None => None,
        };

        let details = request.application_data.unwrap_or_default();
        let now = Utc::now();
        let application = Application {
            id: ApplicationId(state.next_id()),
            job_id: request.job_id,
            employee_id: user.id,
            status: ApplicationStatus::Applied,
            applied_at: now,
            updated_at: now,
            job_title: Some(job_title),
            employer_name,
            employee_name: Some(user.name.clone()),
            resume_url: resume
                .as_ref()
                .map(|(filename, _, _)| format!("/uploads/{filename}")),
            file_size: resume.as_ref().map(|(_, _, size)| *size),
            resume_filename: resume.map(|(_, original_name, _)| original_name),
            cover_letter: non_empty(details.cover_letter),
            phone_number: non_empty(details.phone_number),
            location: non_empty(details.location),
        };
        state
            .applications
            .insert(application.id, application.clone());
        info!(
            application_id = %application.id,
            job_id = %application.job_id,
            "sandbox application received"
        );
        Ok(application)
    }

    pub fn employee_applications(&self, user: &User) -> SandboxResult<EmployeeApplications> {
        require_role(user, UserRole::Employee)?;
        let state = self.lock();
        let applications: Vec<Application> = state
            .applications
            .values()
            .filter(|application| application.employee_id == user.id)
            .cloned()
            .collect();
        let stats = ApplicationStats::from_applications(&applications);
        Ok(EmployeeApplications {
            applications,
            stats: Some(stats),
        })
    }

    pub fn employer_applications(&self, user: &User) -> SandboxResult<Vec<Application>> {
        require_role(user, UserRole::Employer)?;
        let state = self.lock();
        Ok(state
            .applications
            .values()
            .filter(|application| {
                state
                    .jobs
                    .get(&application.job_id)
                    .is_some_and(|job| job.is_owned_by(user.id))
            })
            .cloned()
            .collect())
    }

    /// Apply a status change along the transition table. Anything else is a conflict with
    /// the stored status.
    pub fn update_status(
        &self,
        user: &User,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> SandboxResult<()> {
        require_role(user, UserRole::Employer)?;
        let mut state = self.lock();

        let job_id = state
            .applications
            .get(&id)
            .map(|application| application.job_id)
            .ok_or_else(|| SandboxError::NotFound("Application not found".to_string()))?;
        if !state.job(job_id)?.is_owned_by(user.id) {
            return Err(SandboxError::Forbidden("Access denied".to_string()));
        }

        let application = state
            .applications
            .get_mut(&id)
            .ok_or_else(|| SandboxError::NotFound("Application not found".to_string()))?;
        let current = application.status;
        if !current.can_transition_to(status) {
            return Err(SandboxError::Conflict(format!(
                "Application is {current} and cannot move to {status}"
            )));
        }

        application.status = status;
        application.updated_at = Utc::now();
        info!(application_id = %id, from = %current, to = %status, "sandbox status updated");
        Ok(())
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
