use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use hireflow::api::{
    ApiError, ApiResult, ApplyRequest, AuthPayload, EmployeeApplications, JobBoardApi,
    RegisterRequest, UploadedResume,
};
use hireflow::workflows::applications::{
    Application, ApplicationId, ApplicationStatus, ApplicationWorkflowService, ResumeFile,
};
use hireflow::workflows::jobs::{Job, JobDraft, JobId};
use hireflow::workflows::{AuthToken, Credentials, User, UserId, UserRole, WorkflowError};

const TOKEN: &str = "tok-hr";

/// One employer, one posting, and whatever applications the test seeds. Only the endpoints
/// an employer reviewing applications touches are answered.
#[derive(Clone)]
struct ScriptedBoard {
    applications: Arc<Mutex<Vec<Application>>>,
}

impl ScriptedBoard {
    fn with_statuses(statuses: &[ApplicationStatus]) -> Self {
        let applications = statuses
            .iter()
            .enumerate()
            .map(|(index, status)| application(index as i64 + 1, *status))
            .collect();
        Self {
            applications: Arc::new(Mutex::new(applications)),
        }
    }

    /// Another session moves the application on the server.
    fn decide_elsewhere(&self, id: ApplicationId, status: ApplicationStatus) {
        let mut applications = self.applications.lock().expect("board poisoned");
        if let Some(application) = applications.iter_mut().find(|app| app.id == id) {
            application.status = status;
        }
    }
}

fn employer() -> User {
    User {
        id: UserId(1),
        email: "hr@acme.test".to_string(),
        name: "Acme HR".to_string(),
        user_type: UserRole::Employer,
        created_at: Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).single().expect("valid"),
    }
}

fn posting() -> Job {
    Job {
        id: JobId(7),
        employer_id: UserId(1),
        title: "Backend Engineer".to_string(),
        description: "Own the hiring pipeline API".to_string(),
        requirements: "Rust".to_string(),
        location: "Remote".to_string(),
        salary: "$140k".to_string(),
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).single().expect("valid"),
        is_active: true,
        employer_name: Some("Acme HR".to_string()),
    }
}

fn application(id: i64, status: ApplicationStatus) -> Application {
    let at = Utc.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).single().expect("valid");
    Application {
        id: ApplicationId(id),
        job_id: JobId(7),
        employee_id: UserId(100 + id),
        status,
        applied_at: at,
        updated_at: at,
        job_title: Some("Backend Engineer".to_string()),
        employer_name: None,
        employee_name: Some(format!("candidate {id}")),
        resume_filename: None,
        resume_url: None,
        file_size: None,
        cover_letter: None,
        phone_number: None,
        location: None,
    }
}

fn authorized(token: &AuthToken) -> ApiResult<()> {
    if token.as_str() == TOKEN {
        Ok(())
    } else {
        Err(ApiError::from_status(401, "Invalid token"))
    }
}

fn unsupported<T>() -> ApiResult<T> {
    Err(ApiError::from_status(501, "not scripted"))
}

#[async_trait]
impl JobBoardApi for ScriptedBoard {
    async fn login(&self, credentials: &Credentials) -> ApiResult<AuthPayload> {
        if credentials.email != employer().email {
            return Err(ApiError::from_status(401, "Invalid credentials"));
        }
        Ok(AuthPayload {
            user: employer(),
            token: AuthToken::new(TOKEN),
        })
    }

    async fn register(&self, _request: &RegisterRequest) -> ApiResult<AuthPayload> {
        unsupported()
    }

    async fn profile(&self, token: &AuthToken) -> ApiResult<User> {
        authorized(token)?;
        Ok(employer())
    }

    async fn list_jobs(&self, _token: &AuthToken) -> ApiResult<Vec<Job>> {
        unsupported()
    }

    async fn get_job(&self, _token: &AuthToken, _job_id: JobId) -> ApiResult<Job> {
        unsupported()
    }

    async fn employer_jobs(&self, token: &AuthToken) -> ApiResult<Vec<Job>> {
        authorized(token)?;
        Ok(vec![posting()])
    }

    async fn create_job(&self, _token: &AuthToken, _draft: &JobDraft) -> ApiResult<Job> {
        unsupported()
    }

    async fn update_job(
        &self,
        _token: &AuthToken,
        _job_id: JobId,
        _draft: &JobDraft,
    ) -> ApiResult<Job> {
        unsupported()
    }

    async fn delete_job(&self, _token: &AuthToken, _job_id: JobId) -> ApiResult<()> {
        unsupported()
    }

    async fn toggle_job_active(&self, _token: &AuthToken, _job_id: JobId) -> ApiResult<Job> {
        unsupported()
    }

    async fn apply(&self, _token: &AuthToken, _request: &ApplyRequest) -> ApiResult<Application> {
        unsupported()
    }

    async fn employee_applications(&self, _token: &AuthToken) -> ApiResult<EmployeeApplications> {
        unsupported()
    }

    async fn employer_applications(&self, token: &AuthToken) -> ApiResult<Vec<Application>> {
        authorized(token)?;
        Ok(self.applications.lock().expect("board poisoned").clone())
    }

    async fn update_application_status(
        &self,
        token: &AuthToken,
        application_id: ApplicationId,
        status: ApplicationStatus,
    ) -> ApiResult<()> {
        authorized(token)?;
        let mut applications = self.applications.lock().expect("board poisoned");
        let application = applications
            .iter_mut()
            .find(|app| app.id == application_id)
            .ok_or_else(|| ApiError::from_status(404, "Application not found"))?;
        if !application.status.can_transition_to(status) {
            return Err(ApiError::from_status(409, "Status changed"));
        }
        application.status = status;
        Ok(())
    }

    async fn upload_resume(
        &self,
        _token: &AuthToken,
        _file: &ResumeFile,
    ) -> ApiResult<UploadedResume> {
        unsupported()
    }
}

async fn reviewer(board: &ScriptedBoard) -> ApplicationWorkflowService<ScriptedBoard> {
    let mut service = ApplicationWorkflowService::new(Arc::new(board.clone()));
    service
        .login(Credentials {
            email: "hr@acme.test".to_string(),
            password: "hunter22".to_string(),
        })
        .await
        .expect("employer signs in");
    service.refresh_jobs().await.expect("own jobs");
    service.ensure_applications().await.expect("applications");
    service
}

#[tokio::test]
async fn employer_walks_an_application_to_an_offer() {
    let board = ScriptedBoard::with_statuses(&[
        ApplicationStatus::Applied,
        ApplicationStatus::Rejected,
    ]);
    let mut employer = reviewer(&board).await;
    let id = ApplicationId(1);

    assert_eq!(
        employer.available_actions(id),
        &[
            ApplicationStatus::Viewed,
            ApplicationStatus::Shortlisted,
            ApplicationStatus::Rejected
        ]
    );

    for next in [
        ApplicationStatus::Viewed,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Accepted,
    ] {
        let outcome = employer.transition(id, next).await.expect("accepted");
        assert_eq!(outcome.plan.to, next);
        assert!(outcome.refreshed);
    }

    assert!(employer.available_actions(id).is_empty());
    let stats = employer.stats();
    assert_eq!((stats.total, stats.accepted, stats.rejected), (2, 1, 1));
}

#[tokio::test]
async fn concurrent_decision_surfaces_as_conflict() {
    let board = ScriptedBoard::with_statuses(&[ApplicationStatus::Applied]);
    let mut first = reviewer(&board).await;
    let mut second = reviewer(&board).await;
    let id = ApplicationId(1);

    first
        .transition(id, ApplicationStatus::Rejected)
        .await
        .expect("first tab rejects");

    let error = second
        .transition(id, ApplicationStatus::Shortlisted)
        .await
        .expect_err("stale tab conflicts");
    match error {
        WorkflowError::StateConflict { server_status, .. } => {
            assert_eq!(server_status, Some(ApplicationStatus::Rejected));
        }
        other => panic!("expected conflict, got {other:?}"),
    }
    assert!(second.available_actions(id).is_empty());
}

#[tokio::test]
async fn decision_made_elsewhere_is_picked_up_on_refresh() {
    let board = ScriptedBoard::with_statuses(&[ApplicationStatus::Viewed]);
    let mut employer = reviewer(&board).await;

    board.decide_elsewhere(ApplicationId(1), ApplicationStatus::Shortlisted);
    assert_eq!(employer.stats().viewed, 1);

    employer.refresh_applications().await.expect("refresh");
    assert_eq!(employer.stats().shortlisted, 1);
    assert_eq!(
        employer.available_actions(ApplicationId(1)),
        &[ApplicationStatus::Accepted, ApplicationStatus::Rejected]
    );
}

#[tokio::test]
async fn restored_session_uses_profile() {
    let board = ScriptedBoard::with_statuses(&[]);
    let mut restored = ApplicationWorkflowService::new(Arc::new(board.clone()));

    let user = restored
        .restore(AuthToken::new(TOKEN))
        .await
        .expect("token still valid");
    assert_eq!(user.id, UserId(1));
    assert_eq!(restored.session().landing_path(), "/employer/dashboard");

    let mut stale = ApplicationWorkflowService::new(Arc::new(board));
    assert!(matches!(
        stale.restore(AuthToken::new("tok-404")).await,
        Err(WorkflowError::Api(_))
    ));
}
