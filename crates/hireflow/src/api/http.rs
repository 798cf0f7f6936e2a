use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::wire::{
    ApplyRequest, AuthPayload, EmployeeApplications, Envelope, ProfilePayload, RegisterRequest,
    StatusUpdate, UploadedResume,
};
use super::{ApiError, ApiResult, JobBoardApi};
use crate::config::ApiConfig;
use crate::workflows::applications::{Application, ApplicationId, ApplicationStatus, ResumeFile};
use crate::workflows::jobs::{Job, JobDraft, JobId};
use crate::workflows::session::{AuthToken, Credentials, User};

/// `reqwest`-backed [`JobBoardApi`]. No retries: failures go straight back to the caller.
#[derive(Debug, Clone)]
pub struct HttpJobBoardApi {
    client: Client,
    base_url: Url,
}

impl HttpJobBoardApi {
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ApiError::transport(format!("failed to build http client: {err}")))?;

        Ok(Self::with_client(client, config.base_url.clone()))
    }

    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&AuthToken>,
    ) -> ApiResult<RequestBuilder> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::transport(format!("invalid request path '{path}': {err}")))?;
        debug!(%method, %url, "job board request");

        let builder = self.client.request(method, url);
        Ok(match token {
            Some(token) => builder.bearer_auth(token.as_str()),
            None => builder,
        })
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        self.send_optional(builder)
            .await?
            .ok_or_else(|| ApiError::decode("response did not include a data payload"))
    }

    async fn send_empty(&self, builder: RequestBuilder) -> ApiResult<()> {
        self.send_optional::<serde_json::Value>(builder).await?;
        Ok(())
    }

    async fn send_optional<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> ApiResult<Option<T>> {
        let response = builder.send().await.map_err(transport_error)?;
        read_envelope(response).await
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::transport("request timed out")
    } else if err.is_connect() {
        ApiError::transport(format!("could not reach the job board: {err}"))
    } else {
        ApiError::transport(err.to_string())
    }
}

async fn read_envelope<T: DeserializeOwned>(response: Response) -> ApiResult<Option<T>> {
    let status = response.status();
    let body = response.bytes().await.map_err(transport_error)?;

    if !status.is_success() {
        return Err(error_from_body(status, &body));
    }

    let envelope: Envelope<T> = serde_json::from_slice(&body)
        .map_err(|err| ApiError::decode(format!("unexpected response body: {err}")))?;
    envelope.into_data()
}

fn error_from_body(status: StatusCode, body: &[u8]) -> ApiError {
    let message = serde_json::from_slice::<Envelope<serde_json::Value>>(body)
        .ok()
        .and_then(|envelope| envelope.failure_message().map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    ApiError::from_status(status.as_u16(), message)
}

#[async_trait]
impl JobBoardApi for HttpJobBoardApi {
    async fn login(&self, credentials: &Credentials) -> ApiResult<AuthPayload> {
        self.send(self.request(Method::POST, "auth/login", None)?.json(credentials))
            .await
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthPayload> {
        self.send(self.request(Method::POST, "auth/register", None)?.json(request))
            .await
    }

    async fn profile(&self, token: &AuthToken) -> ApiResult<User> {
        let payload: ProfilePayload = self
            .send(self.request(Method::GET, "auth/profile", Some(token))?)
            .await?;
        Ok(payload.user)
    }

    async fn list_jobs(&self, token: &AuthToken) -> ApiResult<Vec<Job>> {
        self.send(self.request(Method::GET, "jobs", Some(token))?)
            .await
    }

    async fn get_job(&self, token: &AuthToken, job_id: JobId) -> ApiResult<Job> {
        self.send(self.request(Method::GET, &format!("jobs/{job_id}"), Some(token))?)
            .await
    }

    async fn employer_jobs(&self, token: &AuthToken) -> ApiResult<Vec<Job>> {
        self.send(self.request(Method::GET, "employer/jobs", Some(token))?)
            .await
    }

    async fn create_job(&self, token: &AuthToken, draft: &JobDraft) -> ApiResult<Job> {
        self.send(self.request(Method::POST, "jobs", Some(token))?.json(draft))
            .await
    }

    async fn update_job(
        &self,
        token: &AuthToken,
        job_id: JobId,
        draft: &JobDraft,
    ) -> ApiResult<Job> {
        self.send(
            self.request(Method::PUT, &format!("jobs/{job_id}"), Some(token))?
                .json(draft),
        )
        .await
    }

    async fn delete_job(&self, token: &AuthToken, job_id: JobId) -> ApiResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("jobs/{job_id}"), Some(token))?)
            .await
    }

    async fn toggle_job_active(&self, token: &AuthToken, job_id: JobId) -> ApiResult<Job> {
        self.send(self.request(
            Method::PATCH,
            &format!("jobs/{job_id}/toggle-active"),
            Some(token),
        )?)
        .await
    }

    async fn apply(&self, token: &AuthToken, request: &ApplyRequest) -> ApiResult<Application> {
        self.send(
            self.request(Method::POST, "applications/apply", Some(token))?
                .json(request),
        )
        .await
    }

    async fn employee_applications(&self, token: &AuthToken) -> ApiResult<EmployeeApplications> {
        self.send(self.request(Method::GET, "employee/applications", Some(token))?)
            .await
    }

    async fn employer_applications(&self, token: &AuthToken) -> ApiResult<Vec<Application>> {
        self.send(self.request(Method::GET, "employer/applications", Some(token))?)
            .await
    }

    async fn update_application_status(
        &self,
        token: &AuthToken,
        application_id: ApplicationId,
        status: ApplicationStatus,
    ) -> ApiResult<()> {
        self.send_empty(
            self.request(
                Method::PATCH,
                &format!("applications/{application_id}/status"),
                Some(token),
            )?
            .json(&StatusUpdate { status }),
        )
        .await
    }

    async fn upload_resume(
        &self,
        token: &AuthToken,
        file: &ResumeFile,
    ) -> ApiResult<UploadedResume> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(|err| ApiError::transport(format!("invalid resume content type: {err}")))?;
        let form = Form::new().part("resume", part);

        self.send(
            self.request(Method::POST, "upload/resume", Some(token))?
                .multipart(form),
        )
        .await
    }
}
