use super::infra::{AppState, SandboxError, SandboxStore};
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Extension, Json, Router};
use hireflow::api::{ApplyRequest, Envelope, ProfilePayload, RegisterRequest, StatusUpdate};
use hireflow::workflows::applications::{ApplicationId, MAX_RESUME_BYTES};
use hireflow::workflows::jobs::{JobDraft, JobId};
use hireflow::workflows::{Credentials, User};
use serde::{Deserialize, Serialize};
use serde_json::json;

impl IntoResponse for SandboxError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(Envelope::<()>::failure(self.message()));
        (status, body).into_response()
    }
}

type ApiResponse = Result<Response, SandboxError>;

fn respond<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(Envelope::ok(data))).into_response()
}

fn respond_message(message: &str) -> Response {
    (
        StatusCode::OK,
        Json(Envelope::<()>::ok_with_message(None, message)),
    )
        .into_response()
}

fn current_user(store: &SandboxStore, headers: &HeaderMap) -> Result<User, SandboxError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| SandboxError::Unauthorized("Access token required".to_string()))?;
    store.authenticate(token)
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    email: String,
    password: String,
}

/// Job-board endpoints, rooted at `/api` once nested.
pub(crate) fn api_router(store: SandboxStore) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/profile", get(profile))
        .route("/jobs", get(list_jobs).post(create_job))
        .route(
            "/jobs/:id",
            get(get_job).put(update_job).delete(delete_job),
        )
        .route("/jobs/:id/toggle-active", patch(toggle_job))
        .route("/employer/jobs", get(employer_jobs))
        .route("/applications/apply", post(apply))
        .route("/applications/:id/status", patch(update_status))
        .route("/employee/applications", get(employee_applications))
        .route("/employer/applications", get(employer_applications))
        .route(
            "/upload/resume",
            post(upload_resume).layer(DefaultBodyLimit::max(2 * MAX_RESUME_BYTES as usize)),
        )
        .with_state(store)
}

/// Full sandbox application: API under `/api` plus operational endpoints.
pub fn app(store: SandboxStore, state: AppState) -> Router {
    Router::new()
        .nest("/api", api_router(store))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn login(State(store): State<SandboxStore>, Json(body): Json<LoginRequest>) -> ApiResponse {
    let payload = store.login(Credentials {
        email: body.email,
        password: body.password,
    })?;
    Ok(respond(StatusCode::OK, payload))
}

async fn register(
    State(store): State<SandboxStore>,
    Json(body): Json<RegisterRequest>,
) -> ApiResponse {
    Ok(respond(StatusCode::CREATED, store.register(body)?))
}

async fn profile(State(store): State<SandboxStore>, headers: HeaderMap) -> ApiResponse {
    let user = current_user(&store, &headers)?;
    Ok(respond(StatusCode::OK, ProfilePayload { user }))
}

async fn list_jobs(State(store): State<SandboxStore>, headers: HeaderMap) -> ApiResponse {
    current_user(&store, &headers)?;
    Ok(respond(StatusCode::OK, store.active_jobs()))
}

async fn get_job(
    State(store): State<SandboxStore>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResponse {
    current_user(&store, &headers)?;
    Ok(respond(StatusCode::OK, store.job(JobId(id))?))
}

async fn employer_jobs(State(store): State<SandboxStore>, headers: HeaderMap) -> ApiResponse {
    let user = current_user(&store, &headers)?;
    Ok(respond(StatusCode::OK, store.employer_jobs(&user)?))
}

async fn create_job(
    State(store): State<SandboxStore>,
    headers: HeaderMap,
    Json(draft): Json<JobDraft>,
) -> ApiResponse {
    let user = current_user(&store, &headers)?;
    Ok(respond(StatusCode::CREATED, store.create_job(&user, draft)?))
}

async fn update_job(
    State(store): State<SandboxStore>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(draft): Json<JobDraft>,
) -> ApiResponse {
    let user = current_user(&store, &headers)?;
    Ok(respond(
        StatusCode::OK,
        store.update_job(&user, JobId(id), draft)?,
    ))
}

async fn delete_job(
    State(store): State<SandboxStore>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResponse {
    let user = current_user(&store, &headers)?;
    store.delete_job(&user, JobId(id))?;
    Ok(respond_message("Job deleted successfully"))
}

async fn toggle_job(
    State(store): State<SandboxStore>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResponse {
    let user = current_user(&store, &headers)?;
    Ok(respond(StatusCode::OK, store.toggle_job(&user, JobId(id))?))
}

async fn apply(
    State(store): State<SandboxStore>,
    headers: HeaderMap,
    Json(request): Json<ApplyRequest>,
) -> ApiResponse {
    let user = current_user(&store, &headers)?;
    Ok(respond(StatusCode::CREATED, store.apply(&user, request)?))
}

async fn update_status(
    State(store): State<SandboxStore>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(update): Json<StatusUpdate>,
) -> ApiResponse {
    let user = current_user(&store, &headers)?;
    store.update_status(&user, ApplicationId(id), update.status)?;
    Ok(respond_message("Application status updated"))
}

async fn employee_applications(
    State(store): State<SandboxStore>,
    headers: HeaderMap,
) -> ApiResponse {
    let user = current_user(&store, &headers)?;
    Ok(respond(StatusCode::OK, store.employee_applications(&user)?))
}

async fn employer_applications(
    State(store): State<SandboxStore>,
    headers: HeaderMap,
) -> ApiResponse {
    let user = current_user(&store, &headers)?;
    Ok(respond(StatusCode::OK, store.employer_applications(&user)?))
}

async fn upload_resume(
    State(store): State<SandboxStore>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResponse {
    let user = current_user(&store, &headers)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| SandboxError::BadRequest(format!("invalid upload: {err}")))?
    {
        if field.name() != Some("resume") {
            continue;
        }
        let original_name = field.file_name().unwrap_or("resume").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| SandboxError::BadRequest(format!("invalid upload: {err}")))?;

        let uploaded = store.store_resume(&user, original_name, &mime_type, bytes.len() as u64)?;
        return Ok(respond(StatusCode::CREATED, uploaded));
    }

    Err(SandboxError::BadRequest("No file uploaded".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_app(ready: bool) -> Router {
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        app(SandboxStore::default(), state)
    }

    async fn read_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = test_app(true)
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let response = test_app(false)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized_envelope() {
        let response = test_app(true)
            .oneshot(
                Request::get("/api/employer/applications")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = read_json(response).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Access token required"));
    }

    #[tokio::test]
    async fn register_returns_user_and_token() {
        let response = test_app(true)
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                None,
                json!({
                    "email": "hr@acme.test",
                    "password": "hunter22",
                    "name": "Acme HR",
                    "user_type": "employer"
                }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["user"]["user_type"], json!("employer"));
        assert!(body["data"]["token"]
            .as_str()
            .is_some_and(|token| token.starts_with("tok-")));
    }

    #[tokio::test]
    async fn invalid_registration_is_bad_request() {
        let response = test_app(true)
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                None,
                json!({
                    "email": "not-an-email",
                    "password": "abc",
                    "name": "",
                    "user_type": "employee"
                }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn employees_cannot_post_jobs() {
        let store = SandboxStore::default();
        let payload = store
            .register(RegisterRequest {
                email: "dev@mail.test".to_string(),
                password: "hunter22".to_string(),
                name: "Dev".to_string(),
                user_type: hireflow::workflows::UserRole::Employee,
            })
            .expect("registers");

        let response = api_router(store)
            .oneshot(json_request(
                "POST",
                "/jobs",
                Some(payload.token.as_str()),
                json!({
                    "title": "Ops",
                    "description": "Run things",
                    "requirements": "",
                    "location": "Remote",
                    "salary": ""
                }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
