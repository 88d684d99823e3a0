use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use claim_flow::{
    AuthForm, ClaimAttachment, ClaimFormSnapshot, ClaimSubmissionResponse, FieldIssue, FormRecord,
    IncidentType, Session, SessionRunner, WizardError, WizardStep, auth_schema, get_schema_for,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::registry::ClaimRegistry;

#[derive(Clone)]
pub struct AppState {
    pub runner: SessionRunner,
    pub registry: ClaimRegistry,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/steps/{step}", patch(update_fields))
        .route("/sessions/{id}/steps/{step}/submit", post(submit_step))
        .route("/sessions/{id}/navigate", post(navigate))
        .route("/sessions/{id}/reset", post(reset_session))
        .route("/sessions/{id}/submit", post(submit_claim))
        .route("/schemas/incident-details", get(incident_details_schema))
        .route("/auth/{form}/validate", post(validate_auth_form))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Maps wizard failures onto HTTP responses
pub struct ApiError(WizardError);

impl From<WizardError> for ApiError {
    fn from(err: WizardError) -> Self {
        Self(err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    issues: Vec<FieldIssue>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            WizardError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            WizardError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WizardError::UnknownStep(_)
            | WizardError::UnknownIncidentType(_)
            | WizardError::UnknownAuthForm(_)
            | WizardError::NotAnObject => StatusCode::BAD_REQUEST,
            WizardError::StepNotCurrent { .. }
            | WizardError::StepNotCompleted(_)
            | WizardError::IncompleteClaim(_)
            | WizardError::AlreadySubmitted(_) => StatusCode::CONFLICT,
            WizardError::UploadFailed(_) => StatusCode::BAD_REQUEST,
            WizardError::SubmissionFailed(_) => StatusCode::BAD_GATEWAY,
        };

        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        let issues = match &self.0 {
            WizardError::Validation(errors) => errors.issues.clone(),
            _ => Vec::new(),
        };
        let body = ErrorBody {
            error: self.0.to_string(),
            message: self.0.user_message(),
            issues,
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub current_step: WizardStep,
    pub completed_steps: Vec<WizardStep>,
    pub can_go_next: bool,
    pub can_go_previous: bool,
    pub form_data: ClaimFormSnapshot,
    pub submission: Option<ClaimSubmissionResponse>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        let state = session.wizard.state();
        Self {
            session_id: session.id.clone(),
            current_step: state.current_step(),
            completed_steps: state.completed_steps(),
            can_go_next: state.can_go_next(),
            can_go_previous: state.can_go_previous(),
            form_data: state.get_all_form_data(),
            submission: session.submission.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum NavigateRequest {
    Next,
    Previous,
    Jump { step: WizardStep },
}

#[derive(Debug, Default, Deserialize)]
struct SubmitRequest {
    #[serde(default)]
    attachment: Option<ClaimAttachment>,
}

#[derive(Debug, Deserialize)]
struct SchemaQuery {
    incident_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct AuthValidation {
    form: AuthForm,
    valid: bool,
}

#[derive(Debug, Serialize)]
struct SchemaSummary {
    incident_type: Option<IncidentType>,
    required: Vec<String>,
    optional: Vec<String>,
    additional_required_labels: Vec<&'static str>,
}

async fn health_check() -> &'static str {
    "OK"
}

async fn load_view(state: &AppState, session_id: &str) -> ApiResult<SessionView> {
    let session = state.runner.load(session_id).await?;
    Ok(Json(SessionView::from(&session)))
}

async fn create_session(State(state): State<AppState>) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let session = state.runner.create().await?;
    Ok((StatusCode::CREATED, Json(SessionView::from(&session))))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionView> {
    load_view(&state, &session_id).await
}

async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.runner.delete(&session_id).await?;
    info!(session_id = %session_id, "claim session deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn update_fields(
    State(state): State<AppState>,
    Path((session_id, step)): Path<(String, String)>,
    Json(values): Json<Value>,
) -> ApiResult<SessionView> {
    let step: WizardStep = step.parse()?;
    let record = FormRecord::try_from(values)?;
    state
        .runner
        .run(&session_id, |wizard| {
            wizard.update_fields(step, record);
            Ok(())
        })
        .await?;
    load_view(&state, &session_id).await
}

async fn submit_step(
    State(state): State<AppState>,
    Path((session_id, step)): Path<(String, String)>,
    Json(values): Json<Value>,
) -> ApiResult<SessionView> {
    let step: WizardStep = step.parse()?;
    let record = FormRecord::try_from(values)?;
    let next = state
        .runner
        .run(&session_id, |wizard| wizard.submit_step(step, record))
        .await?;
    info!(session_id = %session_id, step = %step, next = %next, "step submitted");
    load_view(&state, &session_id).await
}

async fn navigate(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<NavigateRequest>,
) -> ApiResult<SessionView> {
    state
        .runner
        .run(&session_id, |wizard| match request {
            NavigateRequest::Next => Ok(wizard.next()),
            NavigateRequest::Previous => Ok(wizard.previous()),
            NavigateRequest::Jump { step } => wizard.jump_to(step),
        })
        .await?;
    load_view(&state, &session_id).await
}

async fn reset_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionView> {
    let session = state.runner.reset(&session_id).await?;
    Ok(Json(SessionView::from(&session)))
}

async fn submit_claim(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SubmitRequest>,
) -> ApiResult<ClaimSubmissionResponse> {
    let response = state
        .runner
        .submit(&session_id, &state.registry, request.attachment)
        .await?;
    Ok(Json(response))
}

async fn incident_details_schema(Query(query): Query<SchemaQuery>) -> Json<SchemaSummary> {
    let incident_type = IncidentType::from_tag(query.incident_type.as_deref());
    let schema = get_schema_for(incident_type);
    Json(SchemaSummary {
        incident_type,
        required: schema.required_fields().into_iter().map(String::from).collect(),
        optional: schema.optional_fields().into_iter().map(String::from).collect(),
        additional_required_labels: incident_type
            .map(|t| t.required_field_labels().to_vec())
            .unwrap_or_default(),
    })
}

async fn validate_auth_form(
    Path(form): Path<String>,
    Json(values): Json<Value>,
) -> ApiResult<AuthValidation> {
    let form: AuthForm = form.parse()?;
    let record = FormRecord::try_from(values)?;
    auth_schema(form).validate(&record).map_err(WizardError::from)?;
    Ok(Json(AuthValidation { form, valid: true }))
}
