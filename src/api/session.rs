use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::schemas::answer::{AnswerPayload, SubmitTrigger};
use crate::schemas::identity::{RegistrationRequest, SessionIdentity};
use crate::schemas::session::{ExportResponse, SelectOptionRequest, SessionView};
use crate::services::submission;
use crate::tasks::countdown;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(current_view))
        .route("/register", post(register))
        .route("/next", post(next))
        .route("/previous", post(previous))
        .route("/select", post(select))
        .route("/submit", post(submit))
        .route("/payload", get(payload))
        .route("/export", post(export))
}

async fn current_view(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.session().lock().await.view())
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegistrationRequest>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let identity = SessionIdentity::from(payload);

    let mut session = state.session().lock().await;
    let (session_id, stop) = session.register(identity)?;
    state.track_countdown(countdown::spawn(
        state.session().clone(),
        state.pipeline().clone(),
        stop,
        state.shutdown(),
    ));

    tracing::info!(
        %session_id,
        total_questions = session.total_questions(),
        duration_seconds = state.settings().quiz().test_duration_seconds,
        "Session registered; countdown started"
    );

    Ok((StatusCode::CREATED, Json(session.view())))
}

async fn next(State(state): State<AppState>) -> Result<Json<SessionView>, ApiError> {
    let mut session = state.session().lock().await;
    session.next()?;
    Ok(Json(session.view()))
}

async fn previous(State(state): State<AppState>) -> Result<Json<SessionView>, ApiError> {
    let mut session = state.session().lock().await;
    session.previous()?;
    Ok(Json(session.view()))
}

async fn select(
    State(state): State<AppState>,
    Json(payload): Json<SelectOptionRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let mut session = state.session().lock().await;
    session.select(payload.option.trim())?;
    Ok(Json(session.view()))
}

async fn submit(State(state): State<AppState>) -> Result<Json<SessionView>, ApiError> {
    submission::submit(state.session(), state.pipeline(), SubmitTrigger::Manual).await?;
    Ok(Json(state.session().lock().await.view()))
}

async fn payload(State(state): State<AppState>) -> Result<Json<AnswerPayload>, ApiError> {
    let session = state.session().lock().await;
    let prepared = session
        .prepared()
        .ok_or_else(|| ApiError::NotFound("Answers have not been submitted yet".to_string()))?;
    Ok(Json(prepared.payload.clone()))
}

/// Manual fallback: writes the retained answer file to the export directory.
async fn export(State(state): State<AppState>) -> Result<Json<ExportResponse>, ApiError> {
    let file = {
        let session = state.session().lock().await;
        session
            .prepared()
            .map(|prepared| prepared.file.clone())
            .ok_or_else(|| ApiError::NotFound("Answers have not been submitted yet".to_string()))?
    };

    let path = state
        .pipeline()
        .exporter()
        .save(&file)
        .await
        .map_err(|err| ApiError::internal(err, "Failed to export answers"))?;

    Ok(Json(ExportResponse { filename: file.filename, path: path.display().to_string() }))
}
