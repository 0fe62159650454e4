pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod schemas;
pub(crate) mod services;
pub(crate) mod session;
pub(crate) mod tasks;

#[cfg(test)]
mod test_support;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::{watch, Mutex};

use crate::core::{config::Settings, state::AppState, telemetry};
use crate::services::question_store;
use crate::services::submission::SubmissionPipeline;
use crate::session::SessionController;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let store = question_store::load(
        &settings.quiz().questions_source,
        settings.quiz().questions_load_retries,
        Duration::from_secs(settings.delivery().timeout_seconds),
    )
    .await
    .context("Failed to load questions; registration will not be offered")?;

    let pipeline = SubmissionPipeline::from_settings(&settings).await?;
    let session = SessionController::new(Arc::new(store), settings.quiz().test_duration_seconds);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let state =
        AppState::new(settings, Arc::new(Mutex::new(session)), Arc::new(pipeline), shutdown_rx);

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        delivery_mode = state.settings().delivery().mode.as_str(),
        "Quiz session listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(core::shutdown::shutdown_signal(shutdown_tx))
        .await?;

    state.join_countdown().await;
    tracing::info!("Quiz session stopped");

    Ok(())
}

/// Loads and validates a question source without starting the server.
/// Returns the number of questions it holds.
pub async fn check_questions(source: &str, retries: u32, timeout: Duration) -> anyhow::Result<usize> {
    let store = question_store::load(source, retries, timeout)
        .await
        .with_context(|| format!("Question source {source} failed validation"))?;
    Ok(store.len())
}
