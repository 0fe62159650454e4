use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::config::Settings;
use crate::services::submission::SubmissionPipeline;
use crate::session::SharedSession;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    session: SharedSession,
    pipeline: Arc<SubmissionPipeline>,
    shutdown: watch::Receiver<bool>,
    countdown: StdMutex<Option<JoinHandle<()>>>,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        session: SharedSession,
        pipeline: Arc<SubmissionPipeline>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self { inner: Arc::new(InnerState {
                settings,
                session,
                pipeline,
                shutdown,
                countdown: StdMutex::new(None),
            }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn session(&self) -> &SharedSession {
        &self.inner.session
    }

    pub(crate) fn pipeline(&self) -> &Arc<SubmissionPipeline> {
        &self.inner.pipeline
    }

    /// Fresh receiver for background tasks that must stop with the server.
    pub(crate) fn shutdown(&self) -> watch::Receiver<bool> {
        self.inner.shutdown.clone()
    }

    pub(crate) fn track_countdown(&self, handle: JoinHandle<()>) {
        let mut slot = self.inner.countdown.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.replace(handle).is_some() {
            tracing::warn!("Replaced a countdown driver that was still tracked");
        }
    }

    /// Waits for the countdown driver, if one was started. Call after the
    /// shutdown watch has been flipped.
    pub(crate) async fn join_countdown(&self) {
        let handle = self
            .inner
            .countdown
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "Countdown driver task failed");
            }
        }
    }
}
