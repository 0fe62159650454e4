use std::sync::{Arc, Mutex as StdMutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    response::Response,
    Router,
};
use tokio::sync::{watch, Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::api;
use crate::core::config::{DeliveryMode, Settings};
use crate::core::state::AppState;
use crate::schemas::identity::SessionIdentity;
use crate::schemas::question::{Question, QuestionOption};
use crate::services::delivery::{AnswerFile, DeliveryError, Uploader};
use crate::services::local_export::LocalExporter;
use crate::services::question_store::QuestionStore;
use crate::services::relay::{Relay, RelayForm};
use crate::services::submission::SubmissionPipeline;
use crate::session::{SessionController, SharedSession};

const ENV_PREFIXES: &[&str] =
    &["QUIZ_", "QUESTIONS_", "UPLOAD_", "S3_", "RELAY_", "DELIVERY_", "TEST_DURATION"];

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    shutdown_tx: watch::Sender<bool>,
    _guard: OwnedMutexGuard<()>,
}

impl TestContext {
    pub(crate) fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    let stale: Vec<String> = std::env::vars()
        .map(|(key, _)| key)
        .filter(|key| ENV_PREFIXES.iter().any(|prefix| key.starts_with(prefix)))
        .collect();
    for key in stale {
        std::env::remove_var(key);
    }
    for key in [
        "ENVIRONMENT",
        "EXPORT_DIR",
        "CONTACT_EMAIL",
        "THANK_YOU_TEMPLATE",
        "BACKEND_CORS_ORIGINS",
        "PROMETHEUS_ENABLED",
    ] {
        std::env::remove_var(key);
    }

    std::env::set_var("QUIZ_ENV", "test");
    std::env::set_var("QUIZ_STRICT_CONFIG", "0");
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    std::env::set_var("AWS_EC2_METADATA_DISABLED", "true");
}

pub(crate) fn set_test_storage_env() {
    std::env::set_var("UPLOAD_BACKEND", "s3");
    std::env::set_var("S3_ENDPOINT", "http://localhost:9000");
    std::env::set_var("S3_ACCESS_KEY", "test-access-key");
    std::env::set_var("S3_SECRET_KEY", "test-secret-key");
    std::env::set_var("S3_BUCKET", "quiz-test-bucket");
    std::env::set_var("S3_REGION", "us-east-1");
}

/// `total` questions with ids `q1..qN`, each offering options a-d.
pub(crate) fn sample_store(total: usize) -> QuestionStore {
    let questions = (1..=total)
        .map(|n| Question {
            id: format!("q{n}"),
            prompt: format!("Question number {n}?"),
            options: ["a", "b", "c", "d"]
                .iter()
                .map(|key| QuestionOption { key: key.to_string(), text: format!("Option {key}") })
                .collect(),
        })
        .collect();
    QuestionStore::from_questions(questions)
}

pub(crate) fn identity() -> SessionIdentity {
    SessionIdentity {
        name: "Ayesha".to_string(),
        phone: "03001234567".to_string(),
        extra: Default::default(),
    }
}

/// Already-registered session plus its countdown stop receiver.
pub(crate) fn registered_session(
    store: QuestionStore,
    duration_seconds: u64,
) -> (SharedSession, watch::Receiver<bool>) {
    let mut controller = SessionController::new(Arc::new(store), duration_seconds);
    let (_, stop) = controller.register(identity()).expect("register");
    (Arc::new(Mutex::new(controller)), stop)
}

pub(crate) fn shared_session(store: QuestionStore) -> SharedSession {
    registered_session(store, 3600).0
}

pub(crate) fn fake_pipeline(
    uploader: Option<Arc<FakeUploader>>,
    relay: Option<Arc<FakeRelay>>,
) -> SubmissionPipeline {
    SubmissionPipeline::new(
        DeliveryMode::Upload,
        uploader.map(|uploader| uploader as Arc<dyn Uploader>),
        LocalExporter::new(std::env::temp_dir().join(format!("quiz-export-{}", Uuid::new_v4()))),
        relay.map(|relay| relay as Arc<dyn Relay>),
        "help@example.com".to_string(),
        "Thank you, {name}!".to_string(),
    )
}

pub(crate) async fn test_app(store: QuestionStore, pipeline: SubmissionPipeline) -> TestContext {
    test_app_with_env(store, pipeline, || {}).await
}

pub(crate) async fn test_app_with_env(
    store: QuestionStore,
    pipeline: SubmissionPipeline,
    configure: impl FnOnce(),
) -> TestContext {
    let guard = env_lock().await;
    set_test_env();
    configure();

    let settings = Settings::load().expect("settings");
    let controller = SessionController::new(Arc::new(store), settings.quiz().test_duration_seconds);
    let (shutdown, shutdown_rx) = watch::channel(false);
    let state = AppState::new(
        settings,
        Arc::new(Mutex::new(controller)),
        Arc::new(pipeline),
        shutdown_rx,
    );
    let app = api::router::router(state.clone());

    TestContext { state, app, shutdown_tx: shutdown, _guard: guard }
}

pub(crate) fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub(crate) fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).expect("request")
}

pub(crate) async fn read_json(response: Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&body).expect("json body")
}

/// Records every file it is handed; either returns a fixed locator or fails.
pub(crate) struct FakeUploader {
    locator: Option<String>,
    files: StdMutex<Vec<AnswerFile>>,
}

impl FakeUploader {
    pub(crate) fn succeeding(locator: &str) -> Self {
        Self { locator: Some(locator.to_string()), files: StdMutex::new(Vec::new()) }
    }

    pub(crate) fn failing() -> Self {
        Self { locator: None, files: StdMutex::new(Vec::new()) }
    }

    pub(crate) fn calls(&self) -> usize {
        self.files.lock().expect("files lock").len()
    }

    pub(crate) fn files(&self) -> Vec<AnswerFile> {
        self.files.lock().expect("files lock").clone()
    }
}

#[async_trait]
impl Uploader for FakeUploader {
    async fn upload(&self, file: &AnswerFile) -> Result<String, DeliveryError> {
        self.files.lock().expect("files lock").push(file.clone());
        self.locator
            .clone()
            .ok_or_else(|| DeliveryError::Upload("upload endpoint unavailable".to_string()))
    }
}

pub(crate) struct FakeRelay {
    accept: bool,
    delay: Option<Duration>,
    forms: StdMutex<Vec<RelayForm>>,
}

impl FakeRelay {
    pub(crate) fn succeeding() -> Self {
        Self { accept: true, delay: None, forms: StdMutex::new(Vec::new()) }
    }

    pub(crate) fn failing() -> Self {
        Self { accept: false, delay: None, forms: StdMutex::new(Vec::new()) }
    }

    /// Accepts after `delay`, recording the form only once it answers.
    pub(crate) fn delayed(delay: Duration) -> Self {
        Self { accept: true, delay: Some(delay), forms: StdMutex::new(Vec::new()) }
    }

    pub(crate) fn forms(&self) -> Vec<RelayForm> {
        self.forms.lock().expect("forms lock").clone()
    }
}

#[async_trait]
impl Relay for FakeRelay {
    async fn notify(&self, form: &RelayForm) -> Result<(), DeliveryError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.forms.lock().expect("forms lock").push(form.clone());
        if self.accept {
            Ok(())
        } else {
            Err(DeliveryError::Relay("status 500 Internal Server Error: relay down".to_string()))
        }
    }
}
