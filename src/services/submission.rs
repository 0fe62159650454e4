use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::core::config::{DeliveryMode, Settings, UploadBackend};
use crate::core::metrics;
use crate::core::time::{format_offset, now_utc, unix_millis};
use crate::schemas::answer::{AnswerPayload, AnswerRecord, SubmitTrigger};
use crate::schemas::identity::SessionIdentity;
use crate::services::delivery::{AnswerFile, DeliveryError, DeliveryReceipt, Uploader};
use crate::services::direct_upload::DirectUploadClient;
use crate::services::local_export::LocalExporter;
use crate::services::relay::{FormRelayClient, Relay, RelayForm};
use crate::services::storage::StorageService;
use crate::session::{SessionError, SharedSession};

/// Frozen answers plus everything the deliver and notify stages need.
#[derive(Debug, Clone)]
pub(crate) struct PreparedSubmission {
    pub(crate) identity: SessionIdentity,
    pub(crate) payload: AnswerPayload,
    pub(crate) file: AnswerFile,
}

impl PreparedSubmission {
    pub(crate) fn prepare(
        session_id: Uuid,
        identity: &SessionIdentity,
        answers: Vec<AnswerRecord>,
        trigger: SubmitTrigger,
        now: OffsetDateTime,
    ) -> Result<Self, SessionError> {
        let millis = unix_millis(now);
        let student_id =
            if identity.phone.is_empty() { millis.to_string() } else { identity.phone.clone() };

        let payload = AnswerPayload {
            student_id,
            session_id,
            submitted_at: format_offset(now),
            trigger,
            total_questions: answers.len(),
            answers,
        };

        let bytes = serde_json::to_vec_pretty(&payload)
            .map_err(|err| SessionError::Encode(err.to_string()))?;
        let sha256 = hex::encode(Sha256::digest(&bytes));

        Ok(Self {
            identity: identity.clone(),
            payload,
            file: AnswerFile { filename: format!("student_answers_{millis}.json"), bytes, sha256 },
        })
    }

    fn inline_json(&self) -> String {
        String::from_utf8_lossy(&self.file.bytes).into_owned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum OutcomeStatus {
    Completed,
    DeliveryFailed,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SubmissionOutcome {
    pub(crate) status: OutcomeStatus,
    pub(crate) message: String,
    pub(crate) receipt: DeliveryReceipt,
}

pub(crate) struct SubmissionPipeline {
    mode: DeliveryMode,
    uploader: Option<Arc<dyn Uploader>>,
    exporter: LocalExporter,
    relay: Option<Arc<dyn Relay>>,
    contact_email: String,
    thank_you_template: String,
}

impl SubmissionPipeline {
    pub(crate) fn new(
        mode: DeliveryMode,
        uploader: Option<Arc<dyn Uploader>>,
        exporter: LocalExporter,
        relay: Option<Arc<dyn Relay>>,
        contact_email: String,
        thank_you_template: String,
    ) -> Self {
        Self { mode, uploader, exporter, relay, contact_email, thank_you_template }
    }

    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(settings.delivery().timeout_seconds);

        let uploader: Option<Arc<dyn Uploader>> = match settings.delivery().mode {
            DeliveryMode::Local => None,
            DeliveryMode::Upload => match settings.upload().backend {
                UploadBackend::Direct => Some(Arc::new(DirectUploadClient::from_settings(settings)?)),
                UploadBackend::S3 => {
                    let storage = StorageService::from_settings(settings)
                        .await
                        .context("Failed to configure S3 storage")?;
                    if storage.is_none() {
                        tracing::warn!(
                            "S3 credentials missing; uploads will fall back to inline answers"
                        );
                    }
                    storage.map(|service| Arc::new(service) as Arc<dyn Uploader>)
                }
            },
        };

        let relay: Option<Arc<dyn Relay>> = match &settings.relay().endpoint {
            Some(endpoint) => Some(Arc::new(FormRelayClient::new(endpoint.clone(), timeout)?)),
            None => None,
        };

        Ok(Self::new(
            settings.delivery().mode,
            uploader,
            LocalExporter::new(settings.delivery().export_dir.clone()),
            relay,
            settings.relay().contact_email.clone(),
            settings.relay().thank_you_template.clone(),
        ))
    }

    pub(crate) fn exporter(&self) -> &LocalExporter {
        &self.exporter
    }

    /// Deliver then notify. Never fails: every error ends in a
    /// `DeliveryFailed` outcome with a manual-fallback message.
    pub(crate) async fn run(&self, prepared: &PreparedSubmission) -> SubmissionOutcome {
        let receipt = self.deliver(prepared).await;

        let Some(relay) = &self.relay else {
            if receipt == DeliveryReceipt::Inline {
                tracing::warn!(
                    filename = %prepared.file.filename,
                    "No relay configured and answers were not stored anywhere"
                );
                return self.failed(receipt);
            }
            return self.completed(prepared, receipt);
        };

        let form = relay_form(prepared, &receipt);
        match relay.notify(&form).await {
            Ok(()) => {
                metrics::record_delivery("relay", "success");
                tracing::info!(
                    session_id = %prepared.payload.session_id,
                    delivery = receipt.as_str(),
                    "Relay accepted submission"
                );
                self.completed(prepared, receipt)
            }
            Err(err) => {
                metrics::record_delivery("relay", "failure");
                tracing::error!(
                    session_id = %prepared.payload.session_id,
                    error = %err,
                    "Relay rejected submission; manual fallback required"
                );
                self.failed(receipt)
            }
        }
    }

    async fn deliver(&self, prepared: &PreparedSubmission) -> DeliveryReceipt {
        let result = match self.mode {
            DeliveryMode::Upload => match &self.uploader {
                Some(uploader) => uploader
                    .upload(&prepared.file)
                    .await
                    .map(|locator| DeliveryReceipt::Uploaded { locator }),
                None => Err(DeliveryError::Upload("no upload backend configured".to_string())),
            },
            DeliveryMode::Local => self
                .exporter
                .save(&prepared.file)
                .await
                .map(|path| DeliveryReceipt::Saved { path: path.display().to_string() }),
        };

        match result {
            Ok(receipt) => {
                metrics::record_delivery(self.mode.as_str(), "success");
                receipt
            }
            Err(err) => {
                metrics::record_delivery(self.mode.as_str(), "failure");
                tracing::warn!(
                    filename = %prepared.file.filename,
                    error = %err,
                    "Delivery failed; embedding answers inline"
                );
                DeliveryReceipt::Inline
            }
        }
    }

    fn completed(&self, prepared: &PreparedSubmission, receipt: DeliveryReceipt) -> SubmissionOutcome {
        SubmissionOutcome {
            status: OutcomeStatus::Completed,
            message: self.thank_you_template.replace("{name}", &prepared.identity.name),
            receipt,
        }
    }

    fn failed(&self, receipt: DeliveryReceipt) -> SubmissionOutcome {
        SubmissionOutcome {
            status: OutcomeStatus::DeliveryFailed,
            message: format!(
                "Submission failed. Please email your answers to {}.",
                self.contact_email
            ),
            receipt,
        }
    }
}

fn relay_form(prepared: &PreparedSubmission, receipt: &DeliveryReceipt) -> RelayForm {
    let mut form = prepared.identity.form_fields();
    form.push(("student_id".to_string(), prepared.payload.student_id.clone()));
    form.push(("session_id".to_string(), prepared.payload.session_id.to_string()));
    form.push(("filename".to_string(), prepared.file.filename.clone()));
    form.push(("answers_sha256".to_string(), prepared.file.sha256.clone()));
    form.push(("delivery".to_string(), receipt.as_str().to_string()));

    match receipt {
        DeliveryReceipt::Uploaded { locator } => {
            form.push(("answers_url".to_string(), locator.clone()));
        }
        DeliveryReceipt::Saved { .. } | DeliveryReceipt::Inline => {
            form.push(("answers_inline".to_string(), "true".to_string()));
            form.push(("answers_json".to_string(), prepared.inline_json()));
        }
    }

    form
}

/// Runs the whole submission for `trigger`. The freeze happens under the
/// session lock before any network call, so only the first trigger gets
/// past it; later ones return `AlreadySubmitted`. Delivery runs on its own
/// task, so a dropped caller still leaves the session in a terminal phase.
pub(crate) async fn submit(
    session: &SharedSession,
    pipeline: &Arc<SubmissionPipeline>,
    trigger: SubmitTrigger,
) -> Result<SubmissionOutcome, SessionError> {
    let prepared = session.lock().await.begin_submission(trigger, now_utc())?;
    metrics::record_submission(trigger.as_str());
    tracing::info!(
        session_id = %prepared.payload.session_id,
        trigger = trigger.as_str(),
        filename = %prepared.file.filename,
        answered = prepared.payload.answers.iter().filter(|record| !record.is_skipped()).count(),
        total = prepared.payload.total_questions,
        "Submission frozen"
    );

    let session_id = prepared.payload.session_id;
    let delivery =
        tokio::spawn(deliver_and_finish(Arc::clone(session), Arc::clone(pipeline), prepared));

    match delivery.await {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            tracing::error!(%session_id, error = %err, "Delivery task aborted");
            let outcome = pipeline.failed(DeliveryReceipt::Inline);
            session.lock().await.finish_submission(outcome.clone());
            Ok(outcome)
        }
    }
}

async fn deliver_and_finish(
    session: SharedSession,
    pipeline: Arc<SubmissionPipeline>,
    prepared: PreparedSubmission,
) -> SubmissionOutcome {
    let outcome = pipeline.run(&prepared).await;
    session.lock().await.finish_submission(outcome.clone());
    outcome
}
