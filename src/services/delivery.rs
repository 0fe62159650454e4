use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub(crate) const ANSWERS_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub(crate) enum DeliveryError {
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("local export failed: {0}")]
    Export(String),
    #[error("relay failed: {0}")]
    Relay(String),
}

/// The serialized answers file handed to a delivery backend.
#[derive(Debug, Clone)]
pub(crate) struct AnswerFile {
    pub(crate) filename: String,
    pub(crate) bytes: Vec<u8>,
    pub(crate) sha256: String,
}

/// Where the answers ended up after the deliver stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum DeliveryReceipt {
    Uploaded { locator: String },
    Saved { path: String },
    Inline,
}

impl DeliveryReceipt {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded { .. } => "uploaded",
            Self::Saved { .. } => "saved",
            Self::Inline => "inline",
        }
    }
}

/// Object-storage endpoint that turns an answers file into a retrievable locator.
#[async_trait]
pub(crate) trait Uploader: Send + Sync {
    async fn upload(&self, file: &AnswerFile) -> Result<String, DeliveryError>;
}
