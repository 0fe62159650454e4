use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use crate::core::config::Settings;
use crate::services::delivery::{AnswerFile, DeliveryError, Uploader, ANSWERS_CONTENT_TYPE};

/// Client for a CDN "direct upload" API: a multipart POST carrying the
/// public key, a store flag and the file, answered with `{"file": "<id>"}`.
/// The locator is `<cdn_base>/<id>/`.
#[derive(Debug, Clone)]
pub(crate) struct DirectUploadClient {
    client: Client,
    endpoint: String,
    public_key: String,
    cdn_base: String,
}

#[derive(Debug, Deserialize)]
struct DirectUploadResponse {
    file: String,
}

impl DirectUploadClient {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(settings.delivery().timeout_seconds))
            .build()
            .context("Failed to build upload HTTP client")?;

        Ok(Self {
            client,
            endpoint: settings.upload().endpoint.clone(),
            public_key: settings.upload().public_key.clone(),
            cdn_base: settings.upload().cdn_base.trim_end_matches('/').to_string(),
        })
    }

    fn locator_for(&self, file_id: &str) -> String {
        format!("{}/{}/", self.cdn_base, file_id.trim_matches('/'))
    }
}

#[async_trait]
impl Uploader for DirectUploadClient {
    async fn upload(&self, file: &AnswerFile) -> Result<String, DeliveryError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.filename.clone())
            .mime_str(ANSWERS_CONTENT_TYPE)
            .map_err(|err| DeliveryError::Upload(err.to_string()))?;
        let form = Form::new()
            .text("UPLOADCARE_PUB_KEY", self.public_key.clone())
            .text("UPLOADCARE_STORE", "1")
            .part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|err| DeliveryError::Upload(format!("request failed: {err}")))?;

        let status = response.status();
        let raw_body = response
            .text()
            .await
            .map_err(|err| DeliveryError::Upload(format!("failed to read response: {err}")))?;

        if !status.is_success() {
            return Err(DeliveryError::Upload(format!("status {status}: {raw_body}")));
        }

        let parsed: DirectUploadResponse = serde_json::from_str(&raw_body).map_err(|err| {
            DeliveryError::Upload(format!("unexpected response body ({err}): {raw_body}"))
        })?;
        if parsed.file.trim().is_empty() {
            return Err(DeliveryError::Upload("response carried an empty file id".to_string()));
        }

        Ok(self.locator_for(&parsed.file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn locator_joins_cdn_base_and_file_id() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("UPLOAD_CDN_BASE", "https://cdn.example.com/");

        let settings = Settings::load().expect("settings");
        let client = DirectUploadClient::from_settings(&settings).expect("client");
        assert_eq!(client.locator_for("abc-123"), "https://cdn.example.com/abc-123/");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_upload_error() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("UPLOAD_ENDPOINT", "http://127.0.0.1:9/upload");
        std::env::set_var("DELIVERY_TIMEOUT_SECONDS", "2");

        let settings = Settings::load().expect("settings");
        let client = DirectUploadClient::from_settings(&settings).expect("client");
        let file = AnswerFile {
            filename: "student_answers_1.json".to_string(),
            bytes: b"{}".to_vec(),
            sha256: String::new(),
        };

        let err = client.upload(&file).await.expect_err("closed port");
        assert!(matches!(err, DeliveryError::Upload(_)));
    }
}
