use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::time::Duration;

use crate::core::config::Settings;
use crate::services::delivery::{AnswerFile, DeliveryError, Uploader, ANSWERS_CONTENT_TYPE};

const ANSWERS_PREFIX: &str = "answers";

/// S3-compatible bucket; the locator handed to the relay is a presigned GET.
#[derive(Debug, Clone)]
pub(crate) struct StorageService {
    client: Client,
    bucket: String,
    link_ttl: Duration,
}

impl StorageService {
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        if settings.s3().access_key.is_empty() || settings.s3().secret_key.is_empty() {
            return Ok(None);
        }

        let creds = Credentials::new(
            settings.s3().access_key.clone(),
            settings.s3().secret_key.clone(),
            None,
            None,
            "quiz-session-static",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(settings.s3().endpoint.clone())
            .region(aws_config::Region::new(settings.s3().region.clone()))
            .credentials_provider(creds)
            .load()
            .await;

        let client = Client::new(&config);

        Ok(Some(Self {
            client,
            bucket: settings.s3().bucket.clone(),
            link_ttl: Duration::from_secs(settings.s3().link_expire_minutes * 60),
        }))
    }

    pub(crate) fn object_key(filename: &str) -> String {
        format!("{ANSWERS_PREFIX}/{filename}")
    }

    pub(crate) async fn presign_get(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> anyhow::Result<String> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(PresigningConfig::expires_in(expires_in)?)
            .await?;

        Ok(presigned.uri().to_string())
    }

    pub(crate) async fn upload_bytes(
        &self,
        key: &str,
        content_type: &str,
        sha256: &str,
        bytes: Vec<u8>,
    ) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .metadata("sha256", sha256)
            .body(ByteStream::from(bytes))
            .send()
            .await?;

        Ok(())
    }
}

#[async_trait]
impl Uploader for StorageService {
    async fn upload(&self, file: &AnswerFile) -> Result<String, DeliveryError> {
        let key = Self::object_key(&file.filename);

        self.upload_bytes(&key, ANSWERS_CONTENT_TYPE, &file.sha256, file.bytes.clone())
            .await
            .map_err(|err| DeliveryError::Upload(format!("{err:#}")))?;

        self.presign_get(&key, self.link_ttl)
            .await
            .map_err(|err| DeliveryError::Upload(format!("failed to presign locator: {err:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::StorageService;
    use crate::core::config::Settings;
    use crate::test_support;
    use std::time::Duration;

    #[tokio::test]
    async fn storage_disabled_without_credentials() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        let storage = StorageService::from_settings(&settings).await.expect("storage");
        assert!(storage.is_none());
    }

    #[tokio::test]
    async fn presign_get_returns_url_for_answer_key() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        test_support::set_test_storage_env();

        let settings = Settings::load().expect("settings");
        let storage = StorageService::from_settings(&settings)
            .await
            .expect("storage")
            .expect("storage enabled");

        let key = StorageService::object_key("student_answers_1.json");
        assert_eq!(key, "answers/student_answers_1.json");
        let url = storage.presign_get(&key, Duration::from_secs(300)).await.expect("presign get");
        assert!(url.contains("student_answers_1.json"));
    }
}
