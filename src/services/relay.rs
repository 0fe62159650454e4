use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;

use crate::services::delivery::DeliveryError;

/// Flat key/value form posted to the relay endpoint.
pub(crate) type RelayForm = Vec<(String, String)>;

/// External form-relay service that forwards a submission to a human
/// recipient (usually by email).
#[async_trait]
pub(crate) trait Relay: Send + Sync {
    async fn notify(&self, form: &RelayForm) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone)]
pub(crate) struct FormRelayClient {
    client: Client,
    endpoint: String,
}

impl FormRelayClient {
    pub(crate) fn new(endpoint: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .context("Failed to build relay HTTP client")?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Relay for FormRelayClient {
    async fn notify(&self, form: &RelayForm) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await
            .map_err(|err| DeliveryError::Relay(format!("request failed: {err}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let excerpt: String = body.chars().take(200).collect();
        Err(DeliveryError::Relay(format!("status {status}: {excerpt}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closed_port_is_relay_error() {
        let relay = FormRelayClient::new(
            "http://127.0.0.1:9/relay".to_string(),
            Duration::from_secs(2),
        )
        .expect("client");

        let form = vec![("name".to_string(), "Ayesha".to_string())];
        let err = relay.notify(&form).await.expect_err("closed port");
        assert!(matches!(err, DeliveryError::Relay(_)));
    }
}
