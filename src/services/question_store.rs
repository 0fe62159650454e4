use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

use crate::schemas::question::{Question, QuestionRecord};

#[derive(Debug, Error)]
pub(crate) enum LoadError {
    #[error("question source {source_name} is unreachable: {reason}")]
    Unreachable { source_name: String, reason: String },
    #[error("question source is not a valid question list: {0}")]
    Malformed(String),
    #[error("question source contains no questions")]
    Empty,
    #[error("question {index} is invalid: {reason}")]
    Invalid { index: usize, reason: String },
}

/// Ordered, read-only question list loaded once per process.
#[derive(Debug, Clone)]
pub(crate) struct QuestionStore {
    questions: Vec<Question>,
}

impl QuestionStore {
    pub(crate) fn from_json(raw: &str) -> Result<Self, LoadError> {
        let records: Vec<QuestionRecord> =
            serde_json::from_str(raw).map_err(|err| LoadError::Malformed(err.to_string()))?;
        if records.is_empty() {
            return Err(LoadError::Empty);
        }

        let mut seen = HashSet::with_capacity(records.len());
        let mut questions = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let question = Question::from_record(record);
            if question.id.is_empty() {
                return Err(LoadError::Invalid { index, reason: "id must not be blank".into() });
            }
            if !seen.insert(question.id.clone()) {
                return Err(LoadError::Invalid {
                    index,
                    reason: format!("duplicate id {}", question.id),
                });
            }
            questions.push(question);
        }

        Ok(Self { questions })
    }

    #[cfg(test)]
    pub(crate) fn from_questions(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub(crate) fn len(&self) -> usize {
        self.questions.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }
}

/// Loads questions from a JSON file path or an `http(s)://` URL.
///
/// URL sources are retried `retries` extra times with exponential backoff;
/// malformed or empty documents are never retried.
pub(crate) async fn load(
    source: &str,
    retries: u32,
    timeout: Duration,
) -> Result<QuestionStore, LoadError> {
    let raw = if is_remote(source) {
        fetch_remote(source, retries, timeout).await?
    } else {
        read_local(Path::new(source)).await?
    };

    let store = QuestionStore::from_json(&raw)?;
    tracing::info!(source, questions = store.len(), "Question store loaded");
    Ok(store)
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

async fn read_local(path: &Path) -> Result<String, LoadError> {
    tokio::fs::read_to_string(path).await.map_err(|err| LoadError::Unreachable {
        source_name: path.display().to_string(),
        reason: err.to_string(),
    })
}

async fn fetch_remote(url: &str, retries: u32, timeout: Duration) -> Result<String, LoadError> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(timeout)
        .build()
        .map_err(|err| LoadError::Unreachable {
            source_name: url.to_string(),
            reason: err.to_string(),
        })?;

    let mut last_error = String::from("no attempt made");

    for attempt in 0..=retries {
        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => return Ok(body),
                Err(err) => last_error = format!("failed to read body: {err}"),
            },
            Ok(response) => last_error = format!("status {}", response.status()),
            Err(err) => last_error = err.to_string(),
        }

        if attempt < retries {
            let backoff = Duration::from_secs(2_u64.pow(attempt));
            tracing::warn!(
                url,
                attempt = attempt + 1,
                error = %last_error,
                backoff_secs = backoff.as_secs(),
                "Question source fetch failed; retrying"
            );
            tokio::time::sleep(backoff).await;
        }
    }

    Err(LoadError::Unreachable { source_name: url.to_string(), reason: last_error })
}
