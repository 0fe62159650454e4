use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Option keys offered when a question ships without an `options` table.
pub(crate) const DEFAULT_OPTION_KEYS: &[&str] = &["a", "b", "c", "d"];

/// Shown in place of a missing prompt.
pub(crate) const PROMPT_PLACEHOLDER: &str = "Loading question...";

/// One entry of the question source file, before validation.
#[derive(Debug, Deserialize)]
pub(crate) struct QuestionRecord {
    pub(crate) id: QuestionIdRecord,
    #[serde(default, alias = "question", alias = "text")]
    pub(crate) prompt: Option<String>,
    #[serde(default)]
    pub(crate) options: Option<OptionsRecord>,
}

/// Question ids arrive as either strings or integers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum QuestionIdRecord {
    Text(String),
    Number(i64),
}

/// Keyed tables keep the order they were written in.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OptionsRecord {
    Keyed(Map<String, Value>),
    Listed(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct QuestionOption {
    pub(crate) key: String,
    pub(crate) text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) prompt: String,
    pub(crate) options: Vec<QuestionOption>,
}

impl QuestionIdRecord {
    pub(crate) fn into_id(self) -> String {
        match self {
            Self::Text(value) => value.trim().to_string(),
            Self::Number(value) => value.to_string(),
        }
    }
}

impl Question {
    /// Applies the default-substitution rules: missing or empty option tables
    /// fall back to [`DEFAULT_OPTION_KEYS`], and blank option texts show their key.
    pub(crate) fn from_record(record: QuestionRecord) -> Self {
        let options = match record.options {
            Some(OptionsRecord::Keyed(map)) if !map.is_empty() => map
                .into_iter()
                .map(|(key, value)| {
                    let text = match value {
                        Value::Null => String::new(),
                        Value::String(text) => text.trim().to_string(),
                        other => other.to_string(),
                    };
                    let text = if text.is_empty() { key.clone() } else { text };
                    QuestionOption { key, text }
                })
                .collect(),
            Some(OptionsRecord::Listed(items)) if !items.is_empty() => items
                .into_iter()
                .enumerate()
                .map(|(index, text)| {
                    let key = option_key_for_index(index);
                    let text = if text.trim().is_empty() { key.clone() } else { text };
                    QuestionOption { key, text }
                })
                .collect(),
            _ => default_options(),
        };

        Self {
            id: record.id.into_id(),
            prompt: record.prompt.map(|value| value.trim().to_string()).unwrap_or_default(),
            options,
        }
    }

    pub(crate) fn display_prompt(&self) -> &str {
        if self.prompt.is_empty() {
            PROMPT_PLACEHOLDER
        } else {
            &self.prompt
        }
    }

    pub(crate) fn has_option(&self, key: &str) -> bool {
        self.options.iter().any(|option| option.key == key)
    }
}

fn default_options() -> Vec<QuestionOption> {
    DEFAULT_OPTION_KEYS
        .iter()
        .map(|key| QuestionOption { key: key.to_string(), text: key.to_string() })
        .collect()
}

fn option_key_for_index(index: usize) -> String {
    if index < 26 {
        char::from(b'a' + index as u8).to_string()
    } else {
        format!("o{}", index + 1)
    }
}
