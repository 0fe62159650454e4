use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Relay form keys written by the submission pipeline itself.
const RESERVED_FORM_FIELDS: &[&str] = &[
    "name",
    "phone",
    "student_id",
    "session_id",
    "filename",
    "answers_sha256",
    "delivery",
    "answers_url",
    "answers_inline",
    "answers_json",
];

fn is_reserved(key: &str) -> bool {
    let key = key.trim().to_ascii_lowercase();
    RESERVED_FORM_FIELDS.contains(&key.as_str())
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RegistrationRequest {
    #[validate(custom(function = "validate_not_blank", message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(custom(function = "validate_phone"))]
    pub(crate) phone: String,
    /// Any further registration fields (city, school, ...) travel with the
    /// identity untouched. Keys the relay form already uses are refused.
    #[serde(flatten)]
    #[validate(custom(function = "validate_extra_fields"))]
    pub(crate) extra: BTreeMap<String, String>,
}

/// Learner identity captured once at registration; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SessionIdentity {
    pub(crate) name: String,
    pub(crate) phone: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) extra: BTreeMap<String, String>,
}

impl From<RegistrationRequest> for SessionIdentity {
    fn from(request: RegistrationRequest) -> Self {
        let extra = request
            .extra
            .into_iter()
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .filter(|(key, value)| !key.is_empty() && !value.is_empty())
            .collect();

        Self { name: request.name.trim().to_string(), phone: request.phone.trim().to_string(), extra }
    }
}

impl SessionIdentity {
    /// Form fields forwarded to the relay, identity first.
    pub(crate) fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("name".to_string(), self.name.clone()),
            ("phone".to_string(), self.phone.clone()),
        ];
        fields.extend(
            self.extra
                .iter()
                .filter(|(key, _)| !is_reserved(key))
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        fields
    }
}

fn validate_extra_fields(extra: &BTreeMap<String, String>) -> Result<(), ValidationError> {
    if let Some(key) = extra.keys().find(|key| is_reserved(key)) {
        let mut error = ValidationError::new("reserved");
        error.message = Some(format!("field '{key}' is reserved").into());
        return Err(error);
    }
    Ok(())
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    let length = trimmed.chars().count();
    let allowed = trimmed.chars().all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-'));
    let digits = trimmed.chars().filter(char::is_ascii_digit).count();

    if !(7..=20).contains(&length) || !allowed || digits < 7 {
        let mut error = ValidationError::new("phone");
        error.message = Some("phone must contain 7-20 digits, spaces, dashes or '+'".into());
        return Err(error);
    }
    Ok(())
}
