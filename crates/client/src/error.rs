use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use hmis_core::DomainError;

pub type ClientResult<T> = Result<T, ClientError>;

/// Field-level validation messages from a 422 response.
///
/// Shape: `{ "message": "...", "errors": { "field": ["msg", ...] } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormErrors {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: BTreeMap<String, Vec<String>>,
}

impl FormErrors {
    /// First message for a field, as shown inline under the input.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.errors
            .get(field)
            .and_then(|msgs| msgs.first())
            .map(String::as_str)
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.get(field).is_some_and(|m| !m.is_empty())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.values().all(Vec::is_empty)
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({0}): {1}")]
    Api(u16, String),
    #[error("validation failed: {}", .0.message)]
    Validation(FormErrors),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("response has no `{0}` prop")]
    MissingProp(String),
    #[error("a submission is already in progress")]
    AlreadySubmitting,
    #[error("action was not confirmed")]
    NotConfirmed,
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Parse(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_validation_payload() {
        let errors: FormErrors = serde_json::from_value(json!({
            "message": "The result notes field is required.",
            "errors": { "result_notes": ["The result notes field is required."] }
        }))
        .unwrap();

        assert_eq!(errors.first("result_notes"), Some("The result notes field is required."));
        assert!(errors.has("result_notes"));
        assert!(!errors.has("file"));
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["result_notes"]);
        assert!(!errors.is_empty());

        let err = ClientError::Validation(errors);
        assert_eq!(err.to_string(), "validation failed: The result notes field is required.");
    }

    #[test]
    fn domain_errors_pass_through() {
        let err: ClientError = DomainError::invalid_transition("completed", "complete").into();
        assert_eq!(err.to_string(), "cannot complete while completed");
    }
}
