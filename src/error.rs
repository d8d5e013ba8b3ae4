use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by the chat backend client
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("could not decode backend response: {0}")]
    Decode(String),

    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
}

impl BackendError {
    /// Build a status error, pulling FastAPI's `{"detail": ...}` out of the body when present
    pub fn from_status(status: StatusCode, body: String) -> Self {
        let body = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| {
                value
                    .get("detail")
                    .map(|detail| match detail.as_str() {
                        Some(text) => text.to_string(),
                        None => detail.to_string(),
                    })
            })
            .unwrap_or(body);

        BackendError::Status { status, body }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            BackendError::Transport(err) => err.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fastapi_detail() {
        let err = BackendError::from_status(
            StatusCode::NOT_FOUND,
            r#"{"detail":"Session not found"}"#.to_string(),
        );
        assert_eq!(err.to_string(), "backend returned 404 Not Found: Session not found");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn keeps_plain_bodies() {
        let err = BackendError::from_status(
            StatusCode::BAD_GATEWAY,
            "upstream down".to_string(),
        );
        match err {
            BackendError::Status { body, .. } => assert_eq!(body, "upstream down"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
