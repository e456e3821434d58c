use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Service returned {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl GatewayError {
    /// HTTP status reported by the remote service, if it answered at all.
    pub fn code(&self) -> Option<u16> {
        match self {
            GatewayError::Status { code, .. } => Some(*code),
            GatewayError::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GatewayError::Parse(e.to_string())
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Parse(e.to_string())
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_is_exposed() {
        let err = GatewayError::Status {
            code: 400,
            message: "bad input".into(),
        };
        assert_eq!(err.code(), Some(400));
        assert!(err.to_string().contains("bad input"));
        assert_eq!(GatewayError::Transport("reset".into()).code(), None);
        assert_eq!(GatewayError::NotFound("ws".into()).code(), Some(404));
    }

    #[test]
    fn json_errors_become_parse_errors() {
        let err: GatewayError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, GatewayError::Parse(_)));
    }
}
