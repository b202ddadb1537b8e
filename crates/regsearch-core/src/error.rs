use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("No search criteria provided")]
    NoCriteria,

    #[error("Network request failed: {0}")]
    Network(String),

    #[error("Failed to decode response: {reason}")]
    Decode { reason: String, body: String },

    #[error("{message}")]
    Api { code: Option<String>, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse classification used by UI layers to pick an affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NoCriteria,
    Network,
    Decode,
    Api,
    Config,
}

impl Error {
    pub fn decode(reason: impl Into<String>, body: &[u8]) -> Self {
        Error::Decode { reason: reason.into(), body: String::from_utf8_lossy(body).into_owned() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoCriteria => ErrorKind::NoCriteria,
            Error::Network(_) => ErrorKind::Network,
            Error::Decode { .. } => ErrorKind::Decode,
            Error::Api { .. } => ErrorKind::Api,
            Error::InvalidConfig(_) => ErrorKind::Config,
        }
    }

    /// Text suitable for showing to an end user. API messages pass through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Error::NoCriteria => "No search criteria provided.".to_string(),
            Error::Network(_) => "The network request failed. Please check your connection and try again.".to_string(),
            Error::Decode { .. } => "Failed to understand the response from the server.".to_string(),
            Error::Api { message, .. } => message.clone(),
            Error::InvalidConfig(msg) => format!("Invalid configuration: {}", msg),
        }
    }

    /// openFDA answers an empty match set with a `NOT_FOUND` error envelope.
    pub fn is_no_matches(&self) -> bool {
        matches!(self, Error::Api { code: Some(code), .. } if code.eq_ignore_ascii_case("NOT_FOUND"))
    }

    pub fn raw_body(&self) -> Option<&str> {
        match self {
            Error::Decode { body, .. } => Some(body),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
