// errors.rs
use thiserror::Error;

/// Message shown to the user whenever the visit feed cannot be refreshed.
pub const VISITS_UNAVAILABLE_MSG: &str = "an error occurred while retrieving visits";

/// Errors originating from the backend client, the identity provider
/// or the device data sources.
#[derive(Debug, Error)]
pub enum CrmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid filter condition: {0}")]
    InvalidCondition(String),

    #[error("Session token unavailable: {0}")]
    TokenUnavailable(String),

    #[error("{0}")]
    Auth(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Fixed user-facing failure of a visit fetch; the cause stays in the
    /// source chain.
    #[error("{}", VISITS_UNAVAILABLE_MSG)]
    VisitsUnavailable {
        #[source]
        cause: Box<CrmError>,
    },
}

impl CrmError {
    pub fn visits_unavailable(cause: CrmError) -> Self {
        CrmError::VisitsUnavailable {
            cause: Box::new(cause),
        }
    }
}
