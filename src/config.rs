// config.rs
use crate::errors::CrmError;
use std::time::Duration;

pub const DEFAULT_BACKEND_HOSTNAME: &str =
    "https://europe-central2-crm-production-af45e.cloudfunctions.net/backCrm";

/// Fixed page size the visits endpoint is queried with.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

const USER_AGENT: &str = concat!("crm-mobile/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend, without trailing slash.
    /// Local emulator builds point this at "http://10.0.2.2:5800".
    pub backend_hostname: String,
    pub page_size: u32,
    pub user_agent: String,
    /// No client-side timeout unless set; the endpoint default applies.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_hostname: DEFAULT_BACKEND_HOSTNAME.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            user_agent: USER_AGENT.to_string(),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `CRM_BACKEND_HOSTNAME`, `CRM_PAGE_SIZE`
    /// and `CRM_REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, CrmError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, CrmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(host) = lookup("CRM_BACKEND_HOSTNAME") {
            let host = host.trim().trim_end_matches('/');
            if host.is_empty() {
                return Err(CrmError::Config("CRM_BACKEND_HOSTNAME is empty".into()));
            }
            cfg.backend_hostname = host.to_string();
        }

        if let Some(size) = lookup("CRM_PAGE_SIZE") {
            let size: u32 = size
                .trim()
                .parse()
                .map_err(|e| CrmError::Config(format!("CRM_PAGE_SIZE: {e}")))?;
            if size == 0 {
                return Err(CrmError::Config("CRM_PAGE_SIZE must be positive".into()));
            }
            cfg.page_size = size;
        }

        if let Some(secs) = lookup("CRM_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|e| CrmError::Config(format!("CRM_REQUEST_TIMEOUT_SECS: {e}")))?;
            cfg.request_timeout = Some(Duration::from_secs(secs));
        }

        Ok(cfg)
    }
}
