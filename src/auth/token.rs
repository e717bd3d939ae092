// src/auth/token.rs
use crate::errors::CrmError;
use async_trait::async_trait;

pub const SESSION_TOKEN_VAR: &str = "CRM_SESSION_TOKEN";

/// Source of the bearer token attached to backend requests.
/// May suspend, e.g. while the identity provider refreshes the token.
#[async_trait]
pub trait SessionTokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<Option<String>, CrmError>;
}

/// Fixed token, mostly for tests and scripted runs.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

#[async_trait]
impl SessionTokenProvider for StaticToken {
    async fn bearer_token(&self) -> Result<Option<String>, CrmError> {
        Ok(self.0.clone())
    }
}

/// Reads the token from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvToken {
    fn default() -> Self {
        Self::new(SESSION_TOKEN_VAR)
    }
}

#[async_trait]
impl SessionTokenProvider for EnvToken {
    async fn bearer_token(&self) -> Result<Option<String>, CrmError> {
        match std::env::var(&self.var) {
            Ok(t) => Ok(normalize_token(Some(t))),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(CrmError::TokenUnavailable(format!("{}: {e}", self.var))),
        }
    }
}

/// Blank tokens count as absent, so no `Authorization` header is sent.
pub fn normalize_token(token: Option<String>) -> Option<String> {
    token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
