// src/auth/session.rs
//! Sign-in flow over the external identity provider: email/password with
//! phone multi-factor, phone-only sign-in and MFA enrollment.

use crate::auth::token::{normalize_token, SessionTokenProvider};
use crate::errors::CrmError;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

pub const PHONE_FACTOR_ID: &str = "phone";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub uid: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub display_name: Option<String>,
}

/// A second factor the account has enrolled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaHint {
    pub uid: String,
    pub factor_id: String,
    pub phone_number: Option<String>,
    pub display_name: Option<String>,
}

/// Pending sign-in that still needs a second factor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaResolver {
    pub session: String,
    pub hints: Vec<MfaHint>,
}

impl MfaResolver {
    pub fn phone_hints(&self) -> impl Iterator<Item = &MfaHint> {
        self.hints.iter().filter(|h| h.factor_id == PHONE_FACTOR_ID)
    }
}

#[derive(Debug, Clone)]
pub enum SignInOutcome {
    SignedIn(User),
    MfaRequired(MfaResolver),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignInOutcome, CrmError>;

    /// Sends the SMS for `hint`, returns the verification id.
    async fn send_mfa_code(
        &self,
        resolver: &MfaResolver,
        hint: &MfaHint,
    ) -> Result<String, CrmError>;

    async fn resolve_mfa_sign_in(
        &self,
        resolver: &MfaResolver,
        verification_id: &str,
        code: &str,
    ) -> Result<User, CrmError>;

    async fn sign_in_with_phone(&self, phone_number: &str) -> Result<String, CrmError>;

    async fn verify_phone_code(
        &self,
        verification_id: &str,
        code: &str,
    ) -> Result<User, CrmError>;

    async fn start_mfa_enrollment(
        &self,
        user: &User,
        phone_number: &str,
    ) -> Result<String, CrmError>;

    async fn confirm_mfa_enrollment(
        &self,
        user: &User,
        verification_id: &str,
        code: &str,
        display_name: &str,
    ) -> Result<(), CrmError>;

    async fn current_user(&self) -> Option<User>;

    async fn id_token(&self) -> Result<Option<String>, CrmError>;

    async fn sign_out(&self) -> Result<(), CrmError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerificationPhase {
    #[default]
    NotStarted,
    CodeSent,
    Verified,
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub requires_mfa: bool,
    pub verification_id: Option<String>,
    pub mfa_resolver: Option<MfaResolver>,
    pub phone_number_for_mfa: Option<String>,
    pub phase: VerificationPhase,
}

pub struct AuthSession<P> {
    provider: Arc<P>,
    state: AuthState,
}

impl<P: AuthProvider> AuthSession<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            state: AuthState::default(),
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn provider(&self) -> Arc<P> {
        Arc::clone(&self.provider)
    }

    fn begin(&mut self) {
        self.state.is_loading = true;
        self.state.error = None;
    }

    fn fail(&mut self, err: &CrmError, fallback: &str) -> CrmError {
        let msg = failure_message(err, fallback);
        warn!(error = %err, "auth step failed");
        self.state.is_loading = false;
        self.state.phase = VerificationPhase::Failed;
        self.state.error = Some(msg.clone());
        CrmError::Auth(msg)
    }

    pub async fn sign_in_with_email(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<(), CrmError> {
        self.begin();

        let outcome = match self.provider.sign_in_with_email(email, password).await {
            Ok(o) => o,
            Err(e) => return Err(self.fail(&e, "Sign in failed")),
        };

        match outcome {
            SignInOutcome::SignedIn(user) => {
                info!(uid = %user.uid, "signed in");
                self.state.is_loading = false;
                self.state.user = Some(user);
                self.state.requires_mfa = false;
                self.state.mfa_resolver = None;
                self.state.phone_number_for_mfa = None;
                self.state.phase = VerificationPhase::Verified;
                Ok(())
            }
            SignInOutcome::MfaRequired(resolver) => {
                let Some(hint) = resolver.phone_hints().next() else {
                    let e = CrmError::Auth("MFA required but no phone factor available".into());
                    return Err(self.fail(&e, ""));
                };
                let phone = hint
                    .phone_number
                    .clone()
                    .unwrap_or_else(|| "your registered phone".to_string());

                info!("second factor required");
                self.state.is_loading = false;
                self.state.user = None;
                self.state.requires_mfa = true;
                self.state.phone_number_for_mfa = Some(phone);
                self.state.mfa_resolver = Some(resolver);
                Ok(())
            }
        }
    }

    /// Sends the SMS for `hint`, or for the first phone factor when `None`.
    pub async fn send_mfa_code(&mut self, hint: Option<&MfaHint>) -> Result<(), CrmError> {
        self.begin();

        let Some(resolver) = self.state.mfa_resolver.clone() else {
            let e = CrmError::Auth("No pending MFA sign-in".into());
            return Err(self.fail(&e, ""));
        };
        let hint = match hint.or_else(|| resolver.phone_hints().next()) {
            Some(h) => h.clone(),
            None => {
                let e = CrmError::Auth("MFA required but no phone factor available".into());
                return Err(self.fail(&e, ""));
            }
        };

        match self.provider.send_mfa_code(&resolver, &hint).await {
            Ok(verification_id) => {
                self.state.is_loading = false;
                self.state.verification_id = Some(verification_id);
                self.state.phase = VerificationPhase::CodeSent;
                Ok(())
            }
            Err(e) => Err(self.fail(&e, "Failed to send MFA code")),
        }
    }

    pub async fn verify_mfa_code(&mut self, code: &str) -> Result<(), CrmError> {
        self.begin();

        let (Some(resolver), Some(verification_id)) = (
            self.state.mfa_resolver.clone(),
            self.state.verification_id.clone(),
        ) else {
            let e = CrmError::Auth("No verification in progress".into());
            return Err(self.fail(&e, ""));
        };

        match self
            .provider
            .resolve_mfa_sign_in(&resolver, &verification_id, code)
            .await
        {
            Ok(user) => {
                info!(uid = %user.uid, "second factor verified");
                self.state.is_loading = false;
                self.state.user = Some(user);
                self.state.requires_mfa = false;
                self.state.mfa_resolver = None;
                self.state.verification_id = None;
                self.state.phone_number_for_mfa = None;
                self.state.phase = VerificationPhase::Verified;
                Ok(())
            }
            Err(e) => Err(self.fail(&e, "Invalid verification code")),
        }
    }

    pub async fn sign_in_with_phone(&mut self, phone_number: &str) -> Result<(), CrmError> {
        self.begin();

        match self.provider.sign_in_with_phone(phone_number).await {
            Ok(verification_id) => {
                self.state.is_loading = false;
                self.state.verification_id = Some(verification_id);
                self.state.phase = VerificationPhase::CodeSent;
                Ok(())
            }
            Err(e) => Err(self.fail(&e, "Failed to send verification code")),
        }
    }

    pub async fn verify_phone_code(&mut self, code: &str) -> Result<(), CrmError> {
        self.begin();

        let Some(verification_id) = self.state.verification_id.clone() else {
            let e = CrmError::Auth("No verification in progress".into());
            return Err(self.fail(&e, ""));
        };

        match self.provider.verify_phone_code(&verification_id, code).await {
            Ok(user) => {
                info!(uid = %user.uid, "phone verified");
                self.state.is_loading = false;
                self.state.user = Some(user);
                self.state.verification_id = None;
                self.state.phase = VerificationPhase::Verified;
                Ok(())
            }
            Err(e) => Err(self.fail(&e, "Invalid verification code")),
        }
    }

    pub async fn enroll_mfa(&mut self, phone_number: &str) -> Result<(), CrmError> {
        self.begin();

        let Some(user) = self.provider.current_user().await else {
            let e = CrmError::Auth("No user signed in".into());
            return Err(self.fail(&e, ""));
        };

        match self.provider.start_mfa_enrollment(&user, phone_number).await {
            Ok(verification_id) => {
                self.state.is_loading = false;
                self.state.verification_id = Some(verification_id);
                self.state.phase = VerificationPhase::CodeSent;
                Ok(())
            }
            Err(e) => Err(self.fail(&e, "Failed to enroll MFA")),
        }
    }

    pub async fn confirm_mfa_enrollment(
        &mut self,
        code: &str,
        display_name: Option<&str>,
    ) -> Result<(), CrmError> {
        self.begin();

        let Some(user) = self.provider.current_user().await else {
            let e = CrmError::Auth("No user signed in".into());
            return Err(self.fail(&e, ""));
        };
        let Some(verification_id) = self.state.verification_id.clone() else {
            let e = CrmError::Auth("No verification in progress".into());
            return Err(self.fail(&e, ""));
        };

        match self
            .provider
            .confirm_mfa_enrollment(&user, &verification_id, code, display_name.unwrap_or("Phone"))
            .await
        {
            Ok(()) => {
                self.state.is_loading = false;
                self.state.verification_id = None;
                self.state.phase = VerificationPhase::Verified;
                Ok(())
            }
            Err(e) => Err(self.fail(&e, "Failed to confirm MFA enrollment")),
        }
    }

    /// Picks up a session the provider already holds.
    pub async fn check_auth_state(&mut self) {
        self.state.user = self.provider.current_user().await;
        self.state.is_loading = false;
    }

    pub fn clear_mfa_state(&mut self) {
        self.state.requires_mfa = false;
        self.state.verification_id = None;
        self.state.mfa_resolver = None;
        self.state.phone_number_for_mfa = None;
        self.state.phase = VerificationPhase::NotStarted;
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
    }

    pub async fn sign_out(&mut self) {
        if let Err(e) = self.provider.sign_out().await {
            warn!(error = %e, "provider sign-out failed");
        }
        self.state = AuthState::default();
    }
}

fn failure_message(err: &CrmError, fallback: &str) -> String {
    let msg = err.to_string();
    if msg.trim().is_empty() {
        fallback.to_string()
    } else {
        msg
    }
}

/// Hands the provider's ID token to backend requests.
pub struct ProviderTokens<P>(pub Arc<P>);

#[async_trait]
impl<P: AuthProvider> SessionTokenProvider for ProviderTokens<P> {
    async fn bearer_token(&self) -> Result<Option<String>, CrmError> {
        Ok(normalize_token(self.0.id_token().await?))
    }
}
