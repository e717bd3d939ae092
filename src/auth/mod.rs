mod session;
mod token;

pub use session::{
    AuthProvider, AuthSession, AuthState, MfaHint, MfaResolver, ProviderTokens, SignInOutcome,
    User, VerificationPhase, PHONE_FACTOR_ID,
};
pub use token::{normalize_token, EnvToken, SessionTokenProvider, StaticToken, SESSION_TOKEN_VAR};
