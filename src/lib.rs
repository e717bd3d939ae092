//! Client core of the CRM field-sales mobile app: the paginated visit
//! feed, the backend client, sign-in with phone multi-factor, call-log
//! statistics and location capture.

pub mod auth;
pub mod backend;
pub mod calls;
pub mod config;
pub mod errors;
pub mod location;
pub mod visits;

pub use errors::CrmError;
