use crate::errors::CrmError;
use crate::visits::conditions::FilterCondition;
use crate::visits::models::VisitPage;
use async_trait::async_trait;

/// One page request against the visits endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitsQuery {
    pub page: u32,
    pub limit: u32,
    pub conditions: Vec<FilterCondition>,
}

/// Remote paginated visit listing.
///
/// Implementations fail with an error for transport problems and non-2xx
/// HTTP statuses; a 2xx body is returned as-is, whatever its `status`.
#[async_trait]
pub trait VisitsEndpoint: Send + Sync {
    async fn fetch_page(
        &self,
        query: &VisitsQuery,
        token: Option<&str>,
    ) -> Result<VisitPage, CrmError>;
}
