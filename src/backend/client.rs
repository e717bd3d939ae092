// backend/client.rs
use crate::config::ClientConfig;
use crate::errors::CrmError;
use crate::visits::{VisitPage, VisitsEndpoint, VisitsQuery};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::time::Instant;
use tracing::{debug, warn};
use url::Url;

/// HTTP access to the CRM backend. Cheap to share behind an `Arc`.
pub struct BackendClient {
    client: Client,
    cfg: ClientConfig,
}

impl BackendClient {
    pub fn new(cfg: ClientConfig) -> Result<Self, CrmError> {
        let mut builder = Client::builder().user_agent(cfg.user_agent.clone());
        if let Some(timeout) = cfg.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| CrmError::Network(e.to_string()))?;

        Ok(Self { client, cfg })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.cfg
    }

    fn endpoint_url(&self, path: &str) -> Result<Url, CrmError> {
        let base = self.cfg.backend_hostname.trim_end_matches('/');
        Url::parse(&format!("{base}{path}"))
            .map_err(|e| CrmError::Config(format!("invalid backend hostname {base:?}: {e}")))
    }

    /// `/vizite/pagination` with page, limit and the JSON condition list.
    /// Query values are percent-encoded, so filter text may contain `&` or `#`.
    pub fn visits_url(&self, query: &VisitsQuery) -> Result<Url, CrmError> {
        let conditions = serde_json::to_string(&query.conditions)
            .map_err(|e| CrmError::JsonParse(e.to_string()))?;

        let mut url = self.endpoint_url("/vizite/pagination")?;
        url.query_pairs_mut()
            .append_pair("page", &query.page.to_string())
            .append_pair("limit", &query.limit.to_string())
            .append_pair("conditions", &conditions);
        Ok(url)
    }

    fn authorized(&self, req: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(t) if !t.is_empty() => req.bearer_auth(t),
            _ => req,
        }
    }

    /// Body text of a 2xx response; anything else is an error.
    async fn send(&self, req: RequestBuilder) -> Result<String, CrmError> {
        let resp = req
            .send()
            .await
            .map_err(|e| CrmError::Network(e.to_string()))?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "(no body)".to_string());
            return Err(CrmError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        resp.text()
            .await
            .map_err(|e| CrmError::Network(e.to_string()))
    }

    /// Connectivity probe against `/mobile/test`; succeeds on any 2xx.
    pub async fn test_route(&self, token: Option<&str>) -> Result<(), CrmError> {
        let url = self.endpoint_url("/mobile/test")?;
        debug!(%url, "testing backend route");

        let req = self.authorized(self.client.get(url), token);
        match self.send(req).await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(error = %e, "backend test route failed");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl VisitsEndpoint for BackendClient {
    async fn fetch_page(
        &self,
        query: &VisitsQuery,
        token: Option<&str>,
    ) -> Result<VisitPage, CrmError> {
        let url = self.visits_url(query)?;
        let start = Instant::now();
        debug!(page = query.page, conditions = query.conditions.len(), "GET visits");

        let req = self.authorized(self.client.get(url), token);
        let text = self.send(req).await?;

        debug!(elapsed = ?start.elapsed(), bytes = text.len(), "visits page received");
        parse_visit_page(&text)
    }
}

pub(crate) fn parse_visit_page(text: &str) -> Result<VisitPage, CrmError> {
    serde_json::from_str(text).map_err(|e| CrmError::JsonParse(e.to_string()))
}
