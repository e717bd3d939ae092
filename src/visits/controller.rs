// visits/controller.rs
//! Client-side state of the paginated, filtered visit list.

use crate::auth::{normalize_token, SessionTokenProvider};
use crate::config::DEFAULT_PAGE_SIZE;
use crate::errors::CrmError;
use crate::visits::conditions::build_conditions;
use crate::visits::endpoint::{VisitsEndpoint, VisitsQuery};
use crate::visits::models::{VisitPage, VisitStats, VisitSummary};
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Backend result code for a successful listing.
const STATUS_OK: u16 = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct VisitListState {
    pub visits: Vec<VisitSummary>,
    /// 1-based page cursor.
    pub page: u32,
    pub has_more: bool,
    pub loading: bool,
    pub helper_date: Option<NaiveDate>,
    /// `Some("")` is an active filter, `None` is no filter.
    pub company_name: Option<String>,
    pub selected_visit_id: Option<String>,
    /// User-facing message of the last failed fetch.
    pub error: Option<String>,
}

impl Default for VisitListState {
    fn default() -> Self {
        Self {
            visits: Vec::new(),
            page: 1,
            has_more: false,
            loading: false,
            helper_date: None,
            company_name: None,
            selected_visit_id: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Page merged into the list.
    Applied { received: usize, has_more: bool },
    /// Backend answered with a non-200 `status`; list left as it was.
    Rejected { status: u16 },
    /// A newer request or a reset superseded this one; nothing applied.
    Discarded,
}

struct Inner {
    state: VisitListState,
    /// Number of the most recently dispatched request. Bumping it makes
    /// every in-flight request stale.
    latest_request: u64,
}

struct Dispatched {
    request: u64,
    page: u32,
    helper_date: Option<NaiveDate>,
    company_name: Option<String>,
}

/// Owns the visit list and keeps it in sync with the visits endpoint.
///
/// Share it with the presentation layer behind an `Arc`; all operations
/// take `&self`. Overlapping fetches are allowed, but only the most
/// recently dispatched one may change the list when it settles.
pub struct VisitFeedController<E, T> {
    endpoint: Arc<E>,
    tokens: Arc<T>,
    page_size: u32,
    inner: Mutex<Inner>,
}

impl<E, T> VisitFeedController<E, T>
where
    E: VisitsEndpoint,
    T: SessionTokenProvider,
{
    pub fn new(endpoint: Arc<E>, tokens: Arc<T>) -> Self {
        Self {
            endpoint,
            tokens,
            page_size: DEFAULT_PAGE_SIZE,
            inner: Mutex::new(Inner {
                state: VisitListState::default(),
                latest_request: 0,
            }),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub async fn snapshot(&self) -> VisitListState {
        self.inner.lock().await.state.clone()
    }

    pub async fn stats(&self) -> VisitStats {
        VisitStats::from_visits(&self.inner.lock().await.state.visits)
    }

    /// Sets the month filter only; pair with `reset_list` and `fetch`, or use
    /// `apply_month_filter`.
    pub async fn set_month_filter(&self, date: Option<NaiveDate>) {
        self.inner.lock().await.state.helper_date = date;
    }

    pub async fn set_company_name_filter(&self, name: impl Into<String>) {
        self.inner.lock().await.state.company_name = Some(name.into());
    }

    pub async fn clear_company_name_filter(&self) {
        self.inner.lock().await.state.company_name = None;
    }

    /// Empties the list and rewinds to page 1. Requests still in flight
    /// become stale and will not touch the list.
    pub async fn reset_list(&self) {
        let mut inner = self.inner.lock().await;
        Self::reset(&mut inner);
    }

    /// Page numbers start at 1; 0 is treated as 1.
    pub async fn set_page(&self, page: u32) {
        self.inner.lock().await.state.page = page.max(1);
    }

    pub async fn select_visit(&self, visit_id: impl Into<String>) {
        self.inner.lock().await.state.selected_visit_id = Some(visit_id.into());
    }

    pub async fn clear_selected_visit(&self) {
        self.inner.lock().await.state.selected_visit_id = None;
    }

    /// Requests the current page with the current filters and merges it:
    /// appended when the list already has rows, replacing it otherwise.
    pub async fn fetch(&self) -> Result<FetchOutcome, CrmError> {
        let dispatched = {
            let mut inner = self.inner.lock().await;
            let page = inner.state.page;
            Self::dispatch(&mut inner, page)
        };
        self.settle(dispatched).await
    }

    /// Sets the month filter, resets the list and fetches page 1.
    pub async fn apply_month_filter(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<FetchOutcome, CrmError> {
        let dispatched = {
            let mut inner = self.inner.lock().await;
            inner.state.helper_date = date;
            Self::reset(&mut inner);
            let page = inner.state.page;
            Self::dispatch(&mut inner, page)
        };
        self.settle(dispatched).await
    }

    /// Sets the company-name filter (`None` clears it), resets the list and
    /// fetches page 1.
    pub async fn apply_company_name_filter(
        &self,
        name: Option<String>,
    ) -> Result<FetchOutcome, CrmError> {
        let dispatched = {
            let mut inner = self.inner.lock().await;
            inner.state.company_name = name;
            Self::reset(&mut inner);
            let page = inner.state.page;
            Self::dispatch(&mut inner, page)
        };
        self.settle(dispatched).await
    }

    /// Infinite-scroll trigger: fetches the next page unless a fetch is
    /// running or the last page said there is nothing more. The cursor only
    /// moves once the next page has been applied, so a failed attempt is
    /// retried on the following trigger.
    pub async fn load_next_page(&self) -> Result<Option<FetchOutcome>, CrmError> {
        let dispatched = {
            let mut inner = self.inner.lock().await;
            if inner.state.loading || !inner.state.has_more {
                return Ok(None);
            }
            let Some(next) = inner.state.page.checked_add(1) else {
                warn!(page = inner.state.page, "page cursor exhausted");
                return Ok(None);
            };
            Self::dispatch(&mut inner, next)
        };
        self.settle(dispatched).await.map(Some)
    }

    fn reset(inner: &mut Inner) {
        inner.latest_request += 1;
        inner.state.page = 1;
        inner.state.has_more = false;
        inner.state.visits.clear();
        inner.state.loading = false;
    }

    fn dispatch(inner: &mut Inner, page: u32) -> Dispatched {
        inner.latest_request += 1;
        inner.state.loading = true;
        inner.state.error = None;

        Dispatched {
            request: inner.latest_request,
            page,
            helper_date: inner.state.helper_date,
            company_name: inner.state.company_name.clone(),
        }
    }

    async fn settle(&self, d: Dispatched) -> Result<FetchOutcome, CrmError> {
        debug!(request = d.request, page = d.page, "fetching visits");
        let result = self.request_page(&d).await;

        // Everything below runs under one lock, so a merge is never interleaved
        // with another request's bookkeeping.
        let mut inner = self.inner.lock().await;
        if inner.latest_request != d.request {
            debug!(
                request = d.request,
                latest = inner.latest_request,
                "discarding stale visits response"
            );
            return Ok(FetchOutcome::Discarded);
        }
        inner.state.loading = false;

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                error!(error = %e, page = d.page, "visits fetch failed");
                let err = CrmError::visits_unavailable(e);
                inner.state.error = Some(err.to_string());
                return Err(err);
            }
        };

        if page.status != STATUS_OK {
            warn!(
                status = page.status,
                page = d.page,
                "visits endpoint returned no results"
            );
            return Ok(FetchOutcome::Rejected {
                status: page.status,
            });
        }

        let received = page.data.len();
        let summaries = page.data.into_iter().map(VisitSummary::from);
        if inner.state.visits.is_empty() {
            inner.state.visits = summaries.collect();
        } else {
            inner.state.visits.extend(summaries);
        }
        inner.state.page = d.page;
        inner.state.has_more = page.has_more;

        info!(
            page = d.page,
            received,
            total = inner.state.visits.len(),
            has_more = page.has_more,
            "visits page applied"
        );
        Ok(FetchOutcome::Applied {
            received,
            has_more: page.has_more,
        })
    }

    async fn request_page(&self, d: &Dispatched) -> Result<VisitPage, CrmError> {
        let token = match self.tokens.bearer_token().await {
            Ok(t) => normalize_token(t),
            Err(e) => {
                warn!(error = %e, "no session token, sending visits request without one");
                None
            }
        };

        let query = VisitsQuery {
            page: d.page,
            limit: self.page_size,
            conditions: build_conditions(d.helper_date, d.company_name.as_deref())?,
        };

        self.endpoint.fetch_page(&query, token.as_deref()).await
    }
}
