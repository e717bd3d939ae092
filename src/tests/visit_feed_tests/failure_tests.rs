use crate::errors::{CrmError, VISITS_UNAVAILABLE_MSG};
use crate::tests::utils::{controller, ids, ok_page, page, record, BrokenTokens, ScriptedEndpoint};
use crate::visits::{FetchOutcome, VisitFeedController};
use std::error::Error;
use std::sync::Arc;

#[tokio::test]
async fn non_200_body_status_leaves_list_untouched() {
    let endpoint = Arc::new(ScriptedEndpoint::default());
    endpoint.reply(ok_page(vec![record("a", "Acme")], true));
    endpoint.reply(Ok(page(500, vec![record("b", "Acme")], false)));
    let ctl = controller(&endpoint);

    ctl.fetch().await.unwrap();
    let outcome = ctl.fetch().await.unwrap();
    assert_eq!(outcome, FetchOutcome::Rejected { status: 500 });

    let st = ctl.snapshot().await;
    assert_eq!(ids(&st.visits), ["a"]);
    assert!(st.has_more);
    assert!(!st.loading);
    assert!(st.error.is_none());
}

#[tokio::test]
async fn transport_failure_surfaces_fixed_message() {
    let endpoint = Arc::new(ScriptedEndpoint::default());
    endpoint.reply(ok_page(vec![record("a", "Acme")], true));
    endpoint.reply(Err(CrmError::Network("connection reset".into())));
    let ctl = controller(&endpoint);

    ctl.fetch().await.unwrap();
    ctl.set_page(2).await;
    let err = ctl.fetch().await.unwrap_err();

    assert_eq!(err.to_string(), VISITS_UNAVAILABLE_MSG);
    let cause = err.source().unwrap().to_string();
    assert!(cause.contains("connection reset"));

    let st = ctl.snapshot().await;
    assert_eq!(ids(&st.visits), ["a"]);
    assert!(st.has_more);
    assert_eq!(st.page, 2);
    assert!(!st.loading);
    assert_eq!(st.error.as_deref(), Some(VISITS_UNAVAILABLE_MSG));
}

#[tokio::test]
async fn http_error_status_is_a_failure() {
    let endpoint = Arc::new(ScriptedEndpoint::default());
    endpoint.reply(Err(CrmError::HttpStatus {
        status: 401,
        body: "unauthorized".into(),
    }));
    endpoint.reply(ok_page(vec![record("a", "Acme")], false));
    let ctl = controller(&endpoint);

    let err = ctl.fetch().await.unwrap_err();
    assert!(matches!(err, CrmError::VisitsUnavailable { .. }));

    // The next attempt starts clean and clears the recorded failure.
    ctl.fetch().await.unwrap();
    let st = ctl.snapshot().await;
    assert!(st.error.is_none());
    assert_eq!(ids(&st.visits), ["a"]);
}

#[tokio::test]
async fn missing_token_does_not_block_the_request() {
    let endpoint = Arc::new(ScriptedEndpoint::default());
    endpoint.reply(ok_page(vec![record("a", "Acme")], false));
    let ctl = VisitFeedController::new(Arc::clone(&endpoint), Arc::new(BrokenTokens));

    ctl.fetch().await.unwrap();

    let requests = endpoint.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].token, None);
    assert_eq!(ids(&ctl.snapshot().await.visits), ["a"]);
}

#[tokio::test]
async fn failed_next_page_is_retried_not_skipped() {
    let endpoint = Arc::new(ScriptedEndpoint::default());
    endpoint.reply(ok_page(vec![record("a", "Acme")], true));
    endpoint.reply(Err(CrmError::Network("blip".into())));
    endpoint.reply(ok_page(vec![record("b", "Acme")], false));
    let ctl = controller(&endpoint);

    ctl.fetch().await.unwrap();
    assert!(ctl.load_next_page().await.is_err());

    let st = ctl.snapshot().await;
    assert_eq!(st.page, 1);
    assert!(st.has_more);

    ctl.load_next_page().await.unwrap();

    let requests = endpoint.requests();
    let pages: Vec<u32> = requests.iter().map(|r| r.query.page).collect();
    assert_eq!(pages, [1, 2, 2]);
    let st = ctl.snapshot().await;
    assert_eq!(ids(&st.visits), ["a", "b"]);
    assert_eq!(st.page, 2);
    assert!(st.error.is_none());
}

#[tokio::test]
async fn rejected_next_page_keeps_the_cursor() {
    let endpoint = Arc::new(ScriptedEndpoint::default());
    endpoint.reply(ok_page(vec![record("a", "Acme")], true));
    endpoint.reply(Ok(page(500, vec![], false)));
    endpoint.reply(ok_page(vec![record("b", "Acme")], true));
    let ctl = controller(&endpoint);

    ctl.fetch().await.unwrap();
    let outcome = ctl.load_next_page().await.unwrap();
    assert_eq!(outcome, Some(FetchOutcome::Rejected { status: 500 }));
    assert_eq!(ctl.snapshot().await.page, 1);

    ctl.load_next_page().await.unwrap();
    assert_eq!(endpoint.requests()[2].query.page, 2);
    assert_eq!(ctl.snapshot().await.page, 2);
}
