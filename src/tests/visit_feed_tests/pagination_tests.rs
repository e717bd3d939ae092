use crate::tests::utils::{controller, ids, ok_page, record, ScriptedEndpoint};
use crate::visits::{ConditionValue, FetchOutcome, Operation, VisitListState, VisitStats};
use std::sync::Arc;

#[tokio::test]
async fn initial_state_is_empty_page_one() {
    let endpoint = Arc::new(ScriptedEndpoint::default());
    let ctl = controller(&endpoint);

    assert_eq!(ctl.snapshot().await, VisitListState::default());
    let st = ctl.snapshot().await;
    assert!(st.visits.is_empty());
    assert_eq!(st.page, 1);
    assert!(!st.has_more);
    assert!(!st.loading);
}

#[tokio::test]
async fn company_filter_then_next_page_accumulates() {
    let endpoint = Arc::new(ScriptedEndpoint::default());
    endpoint.reply(ok_page(vec![record("a", "Acme"), record("b", "Acme")], true));
    endpoint.reply(ok_page(vec![record("c", "Acme")], false));
    let ctl = controller(&endpoint);

    ctl.set_company_name_filter("Acme").await;
    let outcome = ctl.fetch().await.unwrap();
    assert_eq!(
        outcome,
        FetchOutcome::Applied {
            received: 2,
            has_more: true
        }
    );

    let st = ctl.snapshot().await;
    assert_eq!(ids(&st.visits), ["a", "b"]);
    assert!(st.has_more);
    assert!(!st.loading);

    ctl.set_page(2).await;
    ctl.fetch().await.unwrap();

    let st = ctl.snapshot().await;
    assert_eq!(ids(&st.visits), ["a", "b", "c"]);
    assert!(!st.has_more);
    assert_eq!(st.page, 2);

    let requests = endpoint.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].query.page, 1);
    assert_eq!(requests[0].query.limit, 20);
    assert_eq!(requests[0].token.as_deref(), Some("test-token"));
    assert_eq!(requests[0].query.conditions.len(), 1);
    assert_eq!(
        requests[0].query.conditions[0].operation,
        Operation::Contains
    );
    assert_eq!(
        requests[0].query.conditions[0].value,
        ConditionValue::Text("Acme".into())
    );
    assert_eq!(requests[1].query.page, 2);
}

#[tokio::test]
async fn refetching_the_same_page_appends_duplicates() {
    let endpoint = Arc::new(ScriptedEndpoint::default());
    endpoint.reply(ok_page(vec![record("a", "Acme"), record("b", "Acme")], true));
    endpoint.reply(ok_page(vec![record("a", "Acme"), record("b", "Acme")], true));
    let ctl = controller(&endpoint);

    ctl.fetch().await.unwrap();
    ctl.fetch().await.unwrap();

    // No de-duplication by id: a page fetched twice shows up twice.
    let st = ctl.snapshot().await;
    assert_eq!(ids(&st.visits), ["a", "b", "a", "b"]);
    assert_eq!(st.page, 1);
}

#[tokio::test]
async fn reset_clears_list_page_and_has_more() {
    let endpoint = Arc::new(ScriptedEndpoint::default());
    endpoint.reply(ok_page(vec![record("a", "Acme")], true));
    let ctl = controller(&endpoint);

    ctl.set_page(3).await;
    ctl.fetch().await.unwrap();
    ctl.set_month_filter(chrono::NaiveDate::from_ymd_opt(2024, 2, 1)).await;
    ctl.reset_list().await;

    let st = ctl.snapshot().await;
    assert!(st.visits.is_empty());
    assert_eq!(st.page, 1);
    assert!(!st.has_more);
    // Filters survive a reset.
    assert!(st.helper_date.is_some());
}

#[tokio::test]
async fn page_zero_is_clamped_to_one() {
    let endpoint = Arc::new(ScriptedEndpoint::default());
    let ctl = controller(&endpoint);

    ctl.set_page(0).await;
    assert_eq!(ctl.snapshot().await.page, 1);
}

#[tokio::test]
async fn load_next_page_only_when_more_pages_exist() {
    let endpoint = Arc::new(ScriptedEndpoint::default());
    endpoint.reply(ok_page(vec![record("a", "Acme")], true));
    endpoint.reply(ok_page(vec![record("b", "Acme")], false));
    let ctl = controller(&endpoint);

    // Nothing loaded yet, so nothing more to load.
    assert_eq!(ctl.load_next_page().await.unwrap(), None);
    assert!(endpoint.requests().is_empty());

    ctl.fetch().await.unwrap();
    let outcome = ctl.load_next_page().await.unwrap();
    assert_eq!(
        outcome,
        Some(FetchOutcome::Applied {
            received: 1,
            has_more: false
        })
    );
    assert_eq!(endpoint.requests()[1].query.page, 2);

    assert_eq!(ctl.load_next_page().await.unwrap(), None);
    assert_eq!(endpoint.requests().len(), 2);
    assert_eq!(ids(&ctl.snapshot().await.visits), ["a", "b"]);
}

#[tokio::test]
async fn selection_and_stats() {
    let endpoint = Arc::new(ScriptedEndpoint::default());
    let mut done = record("b", "Beta");
    done.efectuata = true;
    endpoint.reply(ok_page(vec![record("a", "Acme"), done], false));
    let ctl = controller(&endpoint);

    ctl.fetch().await.unwrap();
    assert_eq!(ctl.stats().await, VisitStats { total: 2, completed: 1 });

    ctl.select_visit("b").await;
    assert_eq!(ctl.snapshot().await.selected_visit_id.as_deref(), Some("b"));
    ctl.clear_selected_visit().await;
    assert!(ctl.snapshot().await.selected_visit_id.is_none());
}

#[tokio::test]
async fn next_page_stops_at_the_last_page_number() {
    let endpoint = Arc::new(ScriptedEndpoint::default());
    endpoint.reply(ok_page(vec![record("a", "Acme")], true));
    let ctl = controller(&endpoint);

    ctl.set_page(u32::MAX).await;
    ctl.fetch().await.unwrap();

    assert_eq!(ctl.load_next_page().await.unwrap(), None);
    assert_eq!(endpoint.requests().len(), 1);
    assert_eq!(ctl.snapshot().await.page, u32::MAX);
}
