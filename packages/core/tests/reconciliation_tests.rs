//! Integration tests for applicant-side reconciliation and the
//! push-driven feed.

mod common;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;

use crate::common::{
    deps_for, now_ms, seed_application_for, seed_opportunity, seed_opportunity_on,
    FlakyStore, TestHarness,
};
use docstore::{DocumentStore, MemoryStore};
use mnvolunteer_core::common::ApplicantId;
use mnvolunteer_core::domains::applications::actions::{
    decide_application, remove_orphaned_application, submit_application, Decision,
};
use futures::StreamExt;
use mnvolunteer_core::domains::applications::feed::{watch_opportunity, ApplicationFeed};
use mnvolunteer_core::domains::applications::models::application::ApplicationStatus;
use mnvolunteer_core::domains::applications::reconcile::reconcile_applications;
use mnvolunteer_core::domains::opportunities::actions::remove_opportunity;
use mnvolunteer_core::domains::opportunities::models::opportunity::Opportunity;
use test_context::test_context;

// =============================================================================
// Deduplication against live store state
// =============================================================================

/// Two records for the same opportunity - a pending one and an older
/// rejection - resolve to the rejection: a decision outranks a pending
/// duplicate.
#[test_context(TestHarness)]
#[tokio::test]
async fn duplicate_resolves_to_the_decided_record(ctx: &TestHarness) {
    let applicant_id = ApplicantId::new();
    let opportunity = seed_opportunity(&ctx.store, 3, 0).await;
    let base = now_ms();

    let rejected = seed_application_for(
        &ctx.store,
        &opportunity,
        applicant_id,
        ApplicationStatus::Rejected,
        base,
    )
    .await;
    seed_application_for(
        &ctx.store,
        &opportunity,
        applicant_id,
        ApplicationStatus::Pending,
        base + Duration::minutes(5),
    )
    .await;

    let views = reconcile_applications(&ctx.store, applicant_id, now_ms())
        .await
        .unwrap();
    assert_eq!(views.current.len(), 1);
    assert_eq!(views.current[0].application.id, rejected.id);
}

/// Among two pending duplicates the newer application wins the view.
#[test_context(TestHarness)]
#[tokio::test]
async fn newer_pending_duplicate_wins(ctx: &TestHarness) {
    let applicant_id = ApplicantId::new();
    let opportunity = seed_opportunity(&ctx.store, 3, 0).await;
    let base = now_ms();

    seed_application_for(
        &ctx.store,
        &opportunity,
        applicant_id,
        ApplicationStatus::Pending,
        base,
    )
    .await;
    let newer = seed_application_for(
        &ctx.store,
        &opportunity,
        applicant_id,
        ApplicationStatus::Pending,
        base + Duration::minutes(5),
    )
    .await;

    let views = reconcile_applications(&ctx.store, applicant_id, now_ms())
        .await
        .unwrap();
    assert_eq!(views.current.len(), 1);
    assert_eq!(views.current[0].application.id, newer.id);
}

// =============================================================================
// Timing views
// =============================================================================

/// Passed opportunities leave the current view; only accepted ones land
/// in history, most recent first. Current sorts soonest first.
#[test_context(TestHarness)]
#[tokio::test]
async fn views_split_and_sort_by_service_date(ctx: &TestHarness) {
    let applicant_id = ApplicantId::new();
    let now = now_ms();

    let next_week = seed_opportunity_on(&ctx.store, 3, 0, now + Duration::days(7)).await;
    let tomorrow = seed_opportunity_on(&ctx.store, 3, 0, now + Duration::days(1)).await;
    let last_week = seed_opportunity_on(&ctx.store, 3, 0, now - Duration::days(7)).await;
    let last_month = seed_opportunity_on(&ctx.store, 3, 0, now - Duration::days(30)).await;
    let missed = seed_opportunity_on(&ctx.store, 3, 0, now - Duration::days(3)).await;

    let a = seed_application_for(&ctx.store, &next_week, applicant_id, ApplicationStatus::Pending, now).await;
    let b = seed_application_for(&ctx.store, &tomorrow, applicant_id, ApplicationStatus::Accepted, now).await;
    let c = seed_application_for(&ctx.store, &last_week, applicant_id, ApplicationStatus::Accepted, now).await;
    let d = seed_application_for(&ctx.store, &last_month, applicant_id, ApplicationStatus::Accepted, now).await;
    // Rejected and passed: appears nowhere.
    seed_application_for(&ctx.store, &missed, applicant_id, ApplicationStatus::Rejected, now).await;

    let views = reconcile_applications(&ctx.store, applicant_id, now)
        .await
        .unwrap();

    let current_ids: Vec<_> = views.current.iter().map(|r| r.application.id).collect();
    assert_eq!(current_ids, vec![b.id, a.id]);

    let history_ids: Vec<_> = views.history.iter().map(|r| r.application.id).collect();
    assert_eq!(history_ids, vec![c.id, d.id]);
}

// =============================================================================
// Orphan detection
// =============================================================================

/// Deleting an opportunity flags every remaining application referencing
/// it on the next pass; explicit removal clears it from later passes.
#[test_context(TestHarness)]
#[tokio::test]
async fn deleted_opportunity_orphans_and_removal_clears(ctx: &TestHarness) {
    let applicant_id = ApplicantId::new();
    let opportunity = seed_opportunity(&ctx.store, 3, 0).await;
    let application = seed_application_for(
        &ctx.store,
        &opportunity,
        applicant_id,
        ApplicationStatus::Pending,
        now_ms(),
    )
    .await;

    let views = reconcile_applications(&ctx.store, applicant_id, now_ms())
        .await
        .unwrap();
    assert!(!views.current[0].orphaned);

    remove_opportunity(&ctx.deps, opportunity.id).await.unwrap();

    let views = reconcile_applications(&ctx.store, applicant_id, now_ms())
        .await
        .unwrap();
    assert_eq!(views.current.len(), 1);
    assert!(views.current[0].orphaned);
    assert!(views.current[0].opportunity.is_none());

    remove_orphaned_application(&ctx.deps, application.id)
        .await
        .unwrap();

    let views = reconcile_applications(&ctx.store, applicant_id, now_ms())
        .await
        .unwrap();
    assert!(views.current.is_empty());
}

/// A failed orphan-check read leaves the flag unset for that pass; the
/// next pass flags the application once the read succeeds.
#[tokio::test]
async fn orphan_check_read_error_defers_the_flag() {
    let flaky = Arc::new(FlakyStore::new(MemoryStore::new()));
    let deps = deps_for(flaky.clone());
    let store = deps.store.as_ref();

    let applicant_id = ApplicantId::new();
    let opportunity = seed_opportunity(store, 3, 0).await;
    seed_application_for(
        store,
        &opportunity,
        applicant_id,
        ApplicationStatus::Pending,
        now_ms(),
    )
    .await;
    store
        .delete(&Opportunity::doc_ref(opportunity.id))
        .await
        .unwrap();

    // This pass's opportunity lookup fails: no orphan flag yet.
    flaky.fail_reads(1);
    let views = reconcile_applications(store, applicant_id, now_ms())
        .await
        .unwrap();
    assert_eq!(views.current.len(), 1);
    assert!(!views.current[0].orphaned);

    // Next pass reads cleanly and confirms the orphan.
    let views = reconcile_applications(store, applicant_id, now_ms())
        .await
        .unwrap();
    assert!(views.current[0].orphaned);
}

// =============================================================================
// Push-driven feed
// =============================================================================

/// Wait until the feed publishes views satisfying `predicate`.
async fn wait_for<F>(feed: &ApplicationFeed, predicate: F)
where
    F: Fn(&mnvolunteer_core::domains::applications::reconcile::ApplicationViews) -> bool,
{
    let mut rx = feed.views();
    tokio::time::timeout(StdDuration::from_secs(5), async {
        loop {
            if predicate(&rx.borrow_and_update()) {
                return;
            }
            rx.changed().await.expect("feed closed");
        }
    })
    .await
    .expect("feed never published the expected views");
}

/// The feed republishes reconciled views on every store change touching
/// the applicant's applications.
#[test_context(TestHarness)]
#[tokio::test]
async fn feed_tracks_application_changes(ctx: &TestHarness) {
    let applicant_id = ApplicantId::new();
    let opportunity = seed_opportunity(&ctx.store, 2, 0).await;

    let feed = ApplicationFeed::start(ctx.deps.store.clone(), applicant_id)
        .await
        .unwrap();
    wait_for(&feed, |views| views.current.is_empty()).await;

    let application = submit_application(&ctx.deps, applicant_id, opportunity.id)
        .await
        .unwrap();
    wait_for(&feed, |views| {
        views.current.len() == 1
            && views.current[0].application.status == ApplicationStatus::Pending
    })
    .await;

    decide_application(&ctx.deps, application.id, Decision::Accept)
        .await
        .unwrap();
    wait_for(&feed, |views| {
        views.current.len() == 1
            && views.current[0].application.status == ApplicationStatus::Accepted
    })
    .await;

    assert_eq!(feed.latest().current[0].application.id, application.id);
}

/// The opportunity detail watch yields the live document immediately,
/// tracks committed decisions, and reports deletion as `None`.
#[test_context(TestHarness)]
#[tokio::test]
async fn opportunity_watch_tracks_capacity_and_deletion(ctx: &TestHarness) {
    let opportunity = seed_opportunity(&ctx.store, 2, 0).await;
    let application = seed_application_for(
        &ctx.store,
        &opportunity,
        ApplicantId::new(),
        ApplicationStatus::Pending,
        now_ms(),
    )
    .await;

    let mut watch = watch_opportunity(ctx.deps.store.as_ref(), opportunity.id)
        .await
        .unwrap();
    let initial = watch.next().await.unwrap().unwrap();
    assert_eq!(initial.capacity_filled, 0);

    decide_application(&ctx.deps, application.id, Decision::Accept)
        .await
        .unwrap();
    let updated = watch.next().await.unwrap().unwrap();
    assert_eq!(updated.capacity_filled, 1);

    remove_opportunity(&ctx.deps, opportunity.id).await.unwrap();
    assert!(watch.next().await.unwrap().is_none());
}
