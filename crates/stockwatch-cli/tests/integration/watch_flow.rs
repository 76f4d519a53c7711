//! Change detection and notification fan-out over a scripted page source.

use std::time::Duration;

use stockwatch_cli::CheckOutcome;
use stockwatch_core::{Availability, WatcherState};
use stockwatch_scrape::ScriptedPage;

use crate::common::{PRODUCT, TestHarness, URL};

#[tokio::test]
async fn test_restock_notifies_every_channel_once() {
    let harness = TestHarness::with_statuses(&["Sold out", "Sold out", "In stock", "In stock"]);
    let mut watcher = harness.watcher(false);

    let mut outcomes = Vec::new();
    for _ in 0..4 {
        outcomes.push(watcher.check_once().await.unwrap());
    }

    assert!(matches!(outcomes[0], CheckOutcome::Baseline(_)));
    assert!(matches!(outcomes[1], CheckOutcome::Unchanged(_)));
    assert!(matches!(outcomes[3], CheckOutcome::Unchanged(_)));

    let CheckOutcome::Changed { change, report } = &outcomes[2] else {
        unreachable!("third check should see the restock");
    };
    assert_eq!(change.product, PRODUCT);
    assert_eq!(change.url, URL);
    assert_eq!(change.availability(), Availability::InStock);
    assert_eq!(report.delivered, vec!["telegram", "email"]);

    assert_eq!(harness.telegram.received().len(), 1);
    assert_eq!(harness.email.received().len(), 1);
    assert_eq!(harness.fetcher.calls(), 4);
}

#[tokio::test]
async fn test_each_transition_is_reported() {
    let harness =
        TestHarness::with_statuses(&["In stock", "Only 1 left", "Out of stock", "In stock"]);
    let mut watcher = harness.watcher(true);

    for _ in 0..4 {
        watcher.check_once().await.unwrap();
    }

    let seen: Vec<(Option<String>, String)> = harness
        .telegram
        .received()
        .iter()
        .map(|c| {
            (
                c.previous.as_ref().map(|s| s.as_str().to_string()),
                c.current.as_str().to_string(),
            )
        })
        .collect();
    assert_eq!(
        seen,
        vec![
            (None, "In stock".to_string()),
            (Some("In stock".to_string()), "Only 1 left".to_string()),
            (Some("Only 1 left".to_string()), "Out of stock".to_string()),
            (Some("Out of stock".to_string()), "In stock".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_whitespace_and_case_are_not_changes() {
    let harness = TestHarness::with_pages(vec![
        ScriptedPage::with_status("In Stock"),
        ScriptedPage::Html(
            "<html><body><span id=\"stock\">\n   in   stock\n</span></body></html>".to_string(),
        ),
    ]);
    let mut watcher = harness.watcher(false);

    watcher.check_once().await.unwrap();
    let outcome = watcher.check_once().await.unwrap();

    assert!(matches!(outcome, CheckOutcome::Unchanged(_)));
    assert_eq!(harness.telegram.attempts(), 0);
}

#[tokio::test]
async fn test_failing_channel_does_not_block_the_other() {
    let harness = TestHarness::with_statuses(&["Out of stock", "In stock", "In stock"])
        .with_failing_email();
    let mut watcher = harness.watcher(false);

    watcher.check_once().await.unwrap();
    let CheckOutcome::Changed { report, .. } = watcher.check_once().await.unwrap() else {
        unreachable!("expected a change");
    };

    assert_eq!(report.delivered, vec!["telegram"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "email");
    assert_eq!(harness.telegram.received().len(), 1);
    assert_eq!(harness.email.attempts(), 1);

    // The failed delivery is not retried on the next check.
    watcher.check_once().await.unwrap();
    assert_eq!(harness.email.attempts(), 1);
}

#[tokio::test]
async fn test_errors_between_observations_are_invisible() {
    let harness = TestHarness::with_pages(vec![
        ScriptedPage::with_status("Out of stock"),
        ScriptedPage::Fail("timeout".to_string()),
        ScriptedPage::Html("<html><body>Just a moment...</body></html>".to_string()),
        ScriptedPage::with_status("Out of stock"),
        ScriptedPage::with_status("In stock"),
    ]);
    let mut watcher = harness.watcher(false);

    let results: Vec<bool> = {
        let mut results = Vec::new();
        for _ in 0..5 {
            results.push(watcher.check_once().await.is_ok());
        }
        results
    };

    assert_eq!(results, vec![true, false, false, true, true]);
    let received = harness.telegram.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].previous.as_ref().unwrap().as_str(), "Out of stock");
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_lifecycle() {
    let harness = TestHarness::with_statuses(&["Out of stock", "Out of stock", "In stock"]);
    let watcher = harness.watcher(false);
    let handle = watcher.handle();
    assert_eq!(handle.state(), WatcherState::Stopped);

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let task = tokio::spawn(watcher.run(async move {
        let _ = rx.await;
    }));

    handle.wait_running(Duration::from_secs(1)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(150)).await;

    assert_eq!(harness.fetcher.calls(), 3);
    assert_eq!(harness.telegram.received().len(), 1);
    assert_eq!(harness.email.received().len(), 1);

    tx.send(()).unwrap();
    task.await.unwrap();
    assert_eq!(handle.state(), WatcherState::Stopped);
    assert_eq!(handle.checks(), 3);
}
