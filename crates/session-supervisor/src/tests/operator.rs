//! Operator input tests: the confirm token and lifecycle commands.

use super::harness::{ConnectOutcome, TestHarness, CONFIRM_TOKEN, MAIN_COMMAND};
use crate::SessionState;

#[tokio::test]
async fn confirm_while_pending_issues_one_connect() {
    let h = TestHarness::new();
    h.into_awaiting_confirm().await;

    h.operator(CONFIRM_TOKEN);
    let snapshot = h.snapshot().await;

    assert_eq!(snapshot.state, SessionState::Connecting);
    assert!(!snapshot.pending_confirmation);
    h.wait_for_connects(1).await;
    h.settle().await;
    assert_eq!(h.transport.connect_count(), 1);
    assert!(h.operator.any_text_contains("Reconnecting"));
}

#[tokio::test]
async fn confirm_ignores_case_and_whitespace() {
    let h = TestHarness::new();
    h.into_awaiting_confirm().await;

    h.operator("  SI \n");
    h.wait_for_connects(1).await;

    assert!(!h.snapshot().await.pending_confirmation);
}

#[tokio::test]
async fn confirm_counts_once() {
    let h = TestHarness::new();
    h.into_awaiting_confirm().await;

    h.operator(CONFIRM_TOKEN);
    h.operator(CONFIRM_TOKEN);
    h.wait_for_connects(1).await;
    h.settle().await;

    assert_eq!(h.transport.connect_count(), 1);
}

#[tokio::test]
async fn other_text_while_pending_is_ignored() {
    let h = TestHarness::new();
    h.into_awaiting_confirm().await;
    let sent_before = h.operator.sent().len();

    h.operator("no");
    h.operator("si, please");
    let snapshot = h.settle().await;

    assert_eq!(snapshot.state, SessionState::AwaitingOperatorConfirm);
    assert!(snapshot.pending_confirmation);
    assert_eq!(h.transport.connect_count(), 0);
    assert_eq!(h.operator.sent().len(), sent_before);
}

#[tokio::test]
async fn confirm_without_pending_is_ignored() {
    let h = TestHarness::new();
    h.operator(CONFIRM_TOKEN);
    assert_eq!(h.state().await, SessionState::Idle);

    h.into_open().await;
    h.operator(CONFIRM_TOKEN);
    let snapshot = h.settle().await;

    assert_eq!(snapshot.state, SessionState::Open);
    assert_eq!(h.transport.connect_count(), 0);
}

#[tokio::test]
async fn failed_confirmed_connect_rearms_confirmation() {
    let h = TestHarness::new();
    h.into_awaiting_confirm().await;
    h.transport.queue_outcome(ConnectOutcome::Fail("stream refused"));

    h.operator(CONFIRM_TOKEN);
    let snapshot = h
        .wait_until(|s| s.state == SessionState::AwaitingOperatorConfirm && s.pending_confirmation)
        .await;
    assert!(!snapshot.reconnect_guard_held);
    assert!(h.operator.any_text_contains("Reconnect failed"));

    h.operator(CONFIRM_TOKEN);
    h.wait_for_connects(2).await;
}

#[tokio::test]
async fn confirmed_connect_does_not_take_the_guard() {
    let h = TestHarness::new();
    h.into_awaiting_confirm().await;
    h.transport.hold_connects();

    h.operator(CONFIRM_TOKEN);
    h.wait_for_connects(1).await;

    assert!(!h.snapshot().await.reconnect_guard_held);
    h.transport.release_connects(1);
}

#[tokio::test]
async fn start_connects_once_from_idle() {
    let h = TestHarness::new();

    h.handle.start().unwrap();
    h.handle.start().unwrap();
    h.wait_for_connects(1).await;
    let snapshot = h.settle().await;

    assert_eq!(snapshot.state, SessionState::Connecting);
    assert!(!snapshot.reconnect_guard_held);
    assert_eq!(h.transport.connect_count(), 1);
}

#[tokio::test]
async fn failed_start_waits_for_operator() {
    let h = TestHarness::new();
    h.transport.queue_outcome(ConnectOutcome::Fail("sidecar not running"));

    h.handle.start().unwrap();
    h.wait_until(|s| s.state == SessionState::AwaitingOperatorConfirm)
        .await;

    assert!(h.operator.any_text_contains("sidecar not running"));
}

#[tokio::test]
async fn connected_notice_includes_main_command() {
    let h = TestHarness::new();
    h.into_open().await;

    let notice = h.operator.last_text().unwrap();
    assert!(notice.starts_with("Connected."));
    assert!(notice.contains(MAIN_COMMAND));
}

#[tokio::test]
async fn logout_command_ends_active_session() {
    let h = TestHarness::new();
    h.into_open().await;

    h.operator("/logout");
    let snapshot = h.snapshot().await;

    assert_eq!(snapshot.state, SessionState::AwaitingOperatorConfirm);
    assert!(snapshot.pending_confirmation);
    assert_eq!(h.transport.logout_count(), 1);
    assert_eq!(h.credentials.wipe_count(), 1);
    assert!(h.operator.last_text().unwrap().contains("Session closed"));
}

#[tokio::test]
async fn logout_command_without_session_only_notifies() {
    let h = TestHarness::new();

    h.operator("/logout");
    let snapshot = h.snapshot().await;

    assert_eq!(snapshot.state, SessionState::Idle);
    assert_eq!(h.transport.logout_count(), 0);
    assert_eq!(h.credentials.wipe_count(), 0);
    assert!(h.operator.last_text().unwrap().contains("no active session"));
}

#[tokio::test]
async fn logout_command_wipes_even_if_transport_logout_fails() {
    let h = TestHarness::new();
    h.into_open().await;
    h.transport.fail_logout();

    h.operator("/LOGOUT");
    let snapshot = h.snapshot().await;

    assert_eq!(snapshot.state, SessionState::AwaitingOperatorConfirm);
    assert_eq!(h.credentials.wipe_count(), 1);
}

#[tokio::test]
async fn force_logout_wipes_and_restarts() {
    let h = TestHarness::new();
    h.into_open().await;
    h.transport.fail_logout();

    h.operator("/forcelogout");
    let snapshot = h.snapshot().await;

    assert_eq!(h.transport.logout_count(), 1);
    assert_eq!(h.credentials.wipe_count(), 1);
    assert_eq!(h.process.restart_count(), 1);
    assert_eq!(snapshot.state, SessionState::AwaitingOperatorConfirm);
    assert!(h.operator.any_text_contains("Session data removed"));
}

#[tokio::test]
async fn restart_command_reports_outcome() {
    let h = TestHarness::new();

    h.operator("/restart");
    h.snapshot().await;
    assert_eq!(h.process.restart_count(), 1);
    assert_eq!(h.operator.last_text().unwrap(), "Restart requested.");

    h.process.fail_restarts();
    h.operator("/restart");
    h.snapshot().await;
    assert_eq!(h.process.restart_count(), 2);
    assert!(h.operator.last_text().unwrap().starts_with("Restart failed"));
}

#[tokio::test]
async fn restart_command_leaves_session_state_alone() {
    let h = TestHarness::new();
    h.into_open().await;

    h.operator("/restart");
    let snapshot = h.snapshot().await;

    assert_eq!(snapshot.state, SessionState::Open);
    assert_eq!(h.credentials.wipe_count(), 0);
}
