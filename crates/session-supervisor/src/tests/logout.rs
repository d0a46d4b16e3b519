//! Remote logout tests.
//!
//! `Closed{logged_out=true}` wipes credentials exactly once, clears the
//! guard and waits for the operator, whatever state it arrives in.

use super::harness::{TestHarness, CONFIRM_TOKEN};
use crate::SessionState;

async fn assert_logout_handled(h: &TestHarness, wipes_before: usize) {
    h.logged_out();
    let snapshot = h.snapshot().await;

    assert_eq!(snapshot.state, SessionState::AwaitingOperatorConfirm);
    assert!(snapshot.pending_confirmation);
    assert!(!snapshot.reconnect_guard_held);
    assert_eq!(h.credentials.wipe_count(), wipes_before + 1);
}

#[tokio::test]
async fn logged_out_from_idle() {
    let h = TestHarness::new();
    assert_logout_handled(&h, 0).await;
}

#[tokio::test]
async fn logged_out_from_open() {
    let h = TestHarness::new();
    h.into_open().await;
    assert_logout_handled(&h, 0).await;
}

#[tokio::test]
async fn logged_out_from_awaiting_pairing() {
    let h = TestHarness::new();
    h.pairing(b"code");
    assert_eq!(h.state().await, SessionState::AwaitingPairing);
    assert_logout_handled(&h, 0).await;
}

#[tokio::test]
async fn logged_out_from_connecting() {
    let h = TestHarness::new();
    h.transport.hold_connects();
    h.closed();
    h.wait_for_connects(1).await;
    assert_eq!(h.state().await, SessionState::Connecting);

    assert_logout_handled(&h, 0).await;
    h.transport.release_connects(1);
}

#[tokio::test]
async fn logged_out_while_already_awaiting_confirm() {
    let h = TestHarness::new();
    h.into_awaiting_confirm().await;
    assert_logout_handled(&h, 1).await;
}

#[tokio::test]
async fn logged_out_never_connects_on_its_own() {
    let h = TestHarness::new();
    h.logged_out();
    h.settle().await;

    assert_eq!(h.transport.connect_count(), 0);
}

#[tokio::test]
async fn logged_out_notice_names_confirm_token() {
    let h = TestHarness::new();
    h.logged_out();
    h.snapshot().await;

    let notice = h.operator.last_text().unwrap();
    assert!(notice.contains("logged out"));
    assert!(notice.contains(&format!("\"{}\"", CONFIRM_TOKEN)));
}

#[tokio::test]
async fn wipe_failure_still_moves_to_awaiting_confirm() {
    let h = TestHarness::new();
    h.credentials.fail_wipe();

    h.logged_out();
    let snapshot = h.snapshot().await;

    assert_eq!(snapshot.state, SessionState::AwaitingOperatorConfirm);
    assert!(snapshot.pending_confirmation);
    assert_eq!(h.operator.texts().len(), 1);
}

#[tokio::test]
async fn wipe_happens_before_confirmed_reconnect() {
    let h = TestHarness::new();
    h.logged_out();
    h.operator(CONFIRM_TOKEN);
    h.wait_for_connects(1).await;

    assert_eq!(h.credentials.wipe_count(), 1);
    assert!(!h.credentials.exists_now());
}
