//! Multi-step scenarios and invariants that must hold between inputs.

use super::harness::{TestHarness, CONFIRM_TOKEN};
use crate::{SessionState, SupervisorSnapshot};

fn assert_invariants(snapshot: &SupervisorSnapshot) {
    if snapshot.pending_confirmation {
        assert_eq!(
            snapshot.state,
            SessionState::AwaitingOperatorConfirm,
            "pending confirmation outside AwaitingOperatorConfirm: {:?}",
            snapshot
        );
    }
}

#[tokio::test]
async fn pairing_then_close_reconnects_once_and_forwards_code_once() {
    let h = TestHarness::new();

    h.pairing(b"pairing-code-X");
    h.closed();
    h.wait_for_connects(1).await;
    h.wait_until(|s| !s.reconnect_guard_held).await;
    h.settle().await;

    assert_eq!(h.transport.connect_count(), 1);
    assert_eq!(h.operator.images(), vec![b"pairing-code-X".to_vec()]);
    assert!(h.operator.any_text_contains("new sign-in is required"));
}

#[tokio::test]
async fn pairing_clears_pending_confirmation() {
    let h = TestHarness::new();
    h.into_awaiting_confirm().await;

    h.pairing(b"code");
    let snapshot = h.snapshot().await;

    assert_eq!(snapshot.state, SessionState::AwaitingPairing);
    assert!(!snapshot.pending_confirmation);
}

#[tokio::test]
async fn pairing_leaves_guard_untouched() {
    let h = TestHarness::new();
    h.transport.hold_connects();
    h.closed();
    h.wait_for_connects(1).await;

    h.pairing(b"code");
    assert!(h.snapshot().await.reconnect_guard_held);

    h.transport.release_connects(1);
    h.wait_until(|s| !s.reconnect_guard_held).await;
}

#[tokio::test]
async fn opened_clears_guard_and_pending_from_any_state() {
    let h = TestHarness::new();

    // Idle
    h.opened();
    let s = h.snapshot().await;
    assert_eq!(s.state, SessionState::Open);

    // AwaitingOperatorConfirm
    h.logged_out();
    assert!(h.snapshot().await.pending_confirmation);
    h.opened();
    let s = h.snapshot().await;
    assert!(!s.pending_confirmation);
    assert_eq!(s.state, SessionState::Open);

    // Connecting with the guard held
    h.transport.hold_connects();
    h.closed();
    h.wait_for_connects(1).await;
    assert!(h.snapshot().await.reconnect_guard_held);
    h.opened();
    let s = h.snapshot().await;
    assert!(!s.reconnect_guard_held);
    assert_eq!(s.state, SessionState::Open);

    // AwaitingPairing
    h.pairing(b"code");
    h.opened();
    assert_eq!(h.state().await, SessionState::Open);

    h.transport.release_connects(1);
}

#[tokio::test]
async fn invariants_hold_across_a_full_lifecycle() {
    let h = TestHarness::new();
    h.transport.hold_connects();

    h.handle.start().unwrap();
    assert_invariants(&h.snapshot().await);
    h.transport.release_connects(1);
    h.wait_for_connects(1).await;

    h.pairing(b"code");
    assert_invariants(&h.snapshot().await);

    h.opened();
    assert_invariants(&h.snapshot().await);

    h.closed();
    h.closed();
    assert_invariants(&h.snapshot().await);
    h.transport.release_connects(1);
    h.wait_until(|s| !s.reconnect_guard_held).await;

    h.opened();
    h.logged_out();
    let s = h.snapshot().await;
    assert_invariants(&s);
    assert_eq!(s.state, SessionState::AwaitingOperatorConfirm);

    h.operator(CONFIRM_TOKEN);
    assert_invariants(&h.snapshot().await);
    h.transport.release_connects(1);
    h.wait_for_connects(3).await;

    h.opened();
    let s = h.snapshot().await;
    assert_invariants(&s);
    assert_eq!(s.state, SessionState::Open);
    assert_eq!(h.credentials.wipe_count(), 1);
    assert_eq!(h.transport.connect_count(), 3);
}

#[tokio::test]
async fn handle_reports_stopped_supervisor() {
    let h = TestHarness::new();
    assert!(h.handle.is_running());

    let handle = h.handle.clone();
    drop(h);
    tokio::task::yield_now().await;

    assert!(handle.snapshot().await.is_err());
}
