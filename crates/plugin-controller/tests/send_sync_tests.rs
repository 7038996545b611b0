//! Tests to verify that controller types can cross task boundaries.

use plugin_controller::*;

const fn assert_send_sync<T: Send + Sync + ?Sized>() {}

#[test]
fn test_reconciler_is_send_sync() {
    assert_send_sync::<Reconciler>();
    assert_send_sync::<PassReport>();
}

#[test]
fn test_controller_types_are_send_sync() {
    assert_send_sync::<ControllerHandle>();
    assert_send_sync::<Notification>();
}

#[test]
fn test_stores_are_send_sync() {
    assert_send_sync::<MemoryResourceStore>();
    assert_send_sync::<FileResourceStore>();
}

#[test]
fn test_error_is_send_sync() {
    assert_send_sync::<ReconcileError>();
}
