//! Tests to verify that all public types are Send + Sync as required.

use plugin_core::traits::{BundleSource, ResourceStore};
use plugin_core::*;

const fn assert_send_sync<T: Send + Sync + ?Sized>() {}

#[test]
fn test_domain_types_are_send_sync() {
    assert_send_sync::<PluginResource>();
    assert_send_sync::<PluginEntry>();
    assert_send_sync::<CacheState>();
    assert_send_sync::<Selector>();
}

#[test]
fn test_config_types_are_send_sync() {
    assert_send_sync::<ReconcilerConfig>();
    assert_send_sync::<Setting>();
    assert_send_sync::<SizePolicy>();
}

#[test]
fn test_trait_objects_are_send_sync() {
    assert_send_sync::<dyn ResourceStore>();
    assert_send_sync::<dyn BundleSource>();
}

#[test]
fn test_error_is_send_sync() {
    assert_send_sync::<Error>();
}
