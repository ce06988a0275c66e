//! The meta-tool dispatcher's effective permission set is the
//! intersection of the instance ceiling and the session's own scopes
//! (spec §4.I). `forgetful-core`'s own unit tests cover this against a
//! stub executor; this test wires the dispatcher to the real
//! [`ServiceExecutor`] to confirm the intersection holds end-to-end
//! against live domain services.

mod common;

use forgetful_core::tools::dispatcher::ToolDispatcher;
use forgetful_core::tools::registry::ToolRegistry;
use forgetful_core::tools::scope::parse_scopes;
use forgetful_core::error::Error;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn session_scope_narrows_the_instance_ceiling() {
    let fx = common::build().await;
    let instance_scopes = parse_scopes("*").unwrap();
    let dispatcher = ToolDispatcher::new(ToolRegistry::with_defaults(), Arc::new(fx.executor), instance_scopes);

    let session_read_only = parse_scopes("read").unwrap();

    let denied = dispatcher
        .execute(
            fx.user,
            Some(&session_read_only),
            "create_memory",
            json!({ "title": "Should be denied", "content": "Session is read-only." }),
        )
        .await
        .unwrap_err();
    assert!(matches!(denied, Error::PermissionDenied { .. }));

    let allowed = dispatcher
        .execute(fx.user, Some(&session_read_only), "query_memory", json!({ "query": "anything" }))
        .await
        .unwrap();
    assert!(allowed.get("primary_memories").is_some());
}

#[tokio::test]
async fn instance_ceiling_caps_a_broad_session_scope() {
    let fx = common::build().await;
    let instance_scopes = parse_scopes("read:memories").unwrap();
    let dispatcher = ToolDispatcher::new(ToolRegistry::with_defaults(), Arc::new(fx.executor), instance_scopes);

    let session_wants_everything = parse_scopes("*").unwrap();

    let denied = dispatcher
        .execute(
            fx.user,
            Some(&session_wants_everything),
            "create_memory",
            json!({ "title": "Should still be denied", "content": "Instance ceiling disallows writes." }),
        )
        .await
        .unwrap_err();
    assert!(matches!(denied, Error::PermissionDenied { .. }));

    let discoverable = dispatcher.discover(Some(&session_wants_everything));
    assert!(discoverable.iter().any(|t| t.name == "query_memory"));
    assert!(!discoverable.iter().any(|t| t.name == "create_memory"));
}
