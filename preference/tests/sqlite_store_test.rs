//! Integration tests for [`preference::SqlitePreferenceStore`].
//!
//! Covers write-through updates, reset semantics, and the previous-family
//! pointer using an in-memory SQLite database.

use preference::{ContextPatch, PreferenceStore, SqlitePreferenceStore};

async fn store() -> SqlitePreferenceStore {
    SqlitePreferenceStore::new("sqlite::memory:")
        .await
        .expect("Failed to create store")
}

/// **Test: Update writes through and get reads it back.**
///
/// **Setup:** In-memory DB; update "washer" with device id and spec key.
/// **Action:** `get("washer")`.
/// **Expected:** Both fields present; unrelated fields remain `None`.
#[tokio::test]
async fn test_update_then_get() {
    let store = store().await;

    store
        .update(
            "washer",
            ContextPatch {
                device_id: Some("WM4500H*A".to_string()),
                active_spec_key: Some("net weight".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to update");

    let ctx = store.get("washer").await.expect("Failed to get");
    assert_eq!(ctx.device_id.as_deref(), Some("WM4500H*A"));
    assert_eq!(ctx.active_spec_key.as_deref(), Some("net weight"));
    assert!(ctx.preferred_unit.is_none());
}

/// **Test: Get for an unknown family yields an empty context, no error.**
#[tokio::test]
async fn test_get_unknown_family() {
    let store = store().await;
    let ctx = store.get("refrigerator").await.expect("Failed to get");
    assert_eq!(ctx.product_family, "refrigerator");
    assert!(ctx.device_id.is_none());
    assert!(ctx.last_question.is_none());
}

/// **Test: Partial patches never clobber fields set by earlier turns.**
///
/// **Setup:** Update device id, then update only the preferred unit.
/// **Expected:** Both fields survive.
#[tokio::test]
async fn test_patches_accumulate() {
    let store = store().await;

    store
        .update(
            "dryer",
            ContextPatch {
                device_id: Some("DLEX3900W".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to update");
    store
        .update(
            "dryer",
            ContextPatch {
                preferred_unit: Some("inch".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to update");

    let ctx = store.get("dryer").await.expect("Failed to get");
    assert_eq!(ctx.device_id.as_deref(), Some("DLEX3900W"));
    assert_eq!(ctx.preferred_unit.as_deref(), Some("inch"));
}

/// **Test: Reset clears all fields of all families but keeps the rows and
/// the previous-family pointer.**
#[tokio::test]
async fn test_reset_keeps_family_keys() {
    let store = store().await;

    for family in ["washer", "dryer"] {
        store
            .update(
                family,
                ContextPatch {
                    device_id: Some("WM4500H*A".to_string()),
                    last_question: Some("what is the net weight".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("Failed to update");
    }
    store
        .set_previous_family("washer")
        .await
        .expect("Failed to set previous family");

    store.reset().await.expect("Failed to reset");

    let families = store.families().await.expect("Failed to list families");
    assert_eq!(families, vec!["dryer".to_string(), "washer".to_string()]);
    for family in families {
        let ctx = store.get(&family).await.expect("Failed to get");
        assert!(ctx.device_id.is_none());
        assert!(ctx.last_question.is_none());
    }
    assert_eq!(
        store.previous_family().await.expect("Failed").as_deref(),
        Some("washer")
    );
}

/// **Test: Previous-family pointer round-trips and is overwritten in place.**
#[tokio::test]
async fn test_previous_family_pointer() {
    let store = store().await;
    assert!(store.previous_family().await.expect("Failed").is_none());

    store.set_previous_family("washer").await.expect("Failed");
    store.set_previous_family("dryer").await.expect("Failed");
    assert_eq!(
        store.previous_family().await.expect("Failed").as_deref(),
        Some("dryer")
    );
}
