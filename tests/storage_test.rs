//! Integration tests for the storage layer: link lifecycle, short-code
//! uniqueness, partial updates, and click-log ownership.

use std::sync::Arc;

use waypost::models::{LinkPatch, NewClick, NewLink};
use waypost::storage::{SqliteStorage, Storage, StorageError};

async fn create_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

fn new_link(code: &str, destination: &str) -> NewLink {
    NewLink {
        short_code: code.to_string(),
        destination_url: destination.to_string(),
        title: None,
        description: None,
    }
}

fn new_click(link_id: i64, ip: &str, timestamp: i64) -> NewClick {
    NewClick {
        link_id,
        ip_address: ip.to_string(),
        user_agent: None,
        referer: None,
        country: None,
        country_code: None,
        region: None,
        city: None,
        latitude: None,
        longitude: None,
        timezone: None,
        isp: None,
        timestamp,
    }
}

#[tokio::test]
async fn link_lifecycle() {
    let storage = create_storage().await;

    let link = storage
        .create_link(&new_link("abc123", "https://example.com/"))
        .await
        .unwrap();
    assert_eq!(link.short_code, "abc123");
    assert_eq!(link.clicks, 0);
    assert!(link.is_active);

    let by_code = storage.get_link_by_code("abc123").await.unwrap().unwrap();
    assert_eq!(by_code.id, link.id);
    assert_eq!(by_code.destination_url, "https://example.com/");

    let by_id = storage.get_link(link.id).await.unwrap().unwrap();
    assert_eq!(by_id.short_code, "abc123");

    assert!(storage.code_exists("abc123").await.unwrap());
    assert!(!storage.code_exists("missing").await.unwrap());

    assert!(storage.delete_link(link.id).await.unwrap());
    assert!(storage.get_link(link.id).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_create_yields_one_winner() {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    let storage: Arc<dyn Storage> = Arc::new(storage);

    let mut handles = vec![];
    for _ in 0..10 {
        let storage = Arc::clone(&storage);
        handles.push(tokio::spawn(async move {
            storage
                .create_link(&new_link("same-code", "https://example.com/"))
                .await
        }));
    }

    let mut success_count = 0;
    let mut conflict_count = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => success_count += 1,
            Err(StorageError::Conflict) => conflict_count += 1,
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    assert_eq!(success_count, 1, "exactly one creation should succeed");
    assert_eq!(conflict_count, 9, "all others should get conflict");
}

#[tokio::test]
async fn codes_stay_unique_across_inactive_links() {
    let storage = create_storage().await;

    let link = storage
        .create_link(&new_link("kept", "https://example.com/"))
        .await
        .unwrap();

    // Deactivate; the code must still be taken
    storage
        .update_link(
            link.id,
            &LinkPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = storage
        .create_link(&new_link("kept", "https://other.example/"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}

#[tokio::test]
async fn partial_update_leaves_other_fields() {
    let storage = create_storage().await;

    let link = storage
        .create_link(&NewLink {
            short_code: "patchme".to_string(),
            destination_url: "https://example.com/".to_string(),
            title: Some("Original".to_string()),
            description: Some("Desc".to_string()),
        })
        .await
        .unwrap();

    let updated = storage
        .update_link(
            link.id,
            &LinkPatch {
                title: Some("Changed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.title.as_deref(), Some("Changed"));
    assert_eq!(updated.description.as_deref(), Some("Desc"));
    assert_eq!(updated.destination_url, "https://example.com/");
    assert_eq!(updated.short_code, "patchme");

    let missing = storage
        .update_link(9999, &LinkPatch::default())
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn click_log_append_and_range_query() {
    let storage = create_storage().await;
    let link = storage
        .create_link(&new_link("clicked", "https://example.com/"))
        .await
        .unwrap();

    for i in 0..5 {
        storage
            .insert_click(&new_click(link.id, "203.0.113.1", 1_000 + i))
            .await
            .unwrap();
        storage.increment_clicks(link.id).await.unwrap();
    }

    assert_eq!(storage.click_count(link.id).await.unwrap(), 5);
    let link = storage.get_link(link.id).await.unwrap().unwrap();
    assert_eq!(link.clicks, 5);

    let all = storage.clicks_for_link(link.id, None).await.unwrap();
    assert_eq!(all.len(), 5);
    // Oldest first
    assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    let recent = storage.clicks_for_link(link.id, Some(1_003)).await.unwrap();
    assert_eq!(recent.len(), 2);
}

#[tokio::test]
async fn delete_cascades_click_history() {
    let storage = create_storage().await;
    let link = storage
        .create_link(&new_link("doomed", "https://example.com/"))
        .await
        .unwrap();
    let other = storage
        .create_link(&new_link("spared", "https://example.org/"))
        .await
        .unwrap();

    for i in 0..3 {
        storage
            .insert_click(&new_click(link.id, "203.0.113.1", i))
            .await
            .unwrap();
    }
    storage
        .insert_click(&new_click(other.id, "203.0.113.2", 0))
        .await
        .unwrap();

    assert!(storage.delete_link(link.id).await.unwrap());

    // No orphaned click records for the deleted link
    assert_eq!(storage.click_count(link.id).await.unwrap(), 0);
    // The other link's history is untouched
    assert_eq!(storage.click_count(other.id).await.unwrap(), 1);
}

#[tokio::test]
async fn list_is_paginated_newest_first() {
    let storage = create_storage().await;
    for i in 0..5 {
        storage
            .create_link(&new_link(&format!("code{i}"), "https://example.com/"))
            .await
            .unwrap();
    }

    let page = storage.list_links(2, 0).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].short_code, "code4");

    let rest = storage.list_links(10, 2).await.unwrap();
    assert_eq!(rest.len(), 3);
}
