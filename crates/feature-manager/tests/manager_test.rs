use common::{CountingReader, ROUND_TRIP_DOCUMENT, sample_path};
use open_feature_feature_manager::{
    FeatureManager, FeatureManagerError, FeatureManagerOptions, FlagState, SourceFailure,
    SourceType,
};
use serde_json::json;
use std::sync::Arc;
use test_log::test;

mod common;

fn local_manager() -> FeatureManager {
    FeatureManager::new(
        FeatureManagerOptions::default()
            .with_source_type(SourceType::Local)
            .with_source_location(sample_path("feature1.json").to_string_lossy().to_string()),
    )
    .unwrap()
}

fn counting_manager(ttl_seconds: u64) -> (FeatureManager, Arc<CountingReader>) {
    let reader = Arc::new(CountingReader::new(ROUND_TRIP_DOCUMENT));
    let manager = FeatureManager::with_reader(
        FeatureManagerOptions::default().with_ttl_seconds(ttl_seconds),
        reader.clone(),
    );
    (manager, reader)
}

#[test]
fn test_empty_config_uses_defaults() {
    let manager = FeatureManager::new(serde_json::from_str("{}").unwrap()).unwrap();

    assert_eq!(manager.config(), &FeatureManagerOptions::default());
    assert_eq!(
        serde_json::to_value(manager.config()).unwrap(),
        json!({
            "sourceType": "local",
            "sourceLocation": "features.json",
            "ttlSeconds": 86400
        })
    );
}

#[test]
fn test_config_is_kept_with_defaults_filled_in() {
    let options: FeatureManagerOptions =
        serde_json::from_value(json!({"sourceType": "local", "sourceUrl": "/tmp/feature1.json"}))
            .unwrap();
    let manager = FeatureManager::new(options).unwrap();

    assert_eq!(manager.config().source_type, SourceType::Local);
    assert_eq!(manager.config().source_location, "/tmp/feature1.json");
    assert_eq!(manager.config().ttl_seconds, 86400);
    assert_eq!(manager.expires_at().timestamp(), 0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let result = FeatureManager::new(
        FeatureManagerOptions::default()
            .with_source_type(SourceType::Http)
            .with_source_location("features.json"),
    );

    assert!(matches!(result, Err(FeatureManagerError::Config(_))));
}

#[test]
fn test_sync_check_before_first_refresh_fails() {
    let manager = local_manager();

    assert_eq!(
        manager.is_enabled_sync("any.feature"),
        Err(FeatureManagerError::NotInitialized)
    );
}

#[test(tokio::test)]
async fn test_local_feature_list() {
    let manager = local_manager();
    let document = manager.feature_document(false).await.unwrap();

    let expected: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(sample_path("feature1.json")).unwrap())
            .unwrap();
    assert_eq!(serde_json::to_value(document.as_ref()).unwrap(), expected);
    assert!(manager.expires_at().timestamp() > 0);
}

#[test(tokio::test)]
async fn test_local_features_from_cache() {
    let manager = local_manager();
    manager.feature_document(false).await.unwrap();

    assert_eq!(manager.is_enabled_sync("some.feature"), Ok(true));
    assert_eq!(manager.is_enabled_sync("feature.with.options"), Ok(true));
    assert_eq!(manager.is_enabled_sync("feature.not.listed"), Ok(false));
    assert_eq!(manager.is_enabled_sync("feature.explicitly.disabled"), Ok(false));
    assert_eq!(
        manager.is_enabled_sync("feature.with.options.explicitly.not.enabled"),
        Ok(false)
    );
    assert_eq!(
        manager.is_enabled_sync("feature.with.options.explicitly.disabled"),
        Ok(false)
    );
}

#[test(tokio::test)]
async fn test_missing_local_file_is_source_unavailable() {
    let manager = FeatureManager::new(
        FeatureManagerOptions::default().with_source_location("/nonexistent/features.json"),
    )
    .unwrap();

    assert!(matches!(
        manager.is_enabled("some.feature").await,
        Err(FeatureManagerError::SourceUnavailable {
            cause: SourceFailure::NotFound,
            ..
        })
    ));
    assert_eq!(
        manager.is_enabled_sync("some.feature"),
        Err(FeatureManagerError::NotInitialized)
    );
}

#[test(tokio::test)]
async fn test_round_trip_document() {
    let (manager, _) = counting_manager(3600);

    assert_eq!(manager.is_enabled("a").await, Ok(true));
    assert_eq!(manager.is_enabled("b").await, Ok(false));
    assert_eq!(manager.is_enabled("c").await, Ok(true));
    assert_eq!(manager.is_enabled("missing").await, Ok(false));
}

#[test(tokio::test)]
async fn test_options_and_option() {
    let (manager, reader) = counting_manager(3600);

    assert_eq!(manager.options("a").await, Ok(Some(FlagState::Toggle(true))));
    assert_eq!(manager.options("missing").await, Ok(None));

    let Ok(Some(FlagState::Options(options))) = manager.options("c").await else {
        panic!("expected an options record for c");
    };
    assert_eq!(options.enabled, None);
    assert_eq!(options.extra.get("option1"), Some(&json!("x")));

    assert_eq!(manager.option("c", "option1").await, Ok(Some(json!("x"))));
    assert_eq!(manager.option("c", "option2").await, Ok(None));
    assert_eq!(manager.option("a", "option1").await, Ok(None));

    assert_eq!(reader.calls(), 1);
}

#[test(tokio::test)]
async fn test_cached_within_ttl() {
    let (manager, reader) = counting_manager(3600);

    manager.is_enabled("a").await.unwrap();
    manager.is_enabled("b").await.unwrap();
    manager.options("c").await.unwrap();

    assert_eq!(reader.calls(), 1);
}

#[test(tokio::test)]
async fn test_zero_ttl_refetches_each_call() {
    let (manager, reader) = counting_manager(0);

    manager.is_enabled("a").await.unwrap();
    manager.is_enabled("a").await.unwrap();

    assert_eq!(reader.calls(), 2);
}

#[test(tokio::test)]
async fn test_sync_check_after_expiry_fails() {
    let (manager, _) = counting_manager(0);

    assert_eq!(manager.is_enabled("a").await, Ok(true));
    assert_eq!(
        manager.is_enabled_sync("a"),
        Err(FeatureManagerError::NotInitialized)
    );
}

#[test(tokio::test)]
async fn test_failed_refresh_serves_stale_document() {
    let (manager, reader) = counting_manager(3600);

    let original = manager.feature_document(false).await.unwrap();
    let expires_at = manager.expires_at();

    reader.respond_with(Err(FeatureManagerError::MalformedDocument(
        "truncated".to_string(),
    )));
    assert!(manager.feature_document(true).await.is_err());

    assert_eq!(manager.expires_at(), expires_at);
    assert_eq!(manager.is_enabled("a").await, Ok(true));
    assert_eq!(manager.is_enabled_sync("b"), Ok(false));
    assert!(Arc::ptr_eq(
        &original,
        &manager.feature_document(false).await.unwrap()
    ));
    assert_eq!(reader.calls(), 2);
}

#[test(tokio::test)]
async fn test_forced_refresh_picks_up_changes() {
    let (manager, reader) = counting_manager(3600);

    assert_eq!(manager.is_enabled("b").await, Ok(false));

    reader.respond_with(Ok(r#"{"b": true}"#.to_string()));
    assert_eq!(manager.is_enabled("b").await, Ok(false));

    manager.feature_document(true).await.unwrap();
    assert_eq!(manager.is_enabled("b").await, Ok(true));
    assert_eq!(manager.is_enabled("a").await, Ok(false));
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_concurrent_lookups_share_fetches() {
    let (manager, reader) = counting_manager(3600);
    let manager = Arc::new(manager);

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.is_enabled("a").await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), Ok(true));
    }
    assert_eq!(reader.calls(), 1);
}
