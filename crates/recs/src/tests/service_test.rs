//! Service-level scenarios over trained models and the in-memory store

use super::support::{event, product, MemoryStore};
use crate::collaborative::CollaborativeModel;
use crate::content::ContentModel;
use crate::service::RecommendationService;
use crate::EngineConfig;
use std::sync::Arc;
use storefront_core::{aggregate_interactions, InteractionRecord, InteractionType, ProductRecord};

fn catalog() -> Vec<ProductRecord> {
    vec![
        product("p1", "electronics", "acme", 999.0, "gaming laptop with fast gpu"),
        product("p2", "electronics", "acme", 899.0, "ultralight laptop for travel"),
        product("p3", "books", "inkwell", 15.0, "a long historical novel"),
    ]
}

fn history() -> Vec<InteractionRecord> {
    vec![
        event("u1", "p1", InteractionType::Purchase, 10),
        event("u1", "p2", InteractionType::View, 20),
        event("u2", "p1", InteractionType::View, 5),
        event("u3", "p3", InteractionType::View, 30),
    ]
}

fn trained_collaborative(events: &[InteractionRecord]) -> CollaborativeModel {
    let interactions = aggregate_interactions(events);
    let mut model = CollaborativeModel::prepare(&interactions).unwrap();
    model.train_user_similarity();
    model.train_item_similarity();
    model.train_factorization(1).unwrap();
    model
}

fn trained_content(products: &[ProductRecord]) -> ContentModel {
    let mut model = ContentModel::prepare(products).unwrap();
    model.train();
    model
}

fn config() -> EngineConfig {
    EngineConfig {
        factor_rank: 1,
        ..EngineConfig::default()
    }
}

fn service_with(store: MemoryStore) -> RecommendationService {
    let events = store.interactions.clone();
    let products = store.products.clone();
    RecommendationService::new(
        Arc::new(store),
        Some(trained_collaborative(&events)),
        Some(trained_content(&products)),
        config(),
    )
}

#[tokio::test]
async fn test_recommendations_exclude_observed_items() {
    let service = service_with(MemoryStore::with_data(history(), catalog()));

    let results = service.recommend_for_user("u2", 10).await;

    assert!(results.iter().all(|d| d.id != "p1"));
    assert!(results.iter().any(|d| d.id == "p2"));
}

#[tokio::test]
async fn test_cold_start_user_gets_empty_list() {
    let service = service_with(MemoryStore::with_data(history(), catalog()));

    let results = service.recommend_for_user("nobody", 10).await;

    assert!(results.is_empty());
}

#[tokio::test]
async fn test_content_only_path_covers_user_unknown_to_collaborative() {
    // The visitor only exists in the event log, not in the trained model,
    // so all signal flows through recent items and content similarity.
    let mut events = history();
    events.push(event("visitor", "p1", InteractionType::View, 1));
    let collaborative = trained_collaborative(&history());
    let products = catalog();
    let content = trained_content(&products);

    let store = MemoryStore::with_data(events, products);
    let service = RecommendationService::new(
        Arc::new(store),
        Some(collaborative),
        Some(content),
        config(),
    );

    let results = service.recommend_for_user("visitor", 10).await;

    assert!(!results.is_empty());
    assert_eq!(results[0].id, "p2");
    assert!(results.iter().all(|d| d.id != "p1"));
}

#[tokio::test]
async fn test_trending_ranks_purchases_above_views() {
    let events = vec![
        event("u1", "p1", InteractionType::Purchase, 60),
        event("u2", "p2", InteractionType::View, 30),
        event("u3", "p2", InteractionType::View, 45),
        // Outside the trailing window, must not count.
        event("u4", "p3", InteractionType::Purchase, 60 * 24 * 30),
    ];
    let service = service_with(MemoryStore::with_data(events, catalog()));

    let results = service.get_trending_products(10, 7).await;

    let ids: Vec<&str> = results.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2"]);
}

#[tokio::test]
async fn test_similar_products_preserve_ranked_order() {
    let service = service_with(MemoryStore::with_data(history(), catalog()));

    let results = service.get_similar_products("p1", 10).await;

    // p2 shares category, brand, and description terms with p1; p3 does not.
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "p2");
    assert_eq!(results[1].id, "p3");
}

#[tokio::test]
async fn test_similar_products_empty_for_unknown_product() {
    let service = service_with(MemoryStore::with_data(history(), catalog()));

    let results = service.get_similar_products("missing", 10).await;

    assert!(results.is_empty());
}

#[tokio::test]
async fn test_homepage_bundle_sections() {
    let service = service_with(MemoryStore::with_data(history(), catalog()));

    let bundle = service.get_personalized_homepage("u2").await;

    assert!(!bundle.trending.is_empty());
    // u2 last viewed p1, so the similar section mirrors content similarity.
    assert_eq!(bundle.similar_to_viewed[0].id, "p2");
    assert!(bundle
        .recommended_for_you
        .iter()
        .all(|d| d.id != "p1"));
}

#[tokio::test]
async fn test_homepage_degrades_per_section_on_store_failure() {
    let mut store = MemoryStore::with_data(history(), catalog());
    store.fail_trending = true;
    store.fail_last_viewed = true;
    let events = store.interactions.clone();
    let products = store.products.clone();
    let service = RecommendationService::new(
        Arc::new(store),
        Some(trained_collaborative(&events)),
        Some(trained_content(&products)),
        config(),
    );

    let bundle = service.get_personalized_homepage("u2").await;

    assert!(bundle.trending.is_empty());
    assert!(bundle.similar_to_viewed.is_empty());
    assert!(!bundle.recommended_for_you.is_empty());
}

#[tokio::test]
async fn test_detail_resolution_failure_degrades_to_empty() {
    let mut store = MemoryStore::with_data(history(), catalog());
    store.fail_details = true;
    let events = store.interactions.clone();
    let products = store.products.clone();
    let service = RecommendationService::new(
        Arc::new(store),
        Some(trained_collaborative(&events)),
        Some(trained_content(&products)),
        config(),
    );

    assert!(service.recommend_for_user("u2", 10).await.is_empty());
    assert!(service.get_similar_products("p1", 10).await.is_empty());
}

#[tokio::test]
async fn test_service_without_models_serves_empty_personalization() {
    let store = MemoryStore::with_data(history(), catalog());
    let service = RecommendationService::new(Arc::new(store), None, None, config());

    assert!(!service.has_models());
    assert!(service.recommend_for_user("u1", 10).await.is_empty());
    assert!(service.get_similar_products("p1", 10).await.is_empty());
    // Trending needs no model and keeps working.
    assert!(!service.get_trending_products(10, 7).await.is_empty());
}

#[tokio::test]
async fn test_inactive_products_drop_out_of_results() {
    // p2 is known to the models but missing from the detail store, as
    // happens when a product is deactivated after training.
    let mut store = MemoryStore::with_data(history(), catalog());
    let events = store.interactions.clone();
    let products = store.products.clone();
    store.products.retain(|p| p.id != "p2");
    let service = RecommendationService::new(
        Arc::new(store),
        Some(trained_collaborative(&events)),
        Some(trained_content(&products)),
        config(),
    );

    let results = service.get_similar_products("p1", 10).await;
    assert!(results.iter().all(|d| d.id != "p2"));
}
