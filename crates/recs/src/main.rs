//! Recommendation serving binary
//!
//! Loads the trained model artifacts, connects to PostgreSQL, and exposes the
//! engine over HTTP for the storefront API layer. Missing artifacts degrade
//! to empty personalized sections; /health reports the degradation.

use actix_web::{web, App, HttpResponse, HttpServer};
use serde::Deserialize;
use std::sync::Arc;
use storefront_core::{load_dotenv, ConfigLoader, DatabaseConfig, DatabasePool, ServiceConfig};
use storefront_recs::{EngineConfig, PostgresStore, RecommendationService};
use tracing::{info, warn};

struct AppState {
    service: RecommendationService,
    db: DatabasePool,
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct TrendingQuery {
    limit: Option<usize>,
    window_days: Option<i64>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .json()
        .init();

    let service_config = ServiceConfig::from_env()?;
    let database_config = DatabaseConfig::from_env()?;
    let engine_config = EngineConfig::from_env()?;

    let db = DatabasePool::new(&database_config).await?;
    let store = Arc::new(PostgresStore::new(db.pool().clone()));
    let service = RecommendationService::load(store, engine_config);
    if !service.has_models() {
        warn!("no model artifacts loaded, serving trending-only until next training run");
    }

    let state = web::Data::new(AppState { service, db });

    info!(
        host = %service_config.host,
        port = service_config.port,
        "starting recommendation service"
    );

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/health", web::get().to(health_check))
            .route(
                "/recommendations/{user_id}",
                web::get().to(user_recommendations),
            )
            .route("/similar/{product_id}", web::get().to(similar_products))
            .route("/trending", web::get().to(trending_products))
            .route("/homepage/{user_id}", web::get().to(personalized_homepage))
    })
    .bind((service_config.host.as_str(), service_config.port))?;

    if let Some(workers) = service_config.workers {
        server = server.workers(workers);
    }

    server.run().await?;
    Ok(())
}

async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": if state.db.is_healthy().await { "healthy" } else { "degraded" },
        "service": "storefront-recs",
        "models_loaded": state.service.has_models(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn user_recommendations(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<LimitQuery>,
) -> HttpResponse {
    let user_id = path.into_inner();
    let limit = query.limit.unwrap_or(10);
    let products = state.service.recommend_for_user(&user_id, limit).await;
    HttpResponse::Ok().json(products)
}

async fn similar_products(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<LimitQuery>,
) -> HttpResponse {
    let product_id = path.into_inner();
    let limit = query.limit.unwrap_or(10);
    let products = state.service.get_similar_products(&product_id, limit).await;
    HttpResponse::Ok().json(products)
}

async fn trending_products(
    state: web::Data<AppState>,
    query: web::Query<TrendingQuery>,
) -> HttpResponse {
    let limit = query.limit.unwrap_or(10);
    let window_days = query.window_days.unwrap_or(7);
    let products = state.service.get_trending_products(limit, window_days).await;
    HttpResponse::Ok().json(products)
}

async fn personalized_homepage(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let user_id = path.into_inner();
    let bundle = state.service.get_personalized_homepage(&user_id).await;
    HttpResponse::Ok().json(bundle)
}
