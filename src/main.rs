use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use schoolhub_api::{
    config::{Config, StoreBackend},
    db, routes,
    store::{MemoryStore, PgStore, SchoolStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let store: Arc<dyn SchoolStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = db::create_pool(&config.database_url).await?;
            db::run_migrations(&pool).await?;
            info!("Database connected and migrations applied");
            Arc::new(PgStore::new(&pool))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store, data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };
    if config.strict_class_access {
        info!("Strict class access: unassigned teachers and staff see no classes");
    }

    let state = AppState {
        store,
        config: config.clone(),
    };

    // Allow the configured front-end origin. Localhost is always allowed for
    // development.
    let base = config.app_base_url.clone();
    let cors_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let Ok(o) = origin.to_str() else {
            return false;
        };
        o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1") || o == base
    });

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_origin(cors_origin);

    let app = routes::app(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    info!("schoolhub API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
