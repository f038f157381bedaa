//! 화물 주문 관리 API 서버.
//!
//! 설정 파일(`config/default.toml`)과 `CARGOMS__*` 환경 변수로 구성합니다.
//! `database.url`/`redis.url`이 없으면 인메모리 저장소/캐시로 실행합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{http::StatusCode, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use cargoms_api::routes::create_api_router;
use cargoms_api::state::{AppState, Stores};
use cargoms_api::TokenService;
use cargoms_core::{init_logging, AppConfig, LogConfig};
use cargoms_data::{
    CacheAside, CacheBackend, CacheTtl, Database, MemoryCache, MemoryStore, PgStore, RedisCache,
};

/// 저장소 구성.
///
/// URL이 없으면 인메모리 저장소를 사용합니다.
async fn build_stores(config: &AppConfig) -> anyhow::Result<(Stores, Option<Database>)> {
    let Some(url) = config.database.url.as_deref() else {
        warn!("database.url not set, using in-memory store (data is not persisted)");
        return Ok((Stores::shared(Arc::new(MemoryStore::new())), None));
    };

    let database = Database::connect(url, &config.database)
        .await
        .context("Failed to connect to PostgreSQL")?;

    if config.database.run_migrations {
        database.migrate().await.context("Failed to run migrations")?;
        info!("Database migrations applied");
    }

    let store = Arc::new(PgStore::new(database.clone()));
    Ok((Stores::shared(store), Some(database)))
}

/// 캐시 백엔드 구성.
///
/// Redis 연결에 실패해도 서버는 인메모리 캐시로 계속 동작합니다.
async fn build_cache_backend(config: &AppConfig) -> (Arc<dyn CacheBackend>, Option<Arc<RedisCache>>) {
    let Some(url) = config.redis.url.as_deref() else {
        info!("redis.url not set, using in-memory cache");
        return (memory_cache(), None);
    };

    match RedisCache::connect(url, config.redis.key_prefix.clone()).await {
        Ok(redis) => {
            let redis = Arc::new(redis);
            let backend: Arc<dyn CacheBackend> = redis.clone();
            (backend, Some(redis))
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to Redis, falling back to in-memory cache");
            (memory_cache(), None)
        }
    }
}

fn memory_cache() -> Arc<dyn CacheBackend> {
    Arc::new(MemoryCache::new())
}

/// CORS 미들웨어 구성.
///
/// `CORS_ORIGINS` 환경 변수(쉼표 구분)가 있으면 해당 origin만 허용합니다.
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        _ => {
            warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        .max_age(Duration::from_secs(3600))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_path =
        std::env::var("CARGOMS_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    let config = AppConfig::load(&config_path).context("Failed to load configuration")?;

    init_logging(LogConfig::from(&config.logging))
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(config = %config_path, "Starting cargoms-api");

    let (stores, database) = build_stores(&config).await?;
    let (backend, redis) = build_cache_backend(&config).await;
    let cache = Arc::new(CacheAside::new(backend, CacheTtl::from(config.cache)));
    let tokens = Arc::new(TokenService::new(&config.jwt));

    let mut state = AppState::new(stores, cache, tokens);
    if let Some(database) = database {
        state = state.with_database(database);
    }
    if let Some(redis) = redis {
        state = state.with_redis(redis);
    }

    let app: Router = create_api_router()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_secs),
        ))
        .layer(cors_layer())
        .with_state(Arc::new(state));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
