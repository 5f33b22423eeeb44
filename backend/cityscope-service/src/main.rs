use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use cityscope_service::config::StoreBackend;
use cityscope_service::db::MemoryStore;
use cityscope_service::handlers::health::ReadinessProbe;
use cityscope_service::middleware::{security_headers, BearerAuth, MetricsMiddleware};
use cityscope_service::routes;
use cityscope_service::services::{AppState, Stores};
use cityscope_service::storage::{BlobStore, MemoryBlobStore, S3BlobStore};
use cityscope_service::Config;
use crypto_core::JwtKeys;
use db_pool::create_pool as create_pg_pool;
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let registry = tracing_subscriber::registry().with(filter);

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
}

/// CityScope Service
///
/// Local-community feed backend: posts, reactions, replies, profiles and
/// image uploads over a JSON REST API.
#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting cityscope-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let (stores, db_pool) = match (config.store, config.database.clone()) {
        (StoreBackend::Postgres, Some(db_cfg)) => {
            db_cfg.log_config();
            let pool = match create_pg_pool(db_cfg).await {
                Ok(pool) => pool,
                Err(e) => {
                    tracing::error!("Database pool creation failed: {:#}", e);
                    eprintln!("ERROR: Failed to create database pool: {}", e);
                    std::process::exit(1);
                }
            };

            sqlx::migrate!("../migrations")
                .run(&pool)
                .await
                .map_err(|e| {
                    io::Error::new(io::ErrorKind::Other, format!("Migration failed: {e}"))
                })?;
            tracing::info!("Connected to PostgreSQL, migrations applied");

            (Stores::postgres(pool.clone()), Some(pool))
        }
        _ => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            (Stores::memory(Arc::new(MemoryStore::new())), None)
        }
    };

    let blobs: Arc<dyn BlobStore> = match config.storage.s3_bucket.clone() {
        Some(bucket) => {
            tracing::info!(bucket = %bucket, "Image uploads go to S3");
            Arc::new(S3BlobStore::from_config(&config.storage, bucket).await)
        }
        None => {
            tracing::warn!("S3_BUCKET not set; images are kept in process memory");
            Arc::new(MemoryBlobStore::new(
                config.storage.public_base_url.clone(),
                config.storage.key_prefix.clone(),
            ))
        }
    };

    let keys = JwtKeys::new(&config.auth.jwt_secret, config.auth.jwt_expire_hours).map_err(
        |e| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to initialize JWT keys: {e}"),
            )
        },
    )?;

    let state = web::Data::new(AppState::new(
        stores,
        blobs,
        keys,
        config.storage.max_image_bytes,
    ));
    let probe = web::Data::new(ReadinessProbe { db_pool });

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let cors_config = config.cors.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in cors_config.origins() {
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .app_data(probe.clone())
            .wrap(BearerAuth)
            .wrap(MetricsMiddleware)
            .wrap(security_headers())
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(routes::configure)
    })
    .bind(&bind_address)?
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, draining connections");
        handle.stop(true).await;
    });

    server.await?;
    tracing::info!("cityscope-service stopped");
    Ok(())
}
