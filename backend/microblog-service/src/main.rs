use actix_cors::Cors;
use actix_middleware::MetricsMiddleware;
use actix_web::{http::header, App, HttpServer};
use anyhow::Context;
use db_pool::{create_pool, DbConfig};
use microblog_service::media::S3MediaStore;
use microblog_service::state::CookieSettings;
use microblog_service::{routes, AppState, Config};
use s3_utils::{S3Client, S3Config};
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn build_cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "DELETE"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .supports_credentials()
        .max_age(3600);

    if origins.iter().any(|o| o == "*") {
        return cors.allow_any_origin();
    }

    origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}

/// Microblog service
///
/// Serves the `/api` REST surface for users, posts, likes, comments, follows
/// and notifications on top of PostgreSQL, with images stored in S3.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env().context("failed to load configuration")?;
    tracing::info!(
        env = %config.app.env,
        "Starting microblog-service v{}",
        env!("CARGO_PKG_VERSION")
    );

    crypto_core::jwt::initialize_jwt_secret(&config.auth.jwt_secret)
        .context("failed to initialize session signing key")?;

    let db_config = DbConfig::from_env("microblog-service").map_err(anyhow::Error::msg)?;
    db_config.log_config();
    let pool = create_pool(db_config)
        .await
        .context("failed to create database pool")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let s3 = S3Client::with_config(S3Config::from_env()).await;
    if let Err(e) = s3.health_check().await {
        tracing::warn!(error = %e, bucket = %s3.config().bucket, "media bucket not reachable");
    }
    let media = Arc::new(S3MediaStore::new(s3.operations(), config.media.max_bytes));

    let state = AppState::postgres(
        pool,
        media,
        CookieSettings {
            secure: config.secure_cookies(),
        },
    );

    let origins = config.cors_origins();
    let bind_address = (config.app.host.clone(), config.app.port);
    tracing::info!("Starting HTTP server at {}:{}", bind_address.0, bind_address.1);

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&origins))
            .wrap(MetricsMiddleware)
            .wrap(TracingLogger::default())
            .configure(|cfg| routes::configure(cfg, &state))
    })
    .bind(bind_address)?
    .run()
    .await?;

    tracing::info!("microblog-service stopped");
    Ok(())
}
