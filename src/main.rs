use std::sync::Arc;

use actix_web::middleware::{NormalizePath, from_fn};
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;

use hrm_attendance::auth::jwt::TokenService;
use hrm_attendance::auth::middleware::{Guard, guard_middleware};
use hrm_attendance::auth::password::PasswordHasher;
use hrm_attendance::auth::service::AuthService;
use hrm_attendance::config::Config;
use hrm_attendance::db::{init_db, run_migrations};
use hrm_attendance::docs::ApiDoc;
use hrm_attendance::ledger::AttendanceLedger;
use hrm_attendance::routes;
use hrm_attendance::store::attendance::MySqlAttendanceStore;
use hrm_attendance::store::user::MySqlCredentialStore;
use hrm_attendance::utils::clock::{Clock, SystemClock};
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/health")]
async fn health() -> impl Responder {
    "ok"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let gateway = init_db(&config.database_url, &config.pool).await?;
    if config.run_migrations {
        run_migrations(&gateway).await?;
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let tokens = Data::new(TokenService::new(
        &config.jwt_secret,
        config.token_ttl,
        clock.clone(),
    ));
    let hasher = PasswordHasher::new(&config.password)?;
    let auth = Data::new(AuthService::new(
        Arc::new(MySqlCredentialStore::new(gateway.clone())),
        hasher,
        tokens.clone(),
    ));
    let ledger = Data::new(AttendanceLedger::new(
        Arc::new(MySqlAttendanceStore::new(gateway.clone())),
        clock,
        config.work_zone,
    ));
    let guard = Data::new(Guard::new(
        tokens.clone(),
        &config.api_prefix,
        config.guard.clone(),
    ));

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config.clone());

    HttpServer::new(move || {
        App::new()
            .wrap(from_fn(guard_middleware))
            .wrap(NormalizePath::trim())
            .wrap(actix_web::middleware::Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(tokens.clone())
            .app_data(auth.clone())
            .app_data(ledger.clone())
            .app_data(guard.clone())
            .app_data(config_data.clone())
            .service(health)
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await
    .context("Server error")?;

    gateway.close().await;
    info!("Server stopped");
    Ok(())
}
