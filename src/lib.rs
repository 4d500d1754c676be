pub mod application;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod openapi;
mod runtime;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub use db::{create_pool, DbPool};
pub use handlers::AppState;

use errors::AppError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
    let mut conn = pool
        .get()
        .map_err(|e| AppError::Internal(format!("no connection for migrations: {e}")))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| AppError::Internal(format!("migrations failed: {e}")))?;
    Ok(())
}

/// Malformed JSON bodies get the same `{ error, code }` shape as every other failure.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

/// Registers every route on an app or scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .route("/checkout", web::post().to(handlers::checkout::checkout))
        .service(
            web::scope("/orders")
                .route("", web::get().to(handlers::orders::list_own_orders))
                .route("/cancel", web::post().to(handlers::orders::cancel_order))
                .route("/{id}", web::get().to(handlers::orders::get_order)),
        )
        .service(
            web::scope("/admin/orders")
                .route("", web::get().to(handlers::admin::list_orders))
                .route("/status", web::post().to(handlers::admin::update_status)),
        )
        .service(
            web::scope("/payments")
                .route("/wallet/ipn", web::post().to(handlers::payments::wallet_ipn))
                .route(
                    "/hosted/webhook",
                    web::post().to(handlers::payments::hosted_webhook),
                ),
        );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: web::Data<AppState>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure)
            .service(openapi::swagger_ui())
    })
    .bind((host.to_string(), port))?
    .run())
}
