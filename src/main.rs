mod app;
mod artifacts;
mod auth;
mod config;
mod dialects;
mod error;
mod health;
mod pagination;
mod query;
mod schema;
mod state;
mod terms;
mod translations;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "dbrosetta_api=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    health::init_uptime_clock();

    let app_state = state::AppState::init().await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&app_state.db).await {
        tracing::warn!(error = %e, "migration failed; continuing with existing schema");
    }

    if app_state.config.wordpress_jwt_secret.is_none() {
        tracing::info!("WORDPRESS_JWT_SECRET not set; wordpress-login is disabled");
    }

    let app = app::build_app(app_state);
    app::serve(app).await
}
