use signup::{app, config::AppConfig, state::AppState, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("signup=debug,axum=info,tower_http=info");

    let config = AppConfig::from_env()?;
    tracing::info!(
        host = %config.db.host,
        user = %config.db.user,
        database = %config.db.name,
        "connecting to database"
    );

    let app_state = AppState::init(config).await?;
    let config = app_state.config.clone();

    let app = app::build_app(app_state);
    app::serve(app, &config).await
}
