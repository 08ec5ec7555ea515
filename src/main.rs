use alumni_portal::{auth::services::seed_admin, build_app, logging, serve, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let config = AppConfig::from_env()?;
    let (host, port) = (config.host.clone(), config.port);
    let admin = config.admin.clone();

    let app_state = AppState::init(config).await?;

    match admin {
        Some(seed) => {
            seed_admin(&app_state, &seed).await?;
        }
        None => tracing::warn!("ADMIN_PASSWORD not set; administrator account not seeded"),
    }

    serve(build_app(app_state), &host, port).await
}
