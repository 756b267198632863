use pomelox_env::{routes::build_router, ApiClient, EnvironmentResolver, FileStore, Settings};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(Settings::from_env()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::new(&settings.state_dir);
    tracing::debug!(path = %store.path().display(), "environment state file");

    let resolver = EnvironmentResolver::load(store, &settings)?;
    let client = ApiClient::new(resolver, &settings)?;
    let app = build_router(client);

    let listener = tokio::net::TcpListener::bind(settings.listen_addr).await?;
    tracing::info!("dev switcher listening on http://{}", settings.listen_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
