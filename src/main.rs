use std::sync::Arc;

use certo::config::Config;
use certo::state::AppState;
use certo::storage::drive::DriveClient;
use certo::storage::FileTokenStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certo=info,tower_http=info".into()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let uploader = config.token_cache.clone().map(|path| {
        Arc::new(DriveClient::new(
            config.drive_folder.clone(),
            Arc::new(FileTokenStore::new(path)),
        ))
    });
    if uploader.is_none() {
        tracing::warn!("DRIVE_TOKEN_CACHE not set; Drive copies are disabled");
    }

    let state = Arc::new(AppState {
        config: config.clone(),
        uploader,
    });

    let app = certo::app(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Certo listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
