use std::sync::Arc;

use anyhow::Context;
use tracing::{Level, info};

use mahasiswa_server::config::AppConfig;
use mahasiswa_server::database::init_db;
use mahasiswa_server::repository::SeaOrmRepository;
use mahasiswa_server::state::AppState;
use mahasiswa_server::uploads::FilesystemUploadStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database.connection_url())
        .await
        .context("Failed to connect to database")?;

    let state = AppState {
        repo: Arc::new(SeaOrmRepository::new(db)),
        uploads: Arc::new(FilesystemUploadStore::new(
            config.upload.dir.clone(),
            config.upload.max_size,
        )),
        config: config.clone(),
    };

    let app = mahasiswa_server::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Backend running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
