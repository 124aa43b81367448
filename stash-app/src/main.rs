use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use stash_app::settings::Settings;
use stash_app::state::{text_store, AppState};
use stash_app::{server, sweeper};
use stash_files::{DiskStorage, FileSharing};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load();

    let backend = Arc::new(
        DiskStorage::new(settings.upload_dir.clone())
            .await
            .context("failed to prepare upload directory")?,
    );
    let files = Arc::new(FileSharing::new(backend));
    let texts = Arc::new(text_store());

    sweeper::spawn(
        Arc::clone(&files),
        Arc::clone(&texts),
        Duration::from_secs(settings.sweep_interval_secs),
    );

    let app = server::router(AppState::new(files, texts));
    let listener = tokio::net::TcpListener::bind(&settings.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.listen_addr))?;
    tracing::info!(addr = %settings.listen_addr, "stash listening");

    axum::serve(listener, app).await.context("server exited")?;
    Ok(())
}
