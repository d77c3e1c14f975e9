use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use facesync_http::HttpFaceClient;
use facesyncd::events::{dispatch, SaveEvent};
use facesyncd::store::{LocalFileStore, MemoryRepository};
use facesyncd::{spawn_engine, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("facesyncd starting");

    let config = Config::load()?;
    let client = Arc::new(HttpFaceClient::new(
        &config.endpoint,
        &config.api_key,
        config.request_timeout(),
    )?);
    let repository = Arc::new(MemoryRepository::new());
    let files = Arc::new(LocalFileStore::new(&config.media_root));
    let engine = spawn_engine(&config, client, repository.clone(), files);

    tracing::info!(group = %config.group_id, "facesyncd ready; reading events from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: SaveEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed event line");
                continue;
            }
        };

        let reply = dispatch(event, &repository, &engine).await?;
        let mut encoded = serde_json::to_vec(&reply)?;
        encoded.push(b'\n');
        stdout.write_all(&encoded).await?;
        stdout.flush().await?;
    }

    tracing::info!("event feed closed; facesyncd shutting down");
    Ok(())
}
