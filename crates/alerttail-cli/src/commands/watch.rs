use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use alerttail_engine::Watcher;
use alerttail_state::FileStateIo;
use source_defender::{ClientSettings, DefenderClient};

use crate::output::OutputTarget;
use crate::shutdown;

/// Execute the `watch` command: stream new alerts until a shutdown signal.
pub async fn execute(
    config_path: Option<&Path>,
    output: &OutputTarget,
    indent: bool,
    state: Option<&Path>,
) -> Result<()> {
    // 1. Load and validate config
    let (path, config) = super::load_config(config_path)?;
    tracing::debug!(config = %path.display(), "Config loaded");

    // 2. Build the alert source and sink
    let settings = ClientSettings::from_config(&config);
    let client = DefenderClient::new(&settings).context("Failed to build alerts API client")?;
    let writer = output.open().await?;

    // 3. Run until interrupted
    let mut watcher = Watcher::new(config.watch.to_watch_config(indent), Arc::new(client));
    if let Some(state_path) = state {
        watcher = watcher.with_state(Arc::new(FileStateIo::new(state_path)));
    }
    let shutdown = shutdown::create_shutdown_token()?;
    let summary = watcher.run(writer, shutdown).await?;

    tracing::info!(
        alerts_written = summary.alerts_written,
        watermark = ?summary.final_watermark,
        output = %output,
        "Watch finished"
    );
    Ok(())
}
