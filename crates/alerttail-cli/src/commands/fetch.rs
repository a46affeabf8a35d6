use std::path::Path;

use anyhow::{Context, Result};

use alerttail_engine::AlertEncoder;
use source_defender::{ClientSettings, DefenderClient, FetchParams};

use crate::output::OutputTarget;

/// Execute the `fetch` command: one request using the API's selection
/// parameters instead of a filter expression.
pub async fn execute(
    config_path: Option<&Path>,
    params: &FetchParams,
    output: &OutputTarget,
    indent: bool,
) -> Result<()> {
    let query = params.to_query().context("Invalid fetch parameters")?;
    let (_, config) = super::load_config(config_path)?;

    let client = DefenderClient::new(&ClientSettings::from_config(&config))
        .context("Failed to build alerts API client")?;
    let alerts = client
        .fetch_alerts(&query)
        .await
        .context("Failed to fetch alerts")?;

    let mut encoder = AlertEncoder::new(output.open().await?, indent);
    for alert in &alerts {
        encoder.write(alert).await?;
    }
    encoder.finish().await?;

    tracing::info!(count = alerts.len(), "Alerts fetched");
    Ok(())
}
