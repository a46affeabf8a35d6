use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};

use alerttail_engine::AlertEncoder;
use alerttail_types::QueryWindow;
use source_defender::{ClientSettings, DefenderClient};

use crate::output::OutputTarget;

/// What a one-shot listing asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// A raw filter expression, passed through unchanged.
    Filter(String),
    /// The half-open range `(since, until]`; `until` defaults to now.
    Range {
        since: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    },
}

impl Query {
    /// Build from command-line flags.
    ///
    /// # Errors
    ///
    /// Returns an error if neither a filter nor `since` is given, the filter
    /// is blank, or `since` is not before `until`.
    pub fn new(
        filter: Option<String>,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        match (filter, since) {
            (Some(filter), _) if filter.trim().is_empty() => bail!("--filter must not be empty"),
            (Some(filter), _) => Ok(Self::Filter(filter)),
            (None, Some(since)) => {
                if let Some(until) = until {
                    if since >= until {
                        bail!("--since ({since}) must be before --until ({until})");
                    }
                }
                Ok(Self::Range { since, until })
            }
            (None, None) => bail!("either --filter or --since is required"),
        }
    }

    /// Render the filter expression over `field`, resolving an open upper
    /// bound against `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if an open range starts at or after `now`.
    pub fn to_filter(&self, field: &str, now: DateTime<Utc>) -> Result<String> {
        match self {
            Self::Filter(filter) => Ok(filter.clone()),
            Self::Range { since, until } => {
                let until = until.unwrap_or(now);
                if *since >= until {
                    bail!("--since ({since}) must be in the past");
                }
                Ok(QueryWindow::new(*since, until).filter(field))
            }
        }
    }
}

/// Execute the `list` command: fetch matching alerts once and write them.
pub async fn execute(
    config_path: Option<&Path>,
    query: &Query,
    output: &OutputTarget,
    indent: bool,
) -> Result<()> {
    let (_, config) = super::load_config(config_path)?;
    let filter = query.to_filter(&config.watch.filter_field, Utc::now())?;

    let client = DefenderClient::new(&ClientSettings::from_config(&config))
        .context("Failed to build alerts API client")?;
    let alerts = client
        .list_alerts(&filter)
        .await
        .with_context(|| format!("Failed to list alerts for filter: {filter}"))?;

    let mut encoder = AlertEncoder::new(output.open().await?, indent);
    for alert in &alerts {
        encoder.write(alert).await?;
    }
    encoder.finish().await?;

    tracing::info!(count = alerts.len(), filter = %filter, "Alerts listed");
    Ok(())
}
