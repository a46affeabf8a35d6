pub mod check;
pub mod fetch;
pub mod list;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use alerttail_engine::config::{parser, validator, AppConfig};

/// Locate, parse, and validate the config file.
fn load_config(explicit: Option<&Path>) -> Result<(PathBuf, AppConfig)> {
    let path = parser::locate_config(explicit, &parser::default_search_dirs())?;
    let config = parser::parse_config(&path)
        .with_context(|| format!("Failed to load config: {}", path.display()))?;
    validator::validate_config(&config)?;
    Ok((path, config))
}
