use std::path::Path;

use anyhow::Result;

use source_defender::ClientSettings;

/// Execute the `check` command: validate config and print the effective
/// settings. Makes no network calls.
pub fn execute(config_path: Option<&Path>) -> Result<()> {
    let (path, config) = super::load_config(config_path)?;
    let settings = ClientSettings::from_config(&config);
    let watch = config.watch.to_watch_config(false);

    println!("{:18} {}", "Config:", path.display());
    println!("{:18} {}", "Tenant:", config.credentials.tenant_id);
    println!("{:18} {}", "Client ID:", config.credentials.client_id);
    println!("{:18} {}", "Alerts URL:", settings.alerts_url());
    println!("{:18} {}", "Token URL:", settings.token_url);
    println!("{:18} {}", "Resource:", settings.resource);
    println!("{:18} {:?}", "HTTP timeout:", settings.timeout);
    println!("{:18} {:?}", "Ticker interval:", watch.ticker_interval);
    println!("{:18} {:?}", "Max interval:", watch.max_interval);
    println!("{:18} {:?}", "Max look-behind:", watch.max_look_behind);
    println!("{:18} {}", "Channel capacity:", watch.channel_capacity);
    println!("{:18} {}", "Filter field:", watch.filter_field);
    println!("\nConfiguration OK.");
    Ok(())
}
