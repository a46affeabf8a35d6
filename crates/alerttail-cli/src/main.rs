mod commands;
mod logging;
mod output;
mod shutdown;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

use crate::output::OutputTarget;

#[derive(Parser)]
#[command(
    name = "alerttail",
    version,
    about = "Tail Microsoft Defender for Endpoint alerts as JSON"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ./.alerttail.yaml, then $HOME/.alerttail.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Shortcut for --log-level debug
    #[arg(long, global = true)]
    debug: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll for new alerts until interrupted
    Watch {
        #[command(flatten)]
        output: OutputArgs,
        /// Persist the watermark here and resume from it on restart
        #[arg(long)]
        state: Option<PathBuf>,
    },
    /// Fetch alerts once, by filter or time range
    List {
        #[command(flatten)]
        output: OutputArgs,
        /// Raw OData filter expression
        #[arg(long, conflicts_with_all = ["since", "until"])]
        filter: Option<String>,
        /// Exclusive lower bound (RFC 3339)
        #[arg(long, required_unless_present = "filter")]
        since: Option<DateTime<Utc>>,
        /// Inclusive upper bound (RFC 3339, default: now)
        #[arg(long)]
        until: Option<DateTime<Utc>>,
    },
    /// Fetch alerts once, selected by the API's own parameters
    Fetch {
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        params: FetchArgs,
    },
    /// Validate configuration and print the effective settings
    Check,
}

#[derive(Args)]
struct FetchArgs {
    /// Lower time bound (RFC 3339)
    #[arg(short = 's', long, conflicts_with = "ago")]
    since_time_utc: Option<DateTime<Utc>>,
    /// Upper time bound (RFC 3339)
    #[arg(short = 'u', long, conflicts_with = "ago")]
    until_time_utc: Option<DateTime<Utc>>,
    /// ISO 8601 duration back from now, e.g. PT12H
    #[arg(short = 'a', long)]
    ago: Option<String>,
    /// Number of most recent alerts to retrieve
    #[arg(short = 'l', long)]
    limit: Option<u32>,
    /// Comma separated machine groups
    #[arg(short = 'm', long, value_delimiter = ',')]
    machine_groups: Vec<String>,
    /// A single machine tag from the registry
    #[arg(long)]
    device_created_machine_tags: Option<String>,
    /// Comma separated machine tags created in the security center
    #[arg(long, value_delimiter = ',')]
    cloud_created_machine_tags: Vec<String>,
}

impl From<FetchArgs> for source_defender::FetchParams {
    fn from(args: FetchArgs) -> Self {
        Self {
            since: args.since_time_utc,
            until: args.until_time_utc,
            ago: args.ago,
            limit: args.limit,
            machine_groups: args.machine_groups,
            device_created_machine_tags: args.device_created_machine_tags,
            cloud_created_machine_tags: args.cloud_created_machine_tags,
        }
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Where records go: stdout (default), file://PATH, tcp://HOST:PORT, udp://HOST:PORT
    #[arg(long, default_value = "")]
    output: OutputTarget,
    /// Pretty-print records
    #[arg(long)]
    indent: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level: &str = if cli.debug { "debug" } else { &cli.log_level };
    logging::init(level, cli.json, cli.log.as_deref())?;

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Watch { output, state } => {
            commands::watch::execute(config, &output.output, output.indent, state.as_deref()).await
        }
        Commands::List {
            output,
            filter,
            since,
            until,
        } => {
            let query = commands::list::Query::new(filter, since, until)?;
            commands::list::execute(config, &query, &output.output, output.indent).await
        }
        Commands::Fetch { output, params } => {
            let params = source_defender::FetchParams::from(params);
            commands::fetch::execute(config, &params, &output.output, output.indent).await
        }
        Commands::Check => commands::check::execute(config),
    }
}
