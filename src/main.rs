//! Mail Assistant CLI - main entry point
//!
//! Inbox triage and knowledge-base grounded reply drafting.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use mail_assistant::commands::{self, DraftAllConfig, ReplyArgs};
use mail_assistant::{metrics, Config};
use tracing::warn;

#[derive(Parser)]
#[command(name = "mail_assistant")]
#[command(about = "Support inbox triage & reply drafting", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config.yml (defaults to ./config.yml, then ../config.yml)
    #[arg(long, env = "MAIL_ASSISTANT_CONFIG")]
    config: Option<PathBuf>,

    /// Address to expose Prometheus metrics (e.g., 0.0.0.0:9898)
    #[arg(long, env = "METRICS_ADDR")]
    metrics_addr: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List inbox emails with priority, sentiment and requirement tags
    Triage {
        /// Inbox CSV (defaults to inbox.path from config)
        #[arg(long = "input")]
        inbox: Option<PathBuf>,

        /// Include emails whose subject has no support keyword
        #[arg(long, default_value_t = false)]
        all: bool,

        /// Maximum number of emails to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format: table | json | yaml
        #[arg(long, default_value = "table")]
        format: String,

        /// Optional output file to save results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show inbox statistics
    Stats {
        #[arg(long = "input")]
        inbox: Option<PathBuf>,

        #[arg(long, default_value_t = false)]
        all: bool,

        /// Output format: table | json | yaml
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show the knowledge-base entries selected for a query
    Retrieve {
        /// Query text (usually an email body)
        query: String,

        /// Number of entries (defaults to knowledge_base.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Output format: table | json | yaml
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Draft a reply for one email
    Reply {
        #[arg(long)]
        subject: Option<String>,

        #[arg(long)]
        body: Option<String>,

        #[arg(long, default_value = "Neutral")]
        sentiment: String,

        #[arg(long, default_value = "Normal")]
        priority: String,

        /// Reply to the email at this position of the triage listing
        #[arg(long, conflicts_with_all = ["subject", "body"])]
        index: Option<usize>,

        #[arg(long = "input")]
        inbox: Option<PathBuf>,

        #[arg(long, default_value_t = false)]
        all: bool,

        /// Print the rendered prompt instead of calling the service
        #[arg(long, default_value_t = false)]
        show_prompt: bool,
    },

    /// Draft replies for every triaged email
    DraftAll {
        #[arg(long = "input")]
        inbox: Option<PathBuf>,

        #[arg(long, default_value_t = false)]
        all: bool,

        /// Replies generated in parallel
        #[arg(short, long, default_value = "4")]
        concurrency: usize,

        /// Maximum number of emails to draft for
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format: table | json | yaml
        #[arg(long, default_value = "json")]
        format: String,

        /// Write drafts to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Triage { .. } => "triage",
            Commands::Stats { .. } => "stats",
            Commands::Retrieve { .. } => "retrieve",
            Commands::Reply { .. } => "reply",
            Commands::DraftAll { .. } => "draft_all",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("mail_assistant=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr.as_deref() {
        match addr.parse::<SocketAddr>() {
            Ok(socket) => metrics::spawn_metrics_server(socket),
            Err(err) => warn!(%addr, "Invalid metrics address: {}", err),
        }
    }

    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from_file(path)?,
        None => Config::new(),
    };

    let command_name = cli.command.name();
    metrics::record_command_start(command_name);
    let start = Instant::now();

    let result = execute_command(&config, cli.command).await;

    metrics::record_command_result(command_name, start.elapsed(), result.is_ok());

    result
}

async fn execute_command(config: &Config, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Triage {
            inbox,
            all,
            limit,
            format,
            output,
        } => {
            commands::triage::run(config, inbox, all, limit, &format, output)?;
        }
        Commands::Stats { inbox, all, format } => {
            commands::stats::run(config, inbox, all, &format)?;
        }
        Commands::Retrieve {
            query,
            top_k,
            format,
        } => {
            commands::retrieve::run(config, &query, top_k, &format).await?;
        }
        Commands::Reply {
            subject,
            body,
            sentiment,
            priority,
            index,
            inbox,
            all,
            show_prompt,
        } => {
            let args = ReplyArgs {
                subject,
                body,
                sentiment,
                priority,
                index,
                inbox,
                all,
                show_prompt,
            };
            commands::reply::run(config, args).await?;
        }
        Commands::DraftAll {
            inbox,
            all,
            concurrency,
            limit,
            format,
            output,
        } => {
            let options = DraftAllConfig {
                inbox,
                all,
                concurrency,
                limit,
                format,
                output,
            };
            commands::draft_all::run(config, options).await?;
        }
    }

    Ok(())
}
