//! Draft a single reply. The body can be piped on stdin.
//!
//! Always prints something: the reply, or the failure text.

use std::io::Read;

use anyhow::Result;
use clap::Parser;
use mail_assistant::{Config, ReplyService};

#[derive(Parser)]
#[command(name = "draft_reply")]
#[command(about = "Draft a knowledge-base grounded reply for one email")]
struct Cli {
    /// Email subject
    #[arg(short, long, default_value = "")]
    subject: String,

    /// Email body; `-` or omitted reads stdin
    #[arg(short, long)]
    body: Option<String>,

    #[arg(long, default_value = "Neutral")]
    sentiment: String,

    #[arg(long, default_value = "Normal")]
    priority: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mail_assistant=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let body = match cli.body.as_deref() {
        Some(body) if body != "-" => body.to_string(),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let config = Config::new();
    let service = ReplyService::from_config(&config).await;

    let reply = service
        .generate_reply(&cli.subject, body.trim(), &cli.sentiment, &cli.priority)
        .await;
    println!("{reply}");

    Ok(())
}
