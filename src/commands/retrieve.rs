//! `retrieve`: show which knowledge-base entries a query selects.

use crate::config::Config;
use crate::error::Result;
use crate::reply::ReplyService;

use super::{render_structured, OutputFormat};

pub async fn run(config: &Config, query: &str, top_k: Option<usize>, format: &str) -> Result<()> {
    let fmt = OutputFormat::parse(format)?;
    let service = ReplyService::from_config(config).await;
    let top_k = top_k.unwrap_or_else(|| service.top_k());

    let entries = service.retrieve(query, top_k).await;

    match fmt {
        OutputFormat::Table => {
            println!("{}\n", header(&service, top_k));
            if entries.is_empty() {
                println!("No matching entries.");
            }
            for entry in &entries {
                println!("[{}] score={:.4}  {}", entry.index, entry.score, entry.text);
            }
        }
        _ => println!("{}", render_structured(fmt, &entries)?),
    }

    Ok(())
}

fn header(service: &ReplyService, top_k: usize) -> String {
    let retriever = service.retriever();
    let credential = if service.client().is_configured() {
        "set"
    } else {
        "missing"
    };
    format!(
        "Mode: {} | embedder: {} | entries: {} | top_k: {} | model: {} (credential {})",
        retriever.mode().as_str(),
        retriever.embedder_name().unwrap_or("none"),
        retriever.knowledge().len(),
        top_k,
        service.client().model(),
        credential
    )
}
