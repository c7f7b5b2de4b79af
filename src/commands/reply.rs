//! `reply`: draft one reply, either for an inbox email or for text given on
//! the command line. Ctrl-C cancels the pending model call.

use std::path::PathBuf;

use tokio::signal;
use tracing::{info, warn};

use super::load_triaged;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::reply::{ReplyRequest, ReplyService};

/// Arguments of the `reply` command.
#[derive(Debug, Clone, Default)]
pub struct ReplyArgs {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub sentiment: String,
    pub priority: String,
    /// Position in the `triage` listing
    pub index: Option<usize>,
    pub inbox: Option<PathBuf>,
    pub all: bool,
    pub show_prompt: bool,
}

pub async fn run(config: &Config, args: ReplyArgs) -> Result<()> {
    let request = resolve_request(config, &args)?;
    let service = ReplyService::from_config(config).await;

    if args.show_prompt {
        println!("{}", service.render_prompt(&request).await);
        return Ok(());
    }

    let cancel = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    match service.try_generate_reply_until(&request, cancel).await {
        Ok(reply) => {
            info!(subject = %request.subject, "Reply drafted");
            println!("{reply}");
            Ok(())
        }
        Err(Error::Cancelled) => {
            warn!("Reply generation cancelled");
            Err(Error::Cancelled)
        }
        Err(err) => Err(err),
    }
}

fn resolve_request(config: &Config, args: &ReplyArgs) -> Result<ReplyRequest> {
    if let Some(index) = args.index {
        let emails = load_triaged(config, args.inbox.as_ref(), args.all)?;
        let email = emails.get(index).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "No email at index {} (inbox has {})",
                index,
                emails.len()
            ))
        })?;
        return Ok(email.reply_request());
    }

    match (&args.subject, &args.body) {
        (None, None) => Err(Error::InvalidArgument(
            "Pass --index or at least one of --subject/--body".to_string(),
        )),
        (subject, body) => Ok(ReplyRequest::new(
            subject.clone().unwrap_or_default(),
            body.clone().unwrap_or_default(),
            args.sentiment.clone(),
            args.priority.clone(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn request_from_command_line() {
        let args = ReplyArgs {
            body: Some("Where is my refund?".into()),
            sentiment: "Negative".into(),
            priority: "Normal".into(),
            ..Default::default()
        };
        let request = resolve_request(&Config::defaults(), &args).unwrap();
        assert_eq!(request.subject, "");
        assert_eq!(request.body, "Where is my refund?");
        assert_eq!(request.sentiment, "Negative");
    }

    #[test]
    fn request_requires_some_input() {
        let err = resolve_request(&Config::defaults(), &ReplyArgs::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn request_from_inbox_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emails.csv");
        fs::write(
            &path,
            "sender,subject,body,sent_date\n\
             a@x.io,Support,thanks,2024-01-01 00:00:00\n\
             b@x.io,Help,urgent: site is down,2024-01-01 00:00:00\n",
        )
        .unwrap();

        let args = ReplyArgs {
            index: Some(0),
            inbox: Some(path.clone()),
            ..Default::default()
        };
        let request = resolve_request(&Config::defaults(), &args).unwrap();
        assert_eq!(request.subject, "Help");
        assert_eq!(request.priority, "Urgent");

        let args = ReplyArgs {
            index: Some(5),
            inbox: Some(path),
            ..Default::default()
        };
        assert!(resolve_request(&Config::defaults(), &args).is_err());
    }
}
