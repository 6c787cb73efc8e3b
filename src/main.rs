use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use parley::{constants, EndpointConfig, HttpChatEndpoint};
use serde_json::Value;
use tracing::info;

mod chat;

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start an interactive chat session on the terminal.
    Chat {
        #[command(flatten)]
        endpoint: EndpointArgs,
        #[arg(long, help = "Write the transcript as HTML to this file on exit.")]
        export: Option<PathBuf>,
    },
    /// Send one message, print the reply and exit.
    Send {
        #[command(flatten)]
        endpoint: EndpointArgs,
        /// Message text.
        message: String,
    },
}

#[derive(clap::Args, Debug)]
struct EndpointArgs {
    #[arg(long, help = "Chat endpoint URL [default: $PARLEY_CHAT_URL or http://127.0.0.1:8000/chat].")]
    url: Option<String>,
    #[arg(long, help = "Bearer token sent with each request [default: $PARLEY_TOKEN].")]
    token: Option<String>,
    #[arg(long, help = "Request field carrying the message [default: $PARLEY_MESSAGE_FIELD or message].")]
    message_field: Option<String>,
    #[arg(long, value_parser = parse_extra, help = "Extra request field as key=value (repeatable).")]
    extra: Vec<(String, String)>,
    #[arg(long, default_value_t = constants::DEFAULT_TIMEOUT_SECS, help = "Request timeout in seconds.")]
    timeout_secs: u64,
}

impl EndpointArgs {
    // Flags override the PARLEY_* defaults read once in `constants`.
    fn into_config(self) -> EndpointConfig {
        let mut config = EndpointConfig::from_env();
        if let Some(url) = self.url {
            config.url = url;
        }
        config.token = self.token.filter(|t| !t.is_empty()).or(config.token);
        if let Some(field) = self.message_field {
            config.message_field = field;
        }
        for (key, value) in self.extra {
            config.extra_fields.insert(key, Value::String(value));
        }
        config.timeout = Duration::from_secs(self.timeout_secs);
        config
    }
}

fn parse_extra(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (endpoint URL, token)
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only the transcript.
    // Reads log level from RUST_LOG (e.g., RUST_LOG=info,parley=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { endpoint, export } => {
            let config = endpoint.into_config();
            info!(url = %config.url, "Starting interactive chat session...");
            let endpoint =
                HttpChatEndpoint::new(config).context("Failed to build HTTP client")?;
            chat::run_chat(endpoint, export.as_deref())
                .await
                .context("Chat session failed")?;
        }
        Commands::Send { endpoint, message } => {
            let config = endpoint.into_config();
            info!(url = %config.url, "Sending single message...");
            let endpoint =
                HttpChatEndpoint::new(config).context("Failed to build HTTP client")?;
            chat::send_once(endpoint, &message).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint_args(args: &[&str]) -> EndpointArgs {
        let mut argv = vec!["parley", "send"];
        argv.extend_from_slice(args);
        argv.push("hello");
        match Cli::parse_from(argv).command {
            Commands::Send { endpoint, .. } => endpoint,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = endpoint_args(&[
            "--url",
            "http://example.test/chat",
            "--token",
            "t0k",
            "--message-field",
            "question",
            "--extra",
            "llm_mode=ollama",
            "--timeout-secs",
            "7",
        ])
        .into_config();

        assert_eq!(config.url, "http://example.test/chat");
        assert_eq!(config.token.as_deref(), Some("t0k"));
        assert_eq!(config.message_field, "question");
        assert_eq!(config.extra_fields["llm_mode"], "ollama");
        assert_eq!(config.timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_missing_flags_fall_back_to_env_defaults() {
        let args = endpoint_args(&[]);
        assert!(args.url.is_none());
        assert!(args.token.is_none());
        assert!(args.message_field.is_none());

        let config = args.into_config();
        let defaults = EndpointConfig::from_env();
        assert_eq!(config.url, defaults.url);
        assert_eq!(config.token, defaults.token);
        assert_eq!(config.message_field, defaults.message_field);
    }

    #[test]
    fn test_parse_extra() {
        assert_eq!(
            parse_extra("llm_mode=ollama"),
            Ok(("llm_mode".to_string(), "ollama".to_string()))
        );
        assert_eq!(parse_extra("a=b=c"), Ok(("a".to_string(), "b=c".to_string())));
        assert!(parse_extra("novalue").is_err());
        assert!(parse_extra("=x").is_err());
    }
}
