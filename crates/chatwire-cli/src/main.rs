//! Chatwire terminal client.
//!
//! # Usage
//!
//! ```bash
//! # Join conversation 42 on the marketplace as user 7
//! chatwire --page-url https://market.example/listing/9 --conversation 42 --user-id 7
//!
//! # Local development server, verbose logs on stderr
//! chatwire -p http://localhost:8000/ -c 42 -u 7 --log-level debug
//! ```
//!
//! Type a line to send it. `/read <id>`, `/typing on|off`, `/reconnect` and
//! `/quit` are commands.

mod command;
mod render;

use chatwire_client::{Endpoint, LocalUser, ReconnectPolicy, TransportConfig, transport};
use chatwire_core::{backoff::DEFAULT_MAX_ATTEMPTS, endpoint::DEFAULT_PATH_PREFIX};
use clap::Parser;
use command::Command;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Chatwire terminal client
#[derive(Parser, Debug)]
#[command(name = "chatwire")]
#[command(about = "Line-oriented terminal client for a chatwire conversation")]
#[command(version)]
struct Args {
    /// URL of the page hosting the chat; its scheme and host select the socket
    #[arg(short, long)]
    page_url: String,

    /// Conversation to join
    #[arg(short, long)]
    conversation: u64,

    /// Local user id; messages from this id are not acknowledged
    #[arg(short, long)]
    user_id: u64,

    /// Display name
    #[arg(long, default_value = "me")]
    username: String,

    /// Socket path prefix
    #[arg(long, default_value = DEFAULT_PATH_PREFIX)]
    path_prefix: String,

    /// Automatic reconnects before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_reconnect_attempts: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // Chat lines own stdout
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let endpoint = Endpoint::from_page_url(&args.page_url, args.conversation)?
        .with_path_prefix(&args.path_prefix);
    tracing::info!(url = %endpoint.url(), "joining conversation");

    let me = LocalUser::new(args.user_id, args.username);
    let config = TransportConfig {
        reconnect: ReconnectPolicy {
            max_attempts: args.max_reconnect_attempts,
            ..ReconnectPolicy::default()
        },
        ..TransportConfig::default()
    };

    let mut chat = transport::spawn(config, me.clone(), endpoint);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = match command::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        write_line(&mut stdout, &format!("! {e}")).await?;
                        continue;
                    },
                };

                match command {
                    Command::Submit(content) => chat.submit_input(content).await?,
                    Command::Read(message_id) => chat.send_read_receipt(message_id).await?,
                    Command::Typing(is_typing) => chat.send_typing_indicator(is_typing).await?,
                    Command::Reconnect => {
                        if let Err(e) = chat.reconnect().await {
                            write_line(&mut stdout, &format!("! {e}")).await?;
                        }
                    },
                    Command::Quit => break,
                }
            },
            event = chat.next_event() => {
                let Some(event) = event else { break };
                write_line(&mut stdout, &render::line(&event, &me)).await?;
            },
        }
    }

    tracing::info!("leaving conversation");
    chat.shutdown().await?;
    Ok(())
}

async fn write_line(stdout: &mut Stdout, line: &str) -> std::io::Result<()> {
    stdout.write_all(line.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await
}
