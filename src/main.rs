//! toolrelay binary entry point.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use toolrelay::agent::{run_session, SessionEvent};
use toolrelay::cli::Cli;
use toolrelay::config::RelayConfig;
use toolrelay::error::RelayError;
use toolrelay::gateway::AnthropicGateway;
use toolrelay::mcp;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toolrelay=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse_args();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), RelayError> {
    let script = cli.provider_script()?;
    let config = RelayConfig::from_env()?;
    let gateway = AnthropicGateway::from_config(&config)?;

    let client = mcp::client_for_script(&script);
    let queries = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());

    run_session(client, &gateway, queries, |event| match event {
        SessionEvent::Connected { tools } => {
            println!("\nConnected to server with tools: {tools:?}");
            println!("\nMCP Client Started!");
            println!("Type your queries or 'quit' to exit.");
        }
        SessionEvent::AwaitingQuery => {
            print!("\nQuery: ");
            let _ = std::io::stdout().flush();
        }
        SessionEvent::Answer { answer, .. } => {
            println!("\n{answer}");
        }
    })
    .await
}
