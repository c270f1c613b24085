use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use solace_gateway::api::{ApiServerBuilder, ApiState};
use solace_gateway::{
    AlertSink, AnthropicClient, Config, ConversationStore, CrisisAlert, LogAlertSink,
    SmtpAlertSink, Turn, crisis,
};

/// Solace - Conversational relay with crisis detection
#[derive(Parser)]
#[command(name = "solace", version, about)]
struct Cli {
    /// Port to listen on (overrides SOLACE_PORT and the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Directory with the web UI, served for non-API paths
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Config file (defaults to ~/.config/solace/config.toml)
    #[arg(short, long, env = "SOLACE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Check a message against the crisis rules
    Scan {
        /// Text to check
        text: String,
    },
    /// Send a sample alert through the configured SMTP relay
    TestAlert,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Pick up .env before clap reads env-backed args
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info",
        1 => "info,solace=debug,solace_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Scanning needs no configuration
    if let Some(Command::Scan { text }) = &cli.command {
        scan(text);
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.static_dir.is_some() {
        config.server.static_dir = cli.static_dir;
    }
    tracing::debug!(?config, "loaded configuration");

    if matches!(cli.command, Some(Command::TestAlert)) {
        return test_alert(&config).await;
    }

    let Some(api_key) = config.llm.api_key.clone() else {
        anyhow::bail!("ANTHROPIC_API_KEY is required to serve chat");
    };

    let model = AnthropicClient::with_timeout(api_key, config.llm.timeout)?
        .with_model(config.llm.model.clone())
        .with_max_tokens(config.llm.max_tokens)
        .with_base_url(&config.llm.api_url);

    let alerts: Arc<dyn AlertSink> = match &config.alerts.smtp {
        Some(smtp) => Arc::new(SmtpAlertSink::new(smtp)?),
        None => Arc::new(LogAlertSink),
    };

    let store = Arc::new(
        ConversationStore::new(config.sessions.max_turns)
            .with_idle_ttl(config.sessions.idle_ttl),
    );

    let state = ApiState::new(store, Arc::new(model), alerts, config.persona)
        .with_alert_context_turns(config.alerts.context_turns);

    tracing::info!(
        port = config.server.port,
        max_turns = config.sessions.max_turns,
        "starting solace gateway"
    );

    ApiServerBuilder::new(state, config.server.port)
        .static_dir(config.server.static_dir)
        .build()
        .run()
        .await?;

    Ok(())
}

/// Print which crisis rules a message matches
fn scan(text: &str) {
    let matched = crisis::categories(text);
    if matched.is_empty() {
        println!("no crisis language detected");
        return;
    }

    println!("crisis language detected:");
    for category in matched {
        println!("  - {category}");
    }
}

/// Send a sample alert so operators can verify SMTP settings
async fn test_alert(config: &Config) -> anyhow::Result<()> {
    let Some(smtp) = &config.alerts.smtp else {
        anyhow::bail!("SMTP is not configured (set SMTP_USER, SMTP_PASS and SOLACE_ALERT_TO)");
    };

    let sink = SmtpAlertSink::new(smtp)?;
    let alert = CrisisAlert::new(
        config.persona.name.clone(),
        "[test] This is a test alert, no action is needed.",
        "[test] Sample reply.",
        vec![
            Turn::user("[test] Sample user message."),
            Turn::assistant("[test] Sample reply."),
        ],
    );

    println!("Sending test alert to {}...", smtp.recipients.join(", "));
    sink.dispatch(&alert).await?;
    println!("Test alert sent.");

    Ok(())
}
