/**
 * MIXNET CONSOLE - Entry point of the operator console
 *
 * ROLE: wires config, logging, the admin API client and the terminal view,
 * then runs the requested subcommand (watch by default).
 */

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mixnet_console::config::load_config;
use mixnet_console::{Console, ConsoleClient, ConsoleConfig, SubmitOutcome, TerminalView};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mixnet-console", about = "Admin console for a mix-network node service")]
struct Args {
    /// Admin service root URL (overrides the config file)
    #[arg(long)]
    url: Option<String>,

    /// Adapter id used in endpoint paths
    #[arg(long)]
    admin: Option<String>,

    /// Poll interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Locale tag for labels, ex: en_US
    #[arg(long)]
    locale: Option<String>,

    /// Directory of extra <locale>.yaml bundles
    #[arg(long)]
    lang_dir: Option<PathBuf>,

    /// Drop detail responses older than the newest one applied
    #[arg(long)]
    discard_stale: bool,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Poll node connection state and render node tabs
    Watch,
    /// List configured nodes
    Nodes,
    /// Show details and statistics of one node
    Detail { node: String },
    /// List available commands
    Commands,
    /// Invoke a command; values fill parameters in order
    Invoke { id: String, values: Vec<String> },
}

impl Args {
    fn apply(&self, cfg: &mut ConsoleConfig) {
        if let Some(url) = &self.url {
            cfg.base_url = url.clone();
        }
        if let Some(admin) = &self.admin {
            cfg.admin = admin.clone();
        }
        if let Some(ms) = self.interval_ms {
            cfg.poll_interval_ms = ms;
        }
        if let Some(locale) = &self.locale {
            cfg.locale = Some(locale.clone());
        }
        if let Some(dir) = &self.lang_dir {
            cfg.lang_dir = Some(dir.clone());
        }
        if self.discard_stale {
            cfg.discard_stale_responses = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mixnet_console=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut cfg = load_config().await;
    args.apply(&mut cfg);

    let client = ConsoleClient::from_config(&cfg).context("Failed to build HTTP client")?;
    info!("admin service at {}", client.base_url());
    let mut console = Console::new(cfg, client, TerminalView::stdout());

    match args.command.unwrap_or(Cmd::Watch) {
        Cmd::Watch => {
            console
                .run(async {
                    tokio::signal::ctrl_c().await.ok();
                })
                .await
                .context("Console loop failed")?;
        }
        Cmd::Nodes => {
            console.fetch_configured_nodes().await.context("Failed to fetch node list")?;
        }
        Cmd::Detail { node } => {
            console.show_node_detail(&node).await.context("Failed to fetch node details")?;
        }
        Cmd::Commands => {
            console.fetch_commands().await.context("Failed to fetch commands")?;
        }
        Cmd::Invoke { id, values } => {
            console.fetch_commands().await.context("Failed to fetch commands")?;
            console.state_mut().form_mut(&id)?.fill(&values)?;
            match console.submit_command(&id).await.context("Failed to invoke command")? {
                SubmitOutcome::Succeeded(_) => {}
                SubmitOutcome::Failed(msg) => bail!("command {id} failed: {msg}"),
            }
        }
    }

    Ok(())
}
