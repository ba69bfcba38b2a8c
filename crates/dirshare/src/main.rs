use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dirshare::config::default_config_path;
use dirshare::{Notice, ServingInfo, ServingSession, SessionOptions, Shell, TracingShell};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "dirshare")]
#[command(about = "Share a local directory over HTTP")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, env = "DIRSHARE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the configured port
    #[arg(short, long, env = "DIRSHARE_PORT", global = true)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long, env = "DIRSHARE_VERBOSE", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve a directory until interrupted (defaults to the most recent one)
    Serve {
        /// Directory or file to serve
        path: Option<PathBuf>,
    },
    /// List recently served directories
    Recent,
    /// Change the preferred port (prompts when no value is given)
    Port {
        /// New port number
        value: Option<String>,
    },
    /// Change the theme preference (system, light or dark)
    Theme {
        /// Theme mode
        mode: String,
    },
}

/// Terminal shell: logs notifications and reads port prompts from stdin.
struct ConsoleShell;

impl Shell for ConsoleShell {
    fn serving_started(&self, info: &ServingInfo) {
        TracingShell.serving_started(info);
        println!("Serving {}", info.path.display());
        println!("  local:  {}", info.local_url());
        if let Some(url) = info.remote_url() {
            println!("  remote: {url}");
        }
    }

    fn serving_stopped(&self) {
        TracingShell.serving_stopped();
    }

    fn error(&self, notice: &Notice) {
        TracingShell.error(notice);
    }

    fn info(&self, notice: &Notice) {
        TracingShell.info(notice);
    }

    fn prompt_for_port(&self, current: u16) -> Option<String> {
        print!("Port [{current}]: ");
        std::io::stdout().flush().ok()?;

        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line).ok()?;
        let line = line.trim();
        if read == 0 || line.is_empty() {
            None
        } else {
            Some(line.to_string())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "dirshare=debug,tower_http=debug"
    } else {
        "dirshare=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    info!("Using configuration at {}", config_path.display());

    let options = SessionOptions {
        port_override: cli.port,
        ..SessionOptions::default()
    };
    let mut session = ServingSession::open(config_path, Arc::new(ConsoleShell), options);

    match cli.command {
        Command::Serve { path } => {
            let root = match path {
                Some(path) => path,
                None => match session.config().recently_opened.most_recent() {
                    Some(recent) => PathBuf::from(recent),
                    None => bail!("No directory given and nothing served recently"),
                },
            };

            session
                .start(&root)
                .await
                .with_context(|| format!("serving {}", root.display()))?;

            tokio::signal::ctrl_c()
                .await
                .context("waiting for shutdown signal")?;
            info!("Shutdown signal received");
            session.stop().await;
        }
        Command::Recent => {
            for path in session.recent() {
                println!("{path}");
            }
        }
        Command::Port { value } => {
            match value {
                Some(value) => session.set_port(&value).await?,
                None => session.prompt_port_change().await?,
            };
        }
        Command::Theme { mode } => {
            let theme = session.set_theme(&mode)?;
            println!("Theme set to {theme}");
        }
    }

    Ok(())
}
