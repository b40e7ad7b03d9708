//! Vision Gate server
//!
//! Configuration comes from the environment (see `vision_gate::config`), with
//! a `.env` file honoured if present. Flags override the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vision_gate::api::{build_router, AppState};
use vision_gate::{AccessGate, GateConfig, RotatingTokenVerifier, SystemClock};

#[derive(Parser, Debug)]
#[command(name = "vision_gate", version, about = "Access gate for the vision submission service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve(ServeArgs),
    /// Print the access token for the current window
    Token {
        /// Also print the time step the token belongs to
        #[arg(long)]
        show_step: bool,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Listen address, overrides GATE_BIND_ADDR
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// Vault root, overrides GATE_VAULT_DIR
    #[arg(long)]
    vault_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vision_gate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = GateConfig::from_env().context("failed to load gate configuration")?;

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => serve(config, args).await,
        Command::Token { show_step } => {
            let verifier = RotatingTokenVerifier::new(
                &config.shared_secret,
                config.window,
                Arc::new(SystemClock),
            )?;
            if show_step {
                println!("{} {}", verifier.time_step(), verifier.expected_token());
            } else {
                println!("{}", verifier.expected_token());
            }
            Ok(())
        }
    }
}

async fn serve(mut config: GateConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config = config.with_bind_addr(bind);
    }
    if let Some(dir) = args.vault_dir {
        config = config.with_vault_dir(dir);
    }

    let gate = AccessGate::from_config(&config)
        .await
        .context("failed to initialise access gate")?;
    let app = build_router(AppState::new(Arc::new(gate)));

    let addr = config.bind_addr;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!("Port {} is already in use", addr.port());
            }
            return Err(e).with_context(|| format!("failed to bind to {}", addr));
        }
    };

    tracing::info!("===========================================");
    tracing::info!("  {} online at http://{}", config.node_label, addr);
    tracing::info!("===========================================");
    tracing::info!("Vault:  {}", config.vault_dir.display());
    tracing::info!("Oracle: {} (timeout {:?})", config.oracle_url, config.oracle_timeout);
    tracing::info!("Window: {:?}", config.window);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
