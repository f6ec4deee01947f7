//! school-rag - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use school_rag::{
    bootstrap,
    cli::{Args, Commands},
    config::Config,
    relay::{LoginHandshake, LoginOptions, UnipileClient},
    retrieval::Query,
    server::{self, AppState},
    telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    telemetry::init(args.verbosity(), args.json_logs)?;

    let config = Config::load(args.config.as_deref())?;

    match args.command {
        Commands::Serve { host, port } => run_server(config, host, port).await,
        Commands::Query { text, top_k } => run_query(config, text, top_k).await,
        Commands::WhatsappLogin {
            qr_output,
            poll_secs,
            timeout_secs,
        } => {
            let options = LoginOptions {
                poll_interval: Duration::from_secs(poll_secs),
                max_wait: Duration::from_secs(timeout_secs),
            };
            run_whatsapp_login(config, args.config, &qr_output, options).await
        }
        Commands::Config => {
            let rendered = toml::to_string_pretty(&config.redacted()).context("Failed to render config")?;
            println!("{}", rendered);
            Ok(())
        }
    }
}

async fn run_server(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    let retrieval = bootstrap::build_retrieval_service(&config).await?;
    let relay = bootstrap::build_relay(&config)?;

    let state = AppState::new(Arc::new(retrieval), relay);
    let router = server::build_router(state, config.server.cors_permissive);

    server::serve(router, &config.bind_address()).await
}

async fn run_query(config: Config, text: String, top_k: i64) -> Result<()> {
    let retrieval = bootstrap::build_retrieval_service(&config).await?;

    let results = retrieval.query_school(&Query::new(text, top_k)).await?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

async fn run_whatsapp_login(
    mut config: Config,
    config_path: Option<PathBuf>,
    qr_output: &Path,
    options: LoginOptions,
) -> Result<()> {
    let client = UnipileClient::from_config(&config.relay)?;
    let handshake = LoginHandshake::new(client, options);

    let checkpoint = handshake.start().await?;

    std::fs::write(qr_output, &checkpoint.qr_code)
        .with_context(|| format!("Failed to write QR payload to {}", qr_output.display()))?;
    println!("Account ID: {}", checkpoint.account_id);
    println!("QR payload saved to {}", qr_output.display());
    println!("Render it as a QR code and scan it from WhatsApp > Linked Devices:\n");
    println!("{}\n", checkpoint.qr_code);

    handshake.wait_until_connected(&checkpoint.account_id).await?;
    println!("WhatsApp connected successfully");

    let path = config_path
        .or_else(Config::default_path)
        .context("Could not determine config file location")?;
    config.relay.account_id = checkpoint.account_id;
    config.save(&path)?;
    println!("Saved relay.account_id to {}", path.display());

    Ok(())
}
