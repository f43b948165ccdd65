use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;

use crusia_server::{run, telemetry, ServerConfig};

#[derive(Parser)]
#[command(name = "crusia-server", version, about = "Crusia save-sync server")]
struct ServerArgs {
    /// Config file path
    #[arg(long, env = "CRUSIA_CONFIG", default_value = "config.yaml")]
    config: PathBuf,
    /// Override the configured bind address
    #[arg(long, env = "CRUSIA_BIND")]
    bind: Option<String>,
    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = real_main().await {
        eprintln!("crusia-server exited with error: {err:#}");
        process::exit(1);
    }
}

async fn real_main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    telemetry::init(args.json_logs)?;

    let mut config = ServerConfig::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    if let Some(bind) = &args.bind {
        config = config.with_addr(bind);
    }

    run(config).await
}
