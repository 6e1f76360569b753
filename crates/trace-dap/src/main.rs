use std::net::TcpListener;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use trace_dap::{serve, AdapterConfig, ReplayProvider};

#[derive(Debug, Parser)]
#[command(
    name = "trace-dap",
    version,
    about = "Debug Adapter Protocol server over a recorded execution trace",
    after_help = "Examples:\n  trace-dap --trace demos/factorial.trace.json\n  trace-dap --trace run.json --port 4711 --protocol-log dap.log"
)]
struct Cli {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Port to listen on (0 picks a free port).
    #[arg(long, default_value_t = 0)]
    port: u16,
    /// Execution trace to replay.
    #[arg(long)]
    trace: PathBuf,
    /// Append the wire transcript to this file.
    #[arg(long)]
    protocol_log: Option<PathBuf>,
    /// Transport poll interval while the debuggee runs, in milliseconds (0 disables).
    #[arg(long, default_value_t = 50)]
    poll_interval_ms: u64,
    /// Truncate displayed values longer than this many characters.
    #[arg(long, default_value_t = 1000)]
    max_value_len: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Starting trace-dap adapter");

    let mut provider = ReplayProvider::from_path(&cli.trace)
        .with_context(|| format!("failed to load trace {}", cli.trace.display()))?;

    let config = AdapterConfig {
        running_poll_interval: (cli.poll_interval_ms > 0)
            .then(|| Duration::from_millis(cli.poll_interval_ms)),
        max_value_len: cli.max_value_len,
        protocol_log: cli.protocol_log,
        ..AdapterConfig::default()
    }
    .with_env_overrides();

    let listener = TcpListener::bind((cli.host.as_str(), cli.port))
        .with_context(|| format!("failed to bind {}:{}", cli.host, cli.port))?;
    let addr = listener
        .local_addr()
        .context("failed to read listener address")?;

    // Launchers read the chosen port from this line.
    println!(
        "{}",
        serde_json::json!({ "host": addr.ip().to_string(), "port": addr.port() })
    );

    serve(&listener, &mut provider, config).context("debug session failed")?;
    Ok(())
}
