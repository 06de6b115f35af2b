use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

use wikiseek_server::build_app;

#[derive(Parser)]
#[command(name = "wikiseek-server")]
#[command(about = "Serve ranked search over an ingested wiki store", long_about = None)]
struct Args {
    /// Directory holding the page store and index
    #[arg(long = "save_path")]
    save_path: PathBuf,
    /// Stream an AI answer for each search via a local Ollama daemon
    #[arg(long, default_value_t = false)]
    ollama: bool,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 3030)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let app = build_app(args.save_path, args.ollama);
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
