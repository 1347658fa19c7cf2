use anyhow::Result;
use axum::Router;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use server::{build_app, ServerConfig};
use tokio::net::TcpListener;

#[derive(Parser)]
struct Args {
    /// Postings store location
    #[arg(long, default_value = "./data/index")]
    index: String,
    /// Norm store location, defaults to <index>_doc_len
    #[arg(long)]
    norms: Option<String>,
    /// JSON-lines corpus the index was built from
    #[arg(long, default_value = "./data/wapo.jl")]
    corpus: String,
    /// Results retrieved per query
    #[arg(short, default_value_t = 50)]
    k: usize,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let norms = args.norms.clone().unwrap_or_else(|| format!("{}_doc_len", args.index));
    let config = ServerConfig {
        index: PathBuf::from(&args.index),
        norms: PathBuf::from(norms),
        corpus: PathBuf::from(&args.corpus),
        k: args.k,
    };
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
