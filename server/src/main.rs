use anyhow::Result;
use boolsearch_core::engine::SearchEngine;
use boolsearch_core::store::JsonlStore;
use clap::Parser;
use server::{build_app, AppConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Corpus file or directory of .json/.jsonl documents
    #[arg(long, env = "CORPUS_PATH", default_value = "./corpus")]
    corpus: String,
    /// Host to bind
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, env = "SERVER_PORT", default_value_t = 8080)]
    port: u16,
    /// Token required by POST /index/rebuild
    #[arg(long, env = "ADMIN_TOKEN")]
    admin_token: Option<String>,
    /// Comma-separated CORS origins
    #[arg(long, env = "CORS_ALLOW_ORIGIN")]
    cors_allow_origin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let store = Arc::new(JsonlStore::new(&args.corpus));
    let engine = Arc::new(SearchEngine::new(store));
    let builder = engine.clone();
    match tokio::task::spawn_blocking(move || builder.build_index()).await? {
        Ok(stats) => tracing::info!(
            docs = stats.docs_count,
            tokens = stats.total_tokens,
            elapsed_s = stats.elapsed_seconds,
            "initial index ready"
        ),
        Err(err) => tracing::error!(corpus = %args.corpus, error = %err, "initial index build failed, serving an empty index"),
    }

    let config = AppConfig { admin_token: args.admin_token, cors_allow_origin: args.cors_allow_origin };
    let app = build_app(engine, config);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
