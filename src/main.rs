use clap::{CommandFactory, Parser};

use staticd::cli::{self, Args};
use staticd::config::Config;
use staticd::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if cli::wants_usage(std::env::args_os()) {
        Args::command().print_help()?;
        return Ok(());
    }
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load(&args)?;

    server::listener::run(&cfg, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await
}
