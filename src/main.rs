use anyhow::Result;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use temis_retriever::cli::{
    run_index, run_index_status, run_search, run_search_server, Args, Command,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = if args.verbose {
        "temis_retriever=debug"
    } else {
        "temis_retriever=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = args.resolve_config()?;

    match args.command {
        Command::Index {
            docs,
            strategy,
            chunk_size,
            chunk_overlap,
            force,
        } => {
            if let Some(strategy) = strategy {
                config.chunking.strategy = strategy;
            }
            if let Some(size) = chunk_size {
                config.chunking.chunk_size = size;
            }
            if let Some(overlap) = chunk_overlap {
                config.chunking.chunk_overlap = overlap;
            }
            run_index(&docs, &config, force, args.verbose).await
        }
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            run_search_server(&config).await
        }
        Command::Search { query, k, json } => run_search(&config, &query, k, json).await,
        Command::Status => run_index_status(&config).await,
    }
}
