use anyhow::{bail, Context, Result};
use console::{style, Emoji};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::scan::load_documents;
use crate::search::{create_embedder, ArtifactPaths, Embedder, EmbeddingClient, Indexer};

static INDEXING: Emoji<'_, '_> = Emoji("📊 ", "");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "");
static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "");
static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "! ");

pub async fn run_index(docs: &Path, config: &Config, force: bool, verbose: bool) -> Result<()> {
    let paths = ArtifactPaths::new(&config.index.dir);
    if paths.is_published() && !force {
        bail!(
            "An index is already published at {}. Pass --force to replace it.",
            paths.dir().display()
        );
    }

    let chunker = config.chunking.chunker()?;
    let corpus = load_documents(docs)
        .with_context(|| format!("failed to read documents from {}", docs.display()))?;
    let documents = corpus.documents;

    let embedder: Arc<dyn Embedder> = Arc::from(create_embedder(&config.embedder)?);

    if !documents.is_empty() {
        if verbose {
            println!("{}Checking embedding provider...", INFO);
        }
        embedder
            .health_check()
            .await
            .context("embedding provider is not usable")?;
    }

    let client = EmbeddingClient::new(
        embedder,
        config.embedder.batch_size,
        config.embedder.concurrency,
    );
    let indexer = Indexer::new(client, chunker);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!(
        "{}Indexing {} documents from {}...",
        INDEXING,
        documents.len(),
        docs.display()
    ));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = indexer.index_all(&documents, &paths).await;
    pb.finish_and_clear();
    let result = result.context("index build aborted, nothing was published")?;

    println!("\n{}Indexing complete!\n", SUCCESS);
    println!("  Documents:       {}", style(result.documents).green());
    println!("  Chunks indexed:  {}", style(result.chunks).cyan());
    if !corpus.skipped.is_empty() {
        println!(
            "  Skipped:         {} {}",
            style(corpus.skipped.len()).red(),
            style("(not valid UTF-8 text)").dim()
        );
        for name in &corpus.skipped {
            println!("    {}{}", WARNING, name);
        }
    }
    println!("  Dimensions:      {}", result.manifest.dimensions);
    println!("  Model:           {}", result.manifest.model);
    println!("  Output:          {}", style(paths.dir().display()).dim());

    Ok(())
}

pub async fn run_index_status(config: &Config) -> Result<()> {
    let paths = ArtifactPaths::new(&config.index.dir);

    if !paths.is_published() {
        println!("{}No index found at {}", INFO, paths.dir().display());
        println!("Run `temis-retriever index <docs>` to build the search index.");
        return Ok(());
    }

    let manifest = paths.read_manifest()?;
    let index_size = std::fs::metadata(paths.index()).map(|m| m.len()).unwrap_or(0);

    println!("\n{}Index Status: {}\n", INFO, paths.dir().display());
    println!("  Total chunks:    {}", style(manifest.count).cyan());
    println!("  Dimensions:      {}", manifest.dimensions);
    println!("  Model:           {}", style(&manifest.model).green());
    println!(
        "  Index size:      {} KB",
        style(index_size / 1024).yellow()
    );
    println!(
        "  Created:         {}",
        style(manifest.created_at.format("%Y-%m-%d %H:%M:%S")).dim()
    );

    Ok(())
}
