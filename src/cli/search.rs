use anyhow::{Context, Result};
use console::{style, Emoji};
use std::sync::Arc;

use crate::config::Config;
use crate::search::{
    create_embedder, ArtifactPaths, Embedder, EmbeddingClient, IndexStore, Searcher,
};

static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "");
static FILE: Emoji<'_, '_> = Emoji("📄 ", "");

pub async fn run_search(config: &Config, query: &str, k: usize, json: bool) -> Result<()> {
    let paths = ArtifactPaths::new(&config.index.dir);

    if !paths.is_published() {
        anyhow::bail!(
            "No search index found at {}. Run `temis-retriever index <docs>` first.",
            paths.dir().display()
        );
    }

    let snapshot = paths
        .read()
        .with_context(|| format!("failed to load index from {}", paths.dir().display()))?;

    let embedder: Arc<dyn Embedder> = Arc::from(create_embedder(&config.embedder)?);
    let client = EmbeddingClient::new(embedder, 1, 1);
    let searcher = Searcher::new(Arc::new(IndexStore::ready(snapshot)), client)
        .with_max_k(config.server.max_k);

    let results = searcher.search(query, k).await?;

    if json {
        let output = serde_json::to_string_pretty(&results)?;
        println!("{}", output);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results found for: {}", style(query).italic());
        return Ok(());
    }

    println!(
        "\n{}Found {} results for: {}\n",
        SEARCH,
        style(results.len()).cyan(),
        style(query).yellow().bold()
    );

    for (i, result) in results.iter().enumerate() {
        let meta = &result.metadata;
        let location = match meta.page {
            Some(page) => format!("(page {}, chunk {})", page, meta.chunk_index),
            None => format!("(chunk {})", meta.chunk_index),
        };
        println!(
            "{} {}. {} {}",
            FILE,
            style(i + 1).dim(),
            style(&meta.doc).green(),
            style(location).dim()
        );
        println!("   Distance: {}", style(format!("{:.4}", result.score)).cyan());

        let preview: String = result.text.chars().take(200).collect();
        let preview = if result.text.chars().count() > 200 {
            format!("{}...", preview)
        } else {
            preview
        };
        println!("   {}", style(preview.replace('\n', " ")).dim());
        println!();
    }

    Ok(())
}
