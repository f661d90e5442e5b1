//! `ragchat ingest` — Embed knowledge files into the vector index.

use std::path::PathBuf;

use ragchat_config::AppConfig;
use ragchat_core::retrieval::Category;
use ragchat_memory::Ingestor;

pub async fn run(
    instruction: Option<PathBuf>,
    domain: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let instruction = instruction.or_else(|| config.retrieval.instruction_file.as_ref().map(PathBuf::from));
    let domain = domain.or_else(|| config.retrieval.domain_file.as_ref().map(PathBuf::from));
    if instruction.is_none() && domain.is_none() {
        return Err("Nothing to ingest: pass --instruction and/or --domain".into());
    }

    if config.retrieval.backend == "in_memory" {
        println!("⚠️  retrieval.backend is in_memory; indexed passages last only for this run.");
        println!("   The gateway seeds its own in-memory index from retrieval.instruction_file");
        println!("   and retrieval.domain_file at startup.\n");
    }

    let providers = ragchat_providers::build_from_config(&config);
    let embedder = providers
        .embedding()
        .ok_or("No embedding provider configured")?;
    let index = ragchat_memory::vector_index_from_config(&config)?;

    let ingestor = Ingestor::new(
        embedder,
        index.clone(),
        &config.embedding.model,
        config.embedding.dimension,
    );

    for (path, category) in [
        (instruction, Category::Instruction),
        (domain, Category::DomainKnowledge),
    ] {
        let Some(path) = path else { continue };
        let report = ingestor.ingest_file(&path, category).await?;
        println!(
            "  {:<16} {}: {} indexed, {} skipped",
            category.as_tag(),
            path.display(),
            report.indexed,
            report.skipped
        );
    }

    match index.count().await {
        Ok(count) => println!("\n  Index '{}' now holds {count} passages", index.name()),
        Err(e) => println!("\n  ⚠️  Could not count passages: {e}"),
    }

    Ok(())
}
