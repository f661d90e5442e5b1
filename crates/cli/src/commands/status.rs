//! `ragchat status` — Show the effective configuration.

use ragchat_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("ragchat Status");
    println!("==============");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Provider:     {}", config.default_provider);
    println!("  Model:        {}", config.default_model);
    println!("  Temperature:  {}", config.default_temperature);
    println!("  Top p:        {}", config.default_top_p);
    println!("  Max tokens:   {}", config.default_max_tokens);
    println!("  Embeddings:   {} ({} dims)", config.embedding.model, config.embedding.dimension);
    println!("  Index:        {}", config.retrieval.backend);
    println!("  Default k:    {}", config.retrieval.default_top_k);
    println!("  Sessions:     {}", config.sessions.backend);
    if config.sessions.backend == "file" {
        println!("  Session dir:  {}", config.sessions_dir().display());
    }
    println!(
        "  Database:     {}",
        if config.database.url.is_some() { "configured" } else { "not configured" }
    );
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `ragchat onboard` first");
    }

    Ok(())
}
