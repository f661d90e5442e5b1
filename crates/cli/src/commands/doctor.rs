//! `ragchat doctor` — Diagnose configuration and collaborators.

use std::time::Duration;

use ragchat_config::AppConfig;
use ragchat_core::persistence::QueryExecutor;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("ragchat Doctor — System Diagnostics");
    println!("===================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — using defaults (run `ragchat onboard`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. Fix the configuration and re-run.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key — set OPENAI_API_KEY or api_key in config.toml");
        issues += 1;
    }

    match ragchat_memory::vector_index_from_config(&config) {
        Ok(index) => match index.ping().await {
            Ok(true) => println!("  ✅ Vector index '{}' reachable", index.name()),
            Ok(false) => {
                println!("  ❌ Vector index '{}' not reachable", index.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Vector index '{}': {e}", index.name());
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Vector index misconfigured: {e}");
            issues += 1;
        }
    }

    match &config.database.url {
        Some(url) => match ragchat_memory::PostgresExecutor::connect(url, 1).await {
            Ok(executor) => {
                let executor = executor.with_timeout(Duration::from_secs(config.timeouts.query_secs));
                match executor.describe_schema().await {
                    Ok(schema) => println!(
                        "  ✅ Database reachable ({} tables)",
                        schema.lines().count()
                    ),
                    Err(e) => {
                        println!("  ❌ Database schema unreadable: {e}");
                        issues += 1;
                    }
                }
            }
            Err(e) => {
                println!("  ❌ Database unreachable: {e}");
                issues += 1;
            }
        },
        None => {
            println!("  ⚠️  No database — set DATABASE_URL; retrieval mode needs it");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
