//! Provider router: selects the correct LLM provider based on config.
//!
//! Handles provider creation and resolves which backend serves completions
//! and which serves embeddings.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ragchat_config::AppConfig;
use ragchat_core::provider::Provider;

use crate::openai_compat::OpenAiCompatProvider;

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
    embedding_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    ///
    /// Embeddings go to the default provider until
    /// [`with_embedding_provider`](Self::with_embedding_provider) says otherwise.
    pub fn new(default_provider: impl Into<String>) -> Self {
        let default_provider = default_provider.into();
        Self {
            providers: HashMap::new(),
            embedding_provider: default_provider.clone(),
            default_provider,
        }
    }

    pub fn with_embedding_provider(mut self, name: impl Into<String>) -> Self {
        self.embedding_provider = name.into();
        self
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default (completion) provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get the provider that serves embeddings.
    pub fn embedding(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.embedding_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// List all registered provider names.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build providers from configuration.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let timeout = Duration::from_secs(config.timeouts.model_secs);
    let embedding_name = config
        .embedding
        .provider
        .clone()
        .unwrap_or_else(|| config.default_provider.clone());

    let mut router = ProviderRouter::new(&config.default_provider)
        .with_embedding_provider(embedding_name.clone());

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();

        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        let provider = OpenAiCompatProvider::new(name, &base_url, &api_key).with_timeout(timeout);
        router.register(name.clone(), Arc::new(provider));
    }

    // Ensure the default and embedding providers exist even if not explicitly configured
    for name in [config.default_provider.clone(), embedding_name] {
        if router.get(&name).is_none() {
            let api_key = config.api_key.clone().unwrap_or_default();
            let provider = OpenAiCompatProvider::new(&name, default_base_url(&name), &api_key)
                .with_timeout(timeout);
            router.register(name, Arc::new(provider));
        }
    }

    router
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "fireworks" => "https://api.fireworks.ai/inference/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
