//! `ainbondhu check` — Validate config, the LLM endpoint, and the
//! knowledge corpus.

use std::time::Duration;

use ainbondhu_config::AppConfig;
use ainbondhu_core::Provider;
use ainbondhu_knowledge::KnowledgeIndex;
use ainbondhu_providers::OpenAiCompatProvider;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("Ain Bondhu — configuration and corpus check");
    println!("===========================================\n");

    let mut issues = 0;

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ok  Config valid");
            config
        }
        Err(e) => {
            println!("  !!  Config invalid: {e}");
            return Err(e.into());
        }
    };

    match &config.api_key {
        Some(api_key) => {
            println!("  ok  API key configured");

            let provider = OpenAiCompatProvider::new(
                "openai",
                config.provider.base_url.clone(),
                api_key.clone(),
                Duration::from_secs(config.provider.request_timeout_secs),
            );
            if provider_reachable(&provider).await {
                println!("  ok  LLM endpoint reachable at {}", config.provider.base_url);
            } else {
                println!("  !!  LLM endpoint unreachable at {}", config.provider.base_url);
                issues += 1;
            }
        }
        None => {
            println!("  !!  No API key. Set AINBONDHU_API_KEY or OPENAI_API_KEY.");
            issues += 1;
        }
    }

    match KnowledgeIndex::load(&config.knowledge.data_dir) {
        Ok(index) => {
            println!("  ok  Knowledge corpus loaded from {}", config.knowledge.data_dir.display());
            println!("        acts:     {}", index.act_count());
            println!("        sections: {}", index.section_count());
            println!("        intents:  {}", index.intent_count());
            println!("        topics:   {}", index.topic_labels().len());
        }
        Err(e) => {
            println!("  !!  Knowledge corpus failed to load: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
        Ok(())
    } else {
        println!("  {issues} issue(s) found. See above for details.");
        Err(format!("{issues} issue(s) found").into())
    }
}

/// Probe the LLM endpoint. A network failure reads as unreachable rather
/// than aborting the report.
async fn provider_reachable(provider: &dyn Provider) -> bool {
    provider.health_check().await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ainbondhu_core::error::ProviderError;
    use ainbondhu_core::provider::{ProviderRequest, ProviderResponse};
    use async_trait::async_trait;

    struct FixedHealthProvider {
        health: Result<bool, ()>,
    }

    #[async_trait]
    impl Provider for FixedHealthProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            Err(ProviderError::Network("not under test".into()))
        }

        async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
            self.health
                .map_err(|_| ProviderError::Network("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn healthy_endpoint_is_reachable() {
        let provider = FixedHealthProvider { health: Ok(true) };
        assert!(provider_reachable(&provider).await);
    }

    #[tokio::test]
    async fn failing_endpoint_is_unreachable() {
        let provider = FixedHealthProvider { health: Ok(false) };
        assert!(!provider_reachable(&provider).await);

        let provider = FixedHealthProvider { health: Err(()) };
        assert!(!provider_reachable(&provider).await);
    }
}
