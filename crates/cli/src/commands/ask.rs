//! `ainbondhu ask` — One-shot or interactive chat from the terminal.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use ainbondhu_agent::ChatLoop;
use ainbondhu_config::AppConfig;
use ainbondhu_core::message::Message;
use ainbondhu_core::Provider;
use ainbondhu_knowledge::KnowledgeIndex;
use ainbondhu_providers::OpenAiCompatProvider;
use ainbondhu_search::SemanticSearch;

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let Some(api_key) = config.api_key.clone() else {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    AINBONDHU_API_KEY = 'sk-...'");
        eprintln!("    OPENAI_API_KEY    = 'sk-...'");
        eprintln!();
        eprintln!("  Or add api_key to ainbondhu.toml.");
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    };

    let provider: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::new(
        "openai",
        config.provider.base_url.clone(),
        api_key,
        Duration::from_secs(config.provider.request_timeout_secs),
    ));

    let index = Arc::new(KnowledgeIndex::load(&config.knowledge.data_dir)?);
    let search = Arc::new(SemanticSearch::new(
        provider.clone(),
        index.clone(),
        config.provider.classifier_model.clone(),
        config.search.act_top_k,
        config.search.section_top_k,
        Duration::from_secs(config.search.classifier_timeout_secs),
    ));
    let tools = Arc::new(ainbondhu_tools::registry(index.clone(), search));

    let mut chat = ChatLoop::new(
        provider,
        tools,
        config.provider.chat_model.clone(),
        config.provider.temperature,
    )
    .with_max_iterations(config.context.max_iterations);
    if let Some(max) = config.provider.max_tokens {
        chat = chat.with_max_tokens(max);
    }

    if let Some(msg) = message {
        // Single question mode
        let outcome = chat.respond(vec![Message::user(&msg)]).await;
        println!("{}", outcome.response);
        if !outcome.success {
            return Err(outcome
                .error_message
                .unwrap_or_else(|| "chat turn failed".into())
                .into());
        }
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  আইন বন্ধু — আপনার আইনি সহায়ক");
    println!("  Model:    {}", config.provider.chat_model);
    println!("  Corpus:   {} sections, {} intents", index.section_count(), index.intent_count());
    println!();
    println!("  Type your question and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut history: Vec<Message> = Vec::new();
    let stdin = std::io::stdin();

    loop {
        print!("  আপনি > ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == "exit" {
            break;
        }

        history.push(Message::user(question));

        let outcome = chat.respond(history.clone()).await;
        println!();
        for line in outcome.response.lines() {
            println!("  আইন বন্ধু > {line}");
        }
        println!();

        history.push(Message::assistant(&outcome.response));

        // Keep the local transcript bounded the same way the gateway does
        let limit = config.context.history_limit;
        if history.len() > limit {
            history.drain(..history.len() - limit);
        }
    }

    println!();
    println!("  বিদায়!");
    println!();

    Ok(())
}
