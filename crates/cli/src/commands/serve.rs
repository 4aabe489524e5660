//! `ainbondhu serve` — Start the HTTP gateway server.

use ainbondhu_config::AppConfig;

pub async fn run(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(p) = port {
        config.gateway.port = p;
    }

    println!();
    println!("  Ain Bondhu gateway");
    println!("  Address:  http://{}:{}", config.gateway.host, config.gateway.port);
    println!("  Corpus:   {}", config.knowledge.data_dir.display());
    println!("  Store:    {}", config.store.backend);
    println!();

    ainbondhu_gateway::start(config).await
}
