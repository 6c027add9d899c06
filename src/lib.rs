pub mod agent;
pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod llm;
pub mod models;
pub mod server;
pub mod session;

use agent::RelayAgent;
use cli::{ Args, Command };
use config::settings::RelayConfig;
use console::run_console;
use log::{ info, warn };
use server::Server;
use session::ChatSession;
use std::error::Error;
use std::sync::Arc;
use tokio::io::BufReader;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let command = args.command();
    let config = RelayConfig::from_args(&args)?;

    info!("--- Core Configuration ---");
    info!("Mode: {:?}", command);
    info!("Knowledge Path: {}", args.knowledge_path);
    info!("Persona: {}", args.persona_path.as_deref().unwrap_or("built-in"));
    info!("LLM Provider: {}", config.llm.llm_type);
    info!("Base URL: {}", config.llm.base_url);
    info!("Model: {}", config.options.model);
    info!("Temperature: {}", config.options.temperature);
    info!("Max Tokens: {:?}", config.options.max_tokens);
    info!("Upstream Timeout: {}s", config.options.timeout.as_secs());
    info!("API Key: {}", if config.llm.api_key.is_some() { "present" } else { "missing" });
    if command == Command::Serve {
        info!("Server Address: {}", config.server.addr());
        info!("Static Dir: {}", config.server.static_dir.display());
    }
    info!("-------------------------");

    let agent = Arc::new(RelayAgent::from_config(&config)?);

    match command {
        Command::Serve => {
            let server = Server::new(config.server.clone(), agent);
            server.run().await?;
        }
        Command::Chat => {
            if !agent.has_credential() {
                warn!("No OPENROUTER_API_KEY or OPENAI_API_KEY configured. Replies will fail.");
            }
            let session = ChatSession::new(agent);
            let stdin = BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            run_console(&session, stdin, &mut stdout).await?;
        }
    }

    Ok(())
}
