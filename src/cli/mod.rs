use clap::{ Parser, Subcommand };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    // --- Knowledge & Persona Args ---
    /// Path to the knowledge document the assistant answers from.
    #[arg(long, env = "KNOWLEDGE_PATH", default_value = "website_data.txt", global = true)]
    pub knowledge_path: String,

    /// Optional file with persona/style instructions. Uses the built-in persona if unset.
    #[arg(long, env = "PERSONA_PATH", global = true)]
    pub persona_path: Option<String>,

    /// Heading line placed between the persona block and the knowledge text.
    #[arg(long, env = "KNOWLEDGE_HEADING", global = true)]
    pub knowledge_heading: Option<String>,

    // --- Chat LLM Provider Args ---
    /// Provider preset used for default base URL and model (openrouter, openai)
    #[arg(long, env = "LLM_PROVIDER", default_value = "openrouter", global = true)]
    pub provider: String,

    /// Base URL of the OpenAI-compatible API (e.g., https://openrouter.ai/api/v1)
    #[arg(long, env = "OPENAI_BASE_URL", global = true)] // No default, provider preset decides
    pub base_url: Option<String>,

    /// API key for OpenRouter. Takes precedence over OPENAI_API_KEY.
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true, global = true)]
    pub openrouter_api_key: Option<String>,

    /// API key for OpenAI or another compatible endpoint.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub openai_api_key: Option<String>,

    /// Model name for chat completion (e.g., openai/gpt-4o-mini)
    #[arg(long, env = "OPENROUTER_MODEL", global = true)] // No default, provider preset decides
    pub model: Option<String>,

    /// Sampling temperature, between 0 and 2.
    #[arg(long, env = "LLM_TEMPERATURE", default_value = "0.1", global = true)]
    pub temperature: f32,

    /// Optional cap on generated tokens.
    #[arg(long, env = "LLM_MAX_TOKENS", global = true)]
    pub max_tokens: Option<u32>,

    /// Timeout in seconds for a single upstream call.
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value = "60", global = true)]
    pub timeout_secs: u64,

    /// Forwarded as the HTTP-Referer header (OpenRouter app attribution).
    #[arg(long, env = "OPENROUTER_HTTP_REFERER", global = true)]
    pub http_referer: Option<String>,

    /// Forwarded as the X-Title header (OpenRouter app attribution).
    #[arg(long, env = "OPENROUTER_X_TITLE", global = true)]
    pub x_title: Option<String>,

    // --- Server Args ---
    /// Host address for the HTTP server to listen on.
    #[arg(long, env = "HOST", default_value = "127.0.0.1", global = true)]
    pub host: String,

    /// Port for the HTTP server to listen on.
    #[arg(long, env = "PORT", default_value = "8000", global = true)]
    pub port: u16,

    /// Directory served for GET requests outside /api (index.html for "/").
    #[arg(long, env = "STATIC_DIR", default_value = "static", global = true)]
    pub static_dir: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve the JSON chat API over HTTP (default).
    Serve,
    /// Chat with the assistant in the terminal.
    Chat,
}

impl Args {
    /// First non-blank credential, OpenRouter before OpenAI.
    pub fn api_key(&self) -> Option<String> {
        [&self.openrouter_api_key, &self.openai_api_key]
            .into_iter()
            .flatten()
            .map(|k| k.trim())
            .find(|k| !k.is_empty())
            .map(str::to_string)
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_to_serve() {
        let args = parse(&["knowledge-relay", "--knowledge-path", "kb.txt"]);
        assert_eq!(args.command(), Command::Serve);
        assert_eq!(args.knowledge_path, "kb.txt");

        let args = parse(&["knowledge-relay", "chat", "--port", "9000"]);
        assert_eq!(args.command(), Command::Chat);
        assert_eq!(args.port, 9000);
    }

    #[test]
    fn test_api_key_precedence() {
        let args = parse(&[
            "knowledge-relay",
            "--openrouter-api-key",
            " or-key ",
            "--openai-api-key",
            "oa-key",
        ]);
        assert_eq!(args.api_key().as_deref(), Some("or-key"));

        let args = parse(&[
            "knowledge-relay",
            "--openrouter-api-key",
            "   ",
            "--openai-api-key",
            "oa-key",
        ]);
        assert_eq!(args.api_key().as_deref(), Some("oa-key"));
    }
}
