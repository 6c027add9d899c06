use crate::cli::Args;
use crate::config::knowledge::load_knowledge;
use crate::config::prompt::{ build_system_prompt, Persona };
use crate::error::ConfigError;
use crate::llm::{ CompletionOptions, LlmConfig, LlmType };
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Everything the relay needs, resolved and validated once at startup.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub system_prompt: Arc<str>,
    pub llm: LlmConfig,
    pub options: CompletionOptions,
    pub server: ServerConfig,
}

impl RelayConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let knowledge = load_knowledge(&args.knowledge_path)?;
        let persona = match &args.persona_path {
            Some(path) => Persona::from_file(path, args.knowledge_heading.clone())?,
            None =>
                Persona {
                    knowledge_heading: args.knowledge_heading
                        .clone()
                        .unwrap_or_else(|| Persona::default().knowledge_heading),
                    ..Persona::default()
                },
        };
        let system_prompt = build_system_prompt(&persona, &knowledge);

        let llm_type: LlmType = args.provider.parse()?;
        let base_url = non_blank(args.base_url.as_deref())
            .unwrap_or(llm_type.default_base_url())
            .to_string();
        validate_base_url(&base_url)?;

        let model = non_blank(args.model.as_deref())
            .unwrap_or(llm_type.default_model())
            .to_string();
        let options = CompletionOptions {
            model,
            temperature: args.temperature,
            max_tokens: args.max_tokens,
            timeout: Duration::from_secs(args.timeout_secs),
        };
        options.validate()?;

        let api_key = args.api_key();
        let llm = LlmConfig {
            llm_type,
            api_key,
            base_url,
            http_referer: non_blank(args.http_referer.as_deref()).map(str::to_string),
            x_title: non_blank(args.x_title.as_deref()).map(str::to_string),
        };

        info!("System prompt built ({} bytes)", system_prompt.len());

        Ok(Self {
            system_prompt: Arc::from(system_prompt),
            llm,
            options,
            server: ServerConfig {
                host: args.host.trim().to_string(),
                port: args.port,
                static_dir: PathBuf::from(&args.static_dir),
            },
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(base_url).map_err(|e| ConfigError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other =>
            Err(ConfigError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: format!("unsupported scheme '{}'", other),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn knowledge_file(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", text).unwrap();
        file
    }

    fn args_for(file: &NamedTempFile, extra: &[&str]) -> Args {
        let path = file.path().to_str().unwrap().to_string();
        let mut argv = vec![
            "knowledge-relay".to_string(),
            "--knowledge-path".to_string(),
            path,
            "--openrouter-api-key".to_string(),
            "sk-test".to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_openrouter_preset() {
        let file = knowledge_file("facts");
        let config = RelayConfig::from_args(
            &args_for(&file, &["--provider", "openrouter", "--base-url", "  ", "--model", ""])
        ).unwrap();

        assert_eq!(config.llm.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.options.model, "openai/gpt-4o-mini");
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert!(config.system_prompt.ends_with("facts"));
    }

    #[test]
    fn test_openai_preset_with_overrides() {
        let file = knowledge_file("facts");
        let config = RelayConfig::from_args(
            &args_for(
                &file,
                &[
                    "--provider",
                    "openai",
                    "--max-tokens",
                    "300",
                    "--timeout-secs",
                    "5",
                    "--temperature",
                    "0.7",
                    "--model",
                    "gpt-4o-mini",
                    "--base-url",
                    "https://api.openai.com/v1",
                ]
            )
        ).unwrap();

        assert_eq!(config.llm.llm_type, LlmType::OpenAI);
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.options.model, "gpt-4o-mini");
        assert_eq!(config.options.max_tokens, Some(300));
        assert_eq!(config.options.timeout, Duration::from_secs(5));
        assert_eq!(config.options.temperature, 0.7);
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let file = knowledge_file("facts");
        let result = RelayConfig::from_args(&args_for(&file, &["--temperature", "2.5"]));
        assert!(matches!(result, Err(ConfigError::InvalidTemperature(_))));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let file = knowledge_file("facts");
        let result = RelayConfig::from_args(&args_for(&file, &["--timeout-secs", "0"]));
        assert!(matches!(result, Err(ConfigError::InvalidTimeout)));
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let file = knowledge_file("facts");
        for url in ["not a url", "ftp://example.com/v1"] {
            let result = RelayConfig::from_args(&args_for(&file, &["--base-url", url]));
            assert!(matches!(result, Err(ConfigError::InvalidBaseUrl { .. })));
        }
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let file = knowledge_file("facts");
        let result = RelayConfig::from_args(&args_for(&file, &["--provider", "ollama"]));
        assert!(matches!(result, Err(ConfigError::InvalidProvider(_))));
    }

    #[test]
    fn test_missing_knowledge_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("website_data.txt");
        let args = Args::try_parse_from([
            "knowledge-relay",
            "--knowledge-path",
            missing.to_str().unwrap(),
        ]).unwrap();

        assert!(matches!(RelayConfig::from_args(&args), Err(ConfigError::KnowledgeNotFound { .. })));
    }

    #[test]
    fn test_custom_heading_with_default_persona() {
        let file = knowledge_file("opening hours: 9-17");
        let config = RelayConfig::from_args(
            &args_for(&file, &["--knowledge-heading", "[Library]"])
        ).unwrap();
        assert!(config.system_prompt.ends_with("\n\n[Library]\nopening hours: 9-17"));
    }

    #[test]
    fn test_server_addr() {
        let file = knowledge_file("facts");
        let config = RelayConfig::from_args(
            &args_for(&file, &["--host", "0.0.0.0", "--port", "8123"])
        ).unwrap();
        assert_eq!(config.server.addr(), "0.0.0.0:8123");
    }
}
