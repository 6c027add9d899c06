use crate::config::knowledge::KnowledgeDocument;
use crate::error::ConfigError;
use std::fs;
use std::path::Path;

const DEFAULT_INSTRUCTIONS: &str = concat!(
    "あなたは、**東京確率セミナーの事務局を担当する、丁寧で親切な秘書AI**です。",
    "以下に提供されたセミナー情報のみに基づいて回答してくださいペンギン。\n\n",
    "【ルール】\n",
    "- 常に敬語ですペンギン\n",
    "- 語尾に必ず「ペンギン」を付けますペンギン\n",
    "- 情報がなければ、",
    "「申し訳ございません。提供された情報には、その件に関する記載がございませんでしたペンギン。」",
    "と答えますペンギン"
);

pub const DEFAULT_KNOWLEDGE_HEADING: &str = "【セミナー情報】";

/// Persona and style rules placed ahead of the knowledge text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Persona {
    pub instructions: String,
    pub knowledge_heading: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            knowledge_heading: DEFAULT_KNOWLEDGE_HEADING.to_string(),
        }
    }
}

impl Persona {
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        knowledge_heading: Option<String>
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let instructions = fs
            ::read_to_string(path)
            .map_err(|e| ConfigError::PersonaUnreadable { path: path.to_path_buf(), source: e })?;
        Ok(Self {
            instructions: instructions.trim_end().to_string(),
            knowledge_heading: knowledge_heading.unwrap_or_else(||
                DEFAULT_KNOWLEDGE_HEADING.to_string()
            ),
        })
    }
}

/// Persona block, blank line, heading, then the knowledge text untouched.
pub fn build_system_prompt(persona: &Persona, knowledge: &KnowledgeDocument) -> String {
    format!("{}\n\n{}\n{}", persona.instructions, persona.knowledge_heading, knowledge.as_str())
}
