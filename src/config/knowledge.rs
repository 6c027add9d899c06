use crate::error::ConfigError;
use log::info;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

/// Reference text the assistant answers from. Loaded once, shared read-only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KnowledgeDocument {
    text: Arc<str>,
}

impl KnowledgeDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: Arc::from(text.into()) }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

pub fn load_knowledge<P: AsRef<Path>>(path: P) -> Result<KnowledgeDocument, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            ConfigError::KnowledgeNotFound { path: path.to_path_buf() }
        } else {
            ConfigError::KnowledgeUnreadable { path: path.to_path_buf(), source: e }
        }
    })?;
    info!("Loaded knowledge document '{}' ({} bytes)", path.display(), text.len());
    Ok(KnowledgeDocument::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_reads_full_text() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "第1回セミナー\n日時: 4月12日\n").unwrap();

        let doc = load_knowledge(file.path()).unwrap();
        assert_eq!(doc.as_str(), "第1回セミナー\n日時: 4月12日\n");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("website_data.txt");

        match load_knowledge(&missing) {
            Err(ConfigError::KnowledgeNotFound { path }) => assert_eq!(path, missing),
            other => panic!("expected KnowledgeNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8_is_unreadable() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00, 0x80]).unwrap();

        assert!(
            matches!(load_knowledge(file.path()), Err(ConfigError::KnowledgeUnreadable { .. }))
        );
    }
}
