use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::model::TokenRecord;
use crate::domain::ports::TokenStore;
use crate::utils::error::{AutomationError, Result};

/// JSON-file token store (`bling_tokens.json`). Saves go through
/// a temp file in the same directory plus a rename, so a concurrent reader
/// never sees a half-written record.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<TokenRecord> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| AutomationError::ConfigLoad {
                message: format!("{}: {}", self.path.display(), e),
            })?;

        serde_json::from_str(&content).map_err(|e| AutomationError::ConfigLoad {
            message: format!("{}: {}", self.path.display(), e),
        })
    }

    async fn save(&self, record: &TokenRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(&self.path)
            .map_err(|e| AutomationError::Io(e.error))?;

        Ok(())
    }
}
