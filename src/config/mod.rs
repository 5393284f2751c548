pub mod cli;

use crate::utils::error::{AutomationError, Result};
use crate::utils::validation::{validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_OAUTH_URL: &str = "https://www.bling.com.br/Api/v3/oauth/token";
pub const DEFAULT_NFE_URL: &str = "https://www.bling.com.br/Api/v3/nfe";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "teste")]
    Test,
    #[serde(rename = "producao")]
    Production,
}

/// 運行配置，來自 automacao_config.json（鍵名沿用既有檔案格式）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(rename = "modo")]
    pub mode: Mode,
    #[serde(rename = "transmitir_sefaz")]
    pub transmit_to_authority: bool,
    /// Opaque contact object forwarded verbatim into every payload's `contato`.
    #[serde(rename = "cliente_ficticio")]
    pub recipient_contact: serde_json::Value,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_nfe_url")]
    pub nfe_url: String,
    #[serde(default = "default_oauth_url")]
    pub oauth_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Keep calling with a stale token when the refresh exchange fails.
    #[serde(default = "default_true")]
    pub proceed_on_refresh_failure: bool,
    /// Simulated responses also carry `serie`/`situacao`.
    #[serde(default = "default_true")]
    pub detailed_simulation: bool,
    #[serde(default = "default_refresh_margin")]
    pub refresh_margin_seconds: i64,
}

fn default_nfe_url() -> String {
    DEFAULT_NFE_URL.to_string()
}

fn default_oauth_url() -> String {
    DEFAULT_OAUTH_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_refresh_margin() -> i64 {
    300
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            nfe_url: default_nfe_url(),
            oauth_url: default_oauth_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            proceed_on_refresh_failure: true,
            detailed_simulation: true,
            refresh_margin_seconds: default_refresh_margin(),
        }
    }
}

impl AppConfig {
    /// 從 JSON 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(&path).map_err(|e| AutomationError::ConfigLoad {
                message: format!("{}: {}", path.as_ref().display(), e),
            })?;
        Self::from_json_str(&content)
    }

    /// 從 JSON 字串解析配置
    pub fn from_json_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = substitute_env_vars(content);

        serde_json::from_str(&processed_content).map_err(|e| AutomationError::ConfigLoad {
            message: format!("JSON parsing error: {}", e),
        })
    }

    /// Simulation is only active when test mode is on AND transmission to the
    /// fiscal authority is off; any other combination hits the live endpoint.
    pub fn simulation_enabled(&self) -> bool {
        self.mode == Mode::Test && !self.transmit_to_authority
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("api.nfe_url", &self.api.nfe_url)?;
        validate_url("api.oauth_url", &self.api.oauth_url)?;
        validate_range("api.timeout_seconds", self.api.timeout_seconds, 1, 300)?;
        validate_range(
            "policy.refresh_margin_seconds",
            self.policy.refresh_margin_seconds,
            0,
            3600,
        )?;

        if !self.recipient_contact.is_object() {
            return Err(AutomationError::InvalidConfigValue {
                field: "cliente_ficticio".to_string(),
                value: self.recipient_contact.to_string(),
                reason: "Recipient contact must be a JSON object".to_string(),
            });
        }

        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

/// 替換環境變數 (例如 ${BLING_CLIENT_ID})
fn substitute_env_vars(content: &str) -> String {
    use regex::Regex;
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .to_string()
}
