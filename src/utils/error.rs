use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API request failed: {0}")]
    Api(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration load failed: {message}")]
    ConfigLoad { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfig { field: String },

    #[error("Product '{product}' not found in {table}")]
    MappingNotFound { product: String, table: String },

    #[error("No source invoice reference available")]
    MissingSourceReference,

    #[error("Token refresh failed: {message}")]
    TokenRefresh { message: String },

    #[error("Invoice rejected with status {status}: {body}")]
    RemoteRejection { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, AutomationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Degraded but the run can be considered successful
    Low,
    /// Worth retrying after the remote side recovers
    Medium,
    /// The current operation is lost, subsequent ones may work
    High,
    /// The process cannot meaningfully continue
    Critical,
}

impl AutomationError {
    /// Rejection with the response body capped at 200 characters so error
    /// logs stay bounded even when the API returns a full HTML page.
    pub fn remote_rejection(status: u16, body: &str) -> Self {
        Self::RemoteRejection {
            status,
            body: body.chars().take(200).collect(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::TokenRefresh { .. } => ErrorSeverity::Low,
            Self::Api(_) => ErrorSeverity::Medium,
            Self::RemoteRejection { .. } | Self::Csv(_) | Self::Serialization(_) => {
                ErrorSeverity::High
            }
            Self::MappingNotFound { .. } | Self::MissingSourceReference => ErrorSeverity::High,
            Self::Io(_)
            | Self::ConfigLoad { .. }
            | Self::InvalidConfigValue { .. }
            | Self::MissingConfig { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ConfigLoad { message } => {
                format!("Could not load configuration: {}", message)
            }
            Self::InvalidConfigValue { field, reason, .. } => {
                format!("Configuration field '{}' is invalid: {}", field, reason)
            }
            Self::MissingConfig { field } => {
                format!("Configuration field '{}' is missing", field)
            }
            Self::MappingNotFound { product, table } => {
                format!("Product '{}' has no entry in the {} table", product, table)
            }
            Self::MissingSourceReference => {
                "The order carries no source invoice (NF) to reference".to_string()
            }
            Self::TokenRefresh { message } => {
                format!("Could not renew the Bling access token: {}", message)
            }
            Self::RemoteRejection { status, .. } => {
                format!("Bling rejected the invoice (HTTP {})", status)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ConfigLoad { .. } | Self::MissingConfig { .. } => {
                "Check that the configuration file exists and is valid JSON"
            }
            Self::InvalidConfigValue { .. } => "Fix the configuration value and run again",
            Self::MappingNotFound { .. } => {
                "Add the product to the mapping/price tables before emitting"
            }
            Self::MissingSourceReference => {
                "Provide at least one used source invoice number (--source-nf)"
            }
            Self::TokenRefresh { .. } => {
                "Re-authorize the application in Bling and replace the token file"
            }
            Self::RemoteRejection { .. } => {
                "Inspect the response body; do NOT blindly re-run, the return NF may already exist"
            }
            Self::Api(_) => "Check network connectivity to the Bling API and retry",
            Self::Io(_) => "Check file paths and permissions",
            Self::Csv(_) => "Check the lookup table CSV format",
            Self::Serialization(_) => "Check the JSON file contents",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_not_found_display() {
        let err = AutomationError::MappingNotFound {
            product: "P100".to_string(),
            table: "mapping".to_string(),
        };
        assert_eq!(err.to_string(), "Product 'P100' not found in mapping");
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = AutomationError::ConfigLoad {
            message: "no such file".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().contains("no such file"));
    }

    #[test]
    fn test_token_refresh_is_low_severity() {
        // refresh failures must not abort the run
        let err = AutomationError::TokenRefresh {
            message: "HTTP 500".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
    }
}
