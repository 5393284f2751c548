pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliArgs;
pub use crate::config::AppConfig;

pub use crate::adapters::ranges::CsvRangeStore;
pub use crate::adapters::token_file::FileTokenStore;
pub use crate::app::batch::{BatchLayout, BatchRunner};
pub use crate::core::emitter::NfeEmitter;
pub use crate::core::orchestrator::EmissionSequence;
pub use crate::core::payload::InvoiceBuilder;
pub use crate::core::token::TokenManager;
pub use crate::utils::error::{AutomationError, Result};
