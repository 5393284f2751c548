pub mod emitter;
pub mod orchestrator;
pub mod payload;
pub mod token;

pub use crate::domain::model::{EmissionOutcome, InvoiceKind, InvoiceResponse, TokenRecord};
pub use crate::domain::ports::{InvoiceSubmitter, RangeStore, TokenStore};
pub use crate::utils::error::Result;
