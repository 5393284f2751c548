use crate::domain::model::{InvoiceKind, InvoicePayload, InvoiceResponse, TokenRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Durable holder of the OAuth credential state. `save` must be atomic: a
/// concurrent reader never observes a partially written file.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<TokenRecord>;
    async fn save(&self, record: &TokenRecord) -> Result<()>;
}

/// Submits one invoice payload. Implementations report every failure through
/// the returned `Result`; nothing escapes past this boundary.
#[async_trait]
pub trait InvoiceSubmitter: Send + Sync {
    async fn submit(&self, payload: &InvoicePayload, kind: InvoiceKind) -> Result<InvoiceResponse>;
}

/// Spreadsheet capability consumed by the batch job. The core never touches
/// the backing spreadsheet directly; rows come and go as plain string cells.
#[async_trait]
pub trait RangeStore: Send + Sync {
    async fn read_range(&self, sheet: &str, range: &str) -> Result<Vec<Vec<String>>>;
    async fn write_range(&self, sheet: &str, first_cell: &str, values: Vec<Vec<String>>)
        -> Result<()>;
}
