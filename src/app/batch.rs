//! Batch job over spreadsheet-sourced orders: read order rows and the used
//! source invoices through the injected range capability, run the sequential
//! emission per order, and write one status row back per order. A bad row is
//! recorded and the batch moves on; nothing is retried automatically.

use serde::{Deserialize, Serialize};

use crate::core::orchestrator::EmissionSequence;
use crate::domain::model::{OrderRow, PriceMap, ProductMap, SourceInvoiceRef};
use crate::domain::ports::{InvoiceSubmitter, RangeStore};
use crate::utils::error::Result;

/// 批次作業的工作表配置（名稱與範圍沿用既有試算表）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchLayout {
    #[serde(default = "default_orders_sheet")]
    pub orders_sheet: String,
    #[serde(default = "default_orders_range")]
    pub orders_range: String,
    #[serde(default = "default_sources_sheet")]
    pub sources_sheet: String,
    #[serde(default = "default_sources_range")]
    pub sources_range: String,
    #[serde(default = "default_results_sheet")]
    pub results_sheet: String,
    #[serde(default = "default_results_cell")]
    pub results_cell: String,
}

fn default_orders_sheet() -> String {
    "pedidos".to_string()
}

fn default_orders_range() -> String {
    "A2:B".to_string()
}

fn default_sources_sheet() -> String {
    "notas_usadas".to_string()
}

fn default_sources_range() -> String {
    "A2:A".to_string()
}

fn default_results_sheet() -> String {
    "resultados".to_string()
}

fn default_results_cell() -> String {
    "A2".to_string()
}

impl Default for BatchLayout {
    fn default() -> Self {
        Self {
            orders_sheet: default_orders_sheet(),
            orders_range: default_orders_range(),
            sources_sheet: default_sources_sheet(),
            sources_range: default_sources_range(),
            results_sheet: default_results_sheet(),
            results_cell: default_results_cell(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct BatchRunner<R: RangeStore, E: InvoiceSubmitter> {
    ranges: R,
    sequence: EmissionSequence<E>,
    layout: BatchLayout,
}

impl<R: RangeStore, E: InvoiceSubmitter> BatchRunner<R, E> {
    pub fn new(ranges: R, sequence: EmissionSequence<E>, layout: BatchLayout) -> Self {
        Self {
            ranges,
            sequence,
            layout,
        }
    }

    /// 執行整個批次：每一列訂單各自產生一列結果
    pub async fn run(&self, mapping: &ProductMap, prices: &PriceMap) -> Result<BatchSummary> {
        let order_rows = self
            .ranges
            .read_range(&self.layout.orders_sheet, &self.layout.orders_range)
            .await?;
        let source_rows = self
            .ranges
            .read_range(&self.layout.sources_sheet, &self.layout.sources_range)
            .await?;

        let source_refs: Vec<SourceInvoiceRef> = source_rows
            .iter()
            .filter_map(|row| row.first())
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
            .map(|cell| SourceInvoiceRef {
                nf_numero: cell.to_string(),
            })
            .collect();

        tracing::info!(
            "📋 Batch: {} order row(s), {} source NF reference(s)",
            order_rows.len(),
            source_refs.len()
        );

        let mut summary = BatchSummary::default();
        let mut results: Vec<Vec<String>> = Vec::new();

        for (index, row) in order_rows.iter().enumerate() {
            summary.processed += 1;

            let order = match parse_order(index, row) {
                Ok(order) => order,
                Err(reason) => {
                    tracing::warn!("⏭️ Skipping row {}: {}", index + 1, reason);
                    summary.failed += 1;
                    results.push(result_row(
                        row.first().map(String::as_str).unwrap_or(""),
                        "ERRO",
                        None,
                        None,
                        Some(&reason),
                    ));
                    continue;
                }
            };

            // per-row failure, the remaining orders still run
            match self
                .sequence
                .run(
                    &order.product,
                    order.quantity,
                    mapping,
                    prices,
                    &source_refs,
                )
                .await
            {
                Ok(outcome) if outcome.success => {
                    summary.succeeded += 1;
                    results.push(result_row(
                        &order.product,
                        "OK",
                        outcome
                            .return_invoice
                            .as_ref()
                            .and_then(|r| r.numero.as_deref()),
                        outcome
                            .industrial_invoice
                            .as_ref()
                            .and_then(|r| r.numero.as_deref()),
                        None,
                    ));
                }
                Ok(outcome) => {
                    summary.failed += 1;
                    results.push(result_row(
                        &order.product,
                        "ERRO",
                        outcome
                            .return_invoice
                            .as_ref()
                            .and_then(|r| r.numero.as_deref()),
                        None,
                        outcome.error.as_deref(),
                    ));
                }
                Err(e) => {
                    tracing::error!("❌ Row {} failed before emission: {}", index + 1, e);
                    summary.failed += 1;
                    results.push(result_row(
                        &order.product,
                        "ERRO",
                        None,
                        None,
                        Some(&e.to_string()),
                    ));
                }
            }
        }

        self.ranges
            .write_range(&self.layout.results_sheet, &self.layout.results_cell, results)
            .await?;

        tracing::info!(
            "📊 Batch finished: {} processed, {} ok, {} failed",
            summary.processed,
            summary.succeeded,
            summary.failed
        );

        Ok(summary)
    }
}

fn parse_order(index: usize, row: &[String]) -> std::result::Result<OrderRow, String> {
    let product = row
        .first()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "empty product cell".to_string())?;

    let quantity_cell = row
        .get(1)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "empty quantity cell".to_string())?;

    // 數量欄允許巴西格式的小數逗號
    let quantity: f64 = quantity_cell
        .replace(',', ".")
        .parse()
        .map_err(|_| format!("invalid quantity '{}'", quantity_cell))?;

    if quantity <= 0.0 {
        return Err(format!("quantity must be positive, got {}", quantity));
    }

    Ok(OrderRow {
        row_number: index + 1,
        product: product.to_string(),
        quantity,
    })
}

fn result_row(
    product: &str,
    status: &str,
    return_number: Option<&str>,
    industrial_number: Option<&str>,
    error: Option<&str>,
) -> Vec<String> {
    vec![
        product.to_string(),
        status.to_string(),
        return_number.unwrap_or("").to_string(),
        industrial_number.unwrap_or("").to_string(),
        error.unwrap_or("").to_string(),
    ]
}
