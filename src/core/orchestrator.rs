//! Return-then-industrialization emission sequence. Both payloads are built
//! before any call goes out; the industrialization NF-e is only attempted
//! after the return NF-e was accepted, and an already emitted return NF-e is
//! never cancelled when the second step fails.

use crate::core::payload::InvoiceBuilder;
use crate::domain::model::{
    EmissionOutcome, InvoiceKind, PriceMap, ProductMap, SourceInvoiceRef,
};
use crate::domain::ports::InvoiceSubmitter;
use crate::utils::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmissionState {
    Start,
    ReturnPending,
    IndustrialPending,
    Done,
    Failed,
}

pub struct EmissionSequence<E: InvoiceSubmitter> {
    emitter: E,
    builder: InvoiceBuilder,
}

impl<E: InvoiceSubmitter> EmissionSequence<E> {
    pub fn new(emitter: E, builder: InvoiceBuilder) -> Self {
        Self { emitter, builder }
    }

    /// Emit both NF-e in immediate sequence. Mapping problems surface as an
    /// `Err` before anything is sent; emission failures come back inside the
    /// outcome so the caller always gets the partial state.
    pub async fn run(
        &self,
        product: &str,
        quantity: f64,
        mapping: &ProductMap,
        prices: &PriceMap,
        source_refs: &[SourceInvoiceRef],
    ) -> Result<EmissionOutcome> {
        tracing::info!(
            "📋 Sequential NF-e emission - product: {} | quantity: {}",
            product,
            quantity
        );

        let mut state = EmissionState::Start;

        // Build both payloads up front so a bad product never emits anything.
        let return_payload =
            self.builder
                .return_invoice(product, quantity, mapping, prices, source_refs)?;
        let industrial_payload = self.builder.industrialization_invoice(
            product,
            quantity,
            mapping,
            prices,
            source_refs,
        )?;

        transition(&mut state, EmissionState::ReturnPending);
        tracing::info!("📤 [1/2] Emitting RETURN NF-e...");

        let return_invoice = match self
            .emitter
            .submit(&return_payload, InvoiceKind::Return)
            .await
        {
            Ok(response) => {
                tracing::info!(
                    "✅ Return NF-e emitted: {}",
                    response.numero.as_deref().unwrap_or("N/A")
                );
                response
            }
            Err(e) => {
                transition(&mut state, EmissionState::Failed);
                return Ok(EmissionOutcome {
                    success: false,
                    return_invoice: None,
                    industrial_invoice: None,
                    error: Some(format!("return invoice failed: {}", e)),
                });
            }
        };

        transition(&mut state, EmissionState::IndustrialPending);
        tracing::info!("📤 [2/2] Emitting INDUSTRIALIZATION NF-e...");

        let industrial_invoice = match self
            .emitter
            .submit(&industrial_payload, InvoiceKind::Industrialization)
            .await
        {
            Ok(response) => {
                tracing::info!(
                    "✅ Industrialization NF-e emitted: {}",
                    response.numero.as_deref().unwrap_or("N/A")
                );
                response
            }
            Err(e) => {
                transition(&mut state, EmissionState::Failed);
                // No compensating cancellation: the return NF-e stays emitted
                // and a blind re-run would duplicate it.
                tracing::warn!(
                    "⚠️ Return NF-e {} was already emitted and will NOT be cancelled - manual reconciliation required",
                    return_invoice.numero.as_deref().unwrap_or("N/A")
                );
                return Ok(EmissionOutcome {
                    success: false,
                    return_invoice: Some(return_invoice),
                    industrial_invoice: None,
                    error: Some(format!("industrial invoice failed: {}", e)),
                });
            }
        };

        transition(&mut state, EmissionState::Done);
        tracing::info!("✅ Both NF-e emitted in sequence");

        Ok(EmissionOutcome {
            success: true,
            return_invoice: Some(return_invoice),
            industrial_invoice: Some(industrial_invoice),
            error: None,
        })
    }
}

fn transition(state: &mut EmissionState, to: EmissionState) {
    tracing::debug!("emission state: {:?} -> {:?}", state, to);
    *state = to;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{InvoicePayload, InvoiceResponse, PriceEntry, ProductCodes};
    use crate::utils::error::AutomationError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    struct MockSubmitter {
        calls: Arc<Mutex<Vec<InvoiceKind>>>,
        fail_on: Option<InvoiceKind>,
    }

    impl MockSubmitter {
        fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                fail_on: None,
            }
        }

        fn failing_on(mut self, kind: InvoiceKind) -> Self {
            self.fail_on = Some(kind);
            self
        }

        fn call_log(&self) -> Arc<Mutex<Vec<InvoiceKind>>> {
            Arc::clone(&self.calls)
        }
    }

    #[async_trait]
    impl InvoiceSubmitter for MockSubmitter {
        async fn submit(
            &self,
            _payload: &InvoicePayload,
            kind: InvoiceKind,
        ) -> crate::utils::error::Result<InvoiceResponse> {
            self.calls.lock().await.push(kind);

            if self.fail_on == Some(kind) {
                return Err(AutomationError::remote_rejection(422, "validation error"));
            }

            Ok(InvoiceResponse {
                id: Some(format!("ID_{}", kind.label())),
                numero: Some("999999".to_string()),
                serie: Some("1".to_string()),
                situacao: Some("TEST".to_string()),
            })
        }
    }

    fn fixture() -> (ProductMap, PriceMap, Vec<SourceInvoiceRef>) {
        let mut mapping = HashMap::new();
        mapping.insert(
            "P100".to_string(),
            ProductCodes {
                return_code: "R-P100".to_string(),
                industrial_code: "I-P100".to_string(),
                material_code: "M-P100".to_string(),
            },
        );

        let mut prices = HashMap::new();
        prices.insert(
            "P100".to_string(),
            PriceEntry {
                return_value: 2.50,
                industrial_value: 1.10,
                material_value: 0.75,
            },
        );

        let refs = vec![SourceInvoiceRef {
            nf_numero: "12345".to_string(),
        }];

        (mapping, prices, refs)
    }

    fn builder() -> InvoiceBuilder {
        InvoiceBuilder::new(json!({"nome": "Cliente"}))
            .with_emission_date(NaiveDate::from_ymd_opt(2026, 8, 6).unwrap())
    }

    #[tokio::test]
    async fn test_happy_path_emits_in_order() {
        let (mapping, prices, refs) = fixture();
        let submitter = MockSubmitter::new();
        let calls = submitter.call_log();
        let sequence = EmissionSequence::new(submitter, builder());

        let outcome = sequence
            .run("P100", 500.0, &mapping, &prices, &refs)
            .await
            .unwrap();

        assert!(outcome.success);
        assert!(outcome.error.is_none());
        assert_eq!(
            outcome.return_invoice.unwrap().numero.as_deref(),
            Some("999999")
        );
        assert_eq!(
            outcome.industrial_invoice.unwrap().numero.as_deref(),
            Some("999999")
        );
        assert_eq!(
            *calls.lock().await,
            vec![InvoiceKind::Return, InvoiceKind::Industrialization]
        );
    }

    #[tokio::test]
    async fn test_return_failure_short_circuits() {
        let (mapping, prices, refs) = fixture();
        let submitter = MockSubmitter::new().failing_on(InvoiceKind::Return);
        let calls = submitter.call_log();
        let sequence = EmissionSequence::new(submitter, builder());

        let outcome = sequence
            .run("P100", 500.0, &mapping, &prices, &refs)
            .await
            .unwrap();

        assert!(!outcome.success);
        assert!(outcome.return_invoice.is_none());
        assert!(outcome.industrial_invoice.is_none());
        assert!(outcome.error.unwrap().contains("return invoice failed"));
        // the industrialization emitter is never reached
        assert_eq!(*calls.lock().await, vec![InvoiceKind::Return]);
    }

    #[tokio::test]
    async fn test_industrial_failure_keeps_return_invoice() {
        let (mapping, prices, refs) = fixture();
        let submitter = MockSubmitter::new().failing_on(InvoiceKind::Industrialization);
        let calls = submitter.call_log();
        let sequence = EmissionSequence::new(submitter, builder());

        let outcome = sequence
            .run("P100", 500.0, &mapping, &prices, &refs)
            .await
            .unwrap();

        assert!(!outcome.success);
        assert!(outcome.return_invoice.is_some());
        assert!(outcome.industrial_invoice.is_none());
        assert!(outcome.error.unwrap().contains("industrial invoice failed"));
        assert_eq!(
            *calls.lock().await,
            vec![InvoiceKind::Return, InvoiceKind::Industrialization]
        );
    }

    #[tokio::test]
    async fn test_mapping_miss_fails_before_any_emission() {
        let (mapping, prices, refs) = fixture();
        let submitter = MockSubmitter::new();
        let calls = submitter.call_log();
        let sequence = EmissionSequence::new(submitter, builder());

        let err = sequence
            .run("UNKNOWN", 500.0, &mapping, &prices, &refs)
            .await
            .unwrap_err();

        assert!(matches!(err, AutomationError::MappingNotFound { .. }));
        assert!(calls.lock().await.is_empty());
    }
}
