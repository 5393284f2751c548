//! Pure construction of the two linked NF-e payloads. No I/O here: a payload
//! that cannot be built (unknown product, missing price row, no source NF)
//! fails before the emission step is ever reached.

use chrono::{Local, NaiveDate};

use crate::domain::model::{
    AdditionalInfo, InvoiceItem, InvoicePayload, OperationNature, PriceEntry, PriceMap,
    ProductCodes, ProductMap, SourceInvoiceRef,
};
use crate::utils::error::{AutomationError, Result};

const RETURN_NATURE: &str = "Retorno de mercadoria recebida para industrialização";
const INDUSTRIAL_NATURE: &str = "Industrialização efetuada para terceiros";
const CFOP_RETURN: &str = "5902";
const CFOP_INDUSTRIAL: &str = "5124";
const UNIT_KG: &str = "KG";

pub struct InvoiceBuilder {
    recipient: serde_json::Value,
    emission_date: NaiveDate,
}

impl InvoiceBuilder {
    pub fn new(recipient: serde_json::Value) -> Self {
        Self {
            recipient,
            emission_date: Local::now().date_naive(),
        }
    }

    /// Pin the emission date. The orchestrator builds both payloads from one
    /// builder so they always share the same date.
    pub fn with_emission_date(mut self, date: NaiveDate) -> Self {
        self.emission_date = date;
        self
    }

    /// Return NF-e (CFOP 5902): one product line for the industrialized goods
    /// going back, referencing the first used source invoice.
    pub fn return_invoice(
        &self,
        product: &str,
        quantity: f64,
        mapping: &ProductMap,
        prices: &PriceMap,
        source_refs: &[SourceInvoiceRef],
    ) -> Result<InvoicePayload> {
        let codes = lookup_codes(product, mapping)?;
        let price = lookup_prices(product, prices)?;
        let anchor = anchor_ref(source_refs)?;

        Ok(self.envelope(
            RETURN_NATURE,
            vec![InvoiceItem {
                codigo: codes.return_code.clone(),
                descricao: "Produto Industrializado - Retorno".to_string(),
                quantidade: quantity,
                valor: price.return_value,
                unidade: UNIT_KG.to_string(),
                tipo: "P".to_string(),
                cfop: CFOP_RETURN.to_string(),
            }],
            format!("NF Retorno ref. NF {}", anchor.nf_numero),
        ))
    }

    /// Industrialization NF-e (CFOP 5124): a service line plus the applied
    /// material line, referencing the same source invoice.
    pub fn industrialization_invoice(
        &self,
        product: &str,
        quantity: f64,
        mapping: &ProductMap,
        prices: &PriceMap,
        source_refs: &[SourceInvoiceRef],
    ) -> Result<InvoicePayload> {
        let codes = lookup_codes(product, mapping)?;
        let price = lookup_prices(product, prices)?;
        let anchor = anchor_ref(source_refs)?;

        Ok(self.envelope(
            INDUSTRIAL_NATURE,
            vec![
                InvoiceItem {
                    codigo: codes.industrial_code.clone(),
                    descricao: "Serviço de Industrialização".to_string(),
                    quantidade: quantity,
                    valor: price.industrial_value,
                    unidade: UNIT_KG.to_string(),
                    tipo: "S".to_string(),
                    cfop: CFOP_INDUSTRIAL.to_string(),
                },
                InvoiceItem {
                    codigo: codes.material_code.clone(),
                    descricao: "Material Aplicado".to_string(),
                    quantidade: quantity,
                    valor: price.material_value,
                    unidade: UNIT_KG.to_string(),
                    tipo: "P".to_string(),
                    cfop: CFOP_INDUSTRIAL.to_string(),
                },
            ],
            format!("Industrialização ref. NF {}", anchor.nf_numero),
        ))
    }

    fn envelope(
        &self,
        nature: &str,
        itens: Vec<InvoiceItem>,
        free_text: String,
    ) -> InvoicePayload {
        let date = self.emission_date.format("%Y-%m-%d").to_string();
        InvoicePayload {
            tipo: 1,
            data_emissao: date.clone(),
            data_operacao: date,
            natureza_operacao: OperationNature {
                descricao: nature.to_string(),
            },
            contato: self.recipient.clone(),
            itens,
            informacoes_adicionais: AdditionalInfo {
                informacoes_complementares: free_text,
            },
        }
    }
}

fn lookup_codes<'a>(product: &str, mapping: &'a ProductMap) -> Result<&'a ProductCodes> {
    mapping
        .get(product)
        .ok_or_else(|| AutomationError::MappingNotFound {
            product: product.to_string(),
            table: "mapping".to_string(),
        })
}

fn lookup_prices<'a>(product: &str, prices: &'a PriceMap) -> Result<&'a PriceEntry> {
    prices
        .get(product)
        .ok_or_else(|| AutomationError::MappingNotFound {
            product: product.to_string(),
            table: "prices".to_string(),
        })
}

fn anchor_ref(source_refs: &[SourceInvoiceRef]) -> Result<&SourceInvoiceRef> {
    source_refs
        .first()
        .ok_or(AutomationError::MissingSourceReference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::collections::HashMap;

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

    #[test]
    fn test_return_invoice_shape() {
        let (mapping, prices, refs) = fixture();
        let payload = builder()
            .return_invoice("P100", 500.0, &mapping, &prices, &refs)
            .unwrap();

        assert_eq!(payload.tipo, 1);
        assert_eq!(payload.data_emissao, "2026-08-06");
        assert_eq!(payload.data_operacao, "2026-08-06");
        assert_eq!(
            payload.natureza_operacao.descricao,
            "Retorno de mercadoria recebida para industrialização"
        );
        assert_eq!(payload.itens.len(), 1);

        let item = &payload.itens[0];
        assert_eq!(item.codigo, "R-P100");
        assert_eq!(item.quantidade, 500.0);
        assert_eq!(item.valor, 2.50);
        assert_eq!(item.unidade, "KG");
        assert_eq!(item.tipo, "P");
        assert_eq!(item.cfop, "5902");

        assert_eq!(
            payload.informacoes_adicionais.informacoes_complementares,
            "NF Retorno ref. NF 12345"
        );
    }

    #[test]
    fn test_industrialization_invoice_shape() {
        let (mapping, prices, refs) = fixture();
        let payload = builder()
            .industrialization_invoice("P100", 500.0, &mapping, &prices, &refs)
            .unwrap();

        assert_eq!(
            payload.natureza_operacao.descricao,
            "Industrialização efetuada para terceiros"
        );
        assert_eq!(payload.itens.len(), 2);

        let service = &payload.itens[0];
        assert_eq!(service.codigo, "I-P100");
        assert_eq!(service.valor, 1.10);
        assert_eq!(service.tipo, "S");
        assert_eq!(service.cfop, "5124");

        let material = &payload.itens[1];
        assert_eq!(material.codigo, "M-P100");
        assert_eq!(material.valor, 0.75);
        assert_eq!(material.tipo, "P");
        assert_eq!(material.cfop, "5124");

        assert_eq!(
            payload.informacoes_adicionais.informacoes_complementares,
            "Industrialização ref. NF 12345"
        );
    }

    #[test]
    fn test_construction_is_deterministic() {
        let (mapping, prices, refs) = fixture();
        let b = builder();

        let first = b
            .return_invoice("P100", 500.0, &mapping, &prices, &refs)
            .unwrap();
        let second = b
            .return_invoice("P100", 500.0, &mapping, &prices, &refs)
            .unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );

        let first = b
            .industrialization_invoice("P100", 500.0, &mapping, &prices, &refs)
            .unwrap();
        let second = b
            .industrialization_invoice("P100", 500.0, &mapping, &prices, &refs)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_product_fails_on_mapping() {
        let (mapping, prices, refs) = fixture();
        let err = builder()
            .return_invoice("UNKNOWN", 1.0, &mapping, &prices, &refs)
            .unwrap_err();

        assert!(
            matches!(err, AutomationError::MappingNotFound { ref product, ref table } if product == "UNKNOWN" && table == "mapping")
        );
    }

    #[test]
    fn test_product_missing_from_price_table() {
        let (mut mapping, prices, refs) = fixture();
        mapping.insert(
            "P200".to_string(),
            ProductCodes {
                return_code: "R-P200".to_string(),
                industrial_code: "I-P200".to_string(),
                material_code: "M-P200".to_string(),
            },
        );

        let err = builder()
            .industrialization_invoice("P200", 1.0, &mapping, &prices, &refs)
            .unwrap_err();

        assert!(
            matches!(err, AutomationError::MappingNotFound { ref table, .. } if table == "prices")
        );
    }

    #[test]
    fn test_empty_source_refs_rejected() {
        let (mapping, prices, _) = fixture();
        let err = builder()
            .return_invoice("P100", 1.0, &mapping, &prices, &[])
            .unwrap_err();

        assert!(matches!(err, AutomationError::MissingSourceReference));
    }
}
