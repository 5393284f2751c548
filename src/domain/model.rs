use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const DEFAULT_EXPIRES_IN: i64 = 21600;

fn default_expires_in() -> i64 {
    DEFAULT_EXPIRES_IN
}

/// Persisted Bling OAuth credential state. Mirrors the token file on disk;
/// only the token manager mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    /// Absent means the token was never stamped and must be treated as expired.
    #[serde(
        rename = "token_generated_at",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub issued_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCodes {
    pub return_code: String,
    pub industrial_code: String,
    pub material_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub return_value: f64,
    pub industrial_value: f64,
    pub material_value: f64,
}

pub type ProductMap = HashMap<String, ProductCodes>;
pub type PriceMap = HashMap<String, PriceEntry>;

/// A previously used source invoice; only `nf_numero` matters to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInvoiceRef {
    pub nf_numero: String,
}

// NF-e wire structs keep the Bling API vocabulary; serde renames produce the
// exact JSON keys the v3 endpoint expects.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub codigo: String,
    pub descricao: String,
    pub quantidade: f64,
    pub valor: f64,
    pub unidade: String,
    pub tipo: String,
    pub cfop: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationNature {
    pub descricao: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalInfo {
    pub informacoes_complementares: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePayload {
    pub tipo: u8,
    pub data_emissao: String,
    pub data_operacao: String,
    pub natureza_operacao: OperationNature,
    pub contato: serde_json::Value,
    pub itens: Vec<InvoiceItem>,
    pub informacoes_adicionais: AdditionalInfo,
}

/// Identifiers assigned by Bling (or synthesized in simulation mode).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numero: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serie: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub situacao: Option<String>,
}

impl InvoiceResponse {
    /// Build from a response body, unwrapping the `data` object when present
    /// (the older API shape returns the fields at the top level).
    pub fn from_api_body(body: &serde_json::Value) -> Self {
        let data = body.get("data").filter(|v| v.is_object()).unwrap_or(body);
        Self {
            id: field_as_text(data, "id"),
            numero: field_as_text(data, "numero"),
            serie: field_as_text(data, "serie"),
            situacao: field_as_text(data, "situacao"),
        }
    }
}

fn field_as_text(value: &serde_json::Value, key: &str) -> Option<String> {
    match value.get(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvoiceKind {
    Return,
    Industrialization,
}

impl InvoiceKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Return => "RETURN",
            Self::Industrialization => "INDUSTRIAL",
        }
    }
}

impl fmt::Display for InvoiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Aggregated result of one sequential emission run. Immutable once returned;
/// a populated `return_invoice` with `success == false` is the partial state
/// the operator must reconcile by hand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionOutcome {
    pub success: bool,
    pub return_invoice: Option<InvoiceResponse>,
    pub industrial_invoice: Option<InvoiceResponse>,
    pub error: Option<String>,
}

/// One parsed order line from the spreadsheet ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub row_number: usize,
    pub product: String,
    pub quantity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_record_defaults() {
        let record: TokenRecord = serde_json::from_str(
            r#"{
                "access_token": "abc",
                "refresh_token": "def",
                "client_id": "id",
                "client_secret": "secret"
            }"#,
        )
        .unwrap();

        assert_eq!(record.expires_in, 21600);
        assert!(record.issued_at.is_none());
    }

    #[test]
    fn test_invoice_payload_wire_keys() {
        let payload = InvoicePayload {
            tipo: 1,
            data_emissao: "2026-08-06".to_string(),
            data_operacao: "2026-08-06".to_string(),
            natureza_operacao: OperationNature {
                descricao: "Retorno de mercadoria recebida para industrialização".to_string(),
            },
            contato: json!({"nome": "Cliente"}),
            itens: vec![],
            informacoes_adicionais: AdditionalInfo {
                informacoes_complementares: "NF Retorno ref. NF 12345".to_string(),
            },
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("dataEmissao").is_some());
        assert!(value.get("dataOperacao").is_some());
        assert!(value.get("naturezaOperacao").is_some());
        assert!(value.get("informacoesAdicionais").is_some());
        assert_eq!(
            value["informacoesAdicionais"]["informacoesComplementares"],
            "NF Retorno ref. NF 12345"
        );
    }

    #[test]
    fn test_response_from_data_wrapped_body() {
        let body = json!({"data": {"id": 77421, "numero": "1234", "serie": 1}});
        let response = InvoiceResponse::from_api_body(&body);

        assert_eq!(response.id.as_deref(), Some("77421"));
        assert_eq!(response.numero.as_deref(), Some("1234"));
        assert_eq!(response.serie.as_deref(), Some("1"));
        assert!(response.situacao.is_none());
    }

    #[test]
    fn test_response_from_flat_body() {
        let body = json!({"id": "abc", "numero": 999999, "situacao": "PENDENTE"});
        let response = InvoiceResponse::from_api_body(&body);

        assert_eq!(response.id.as_deref(), Some("abc"));
        assert_eq!(response.numero.as_deref(), Some("999999"));
        assert_eq!(response.situacao.as_deref(), Some("PENDENTE"));
    }
}
