use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Supplier name used when the source row has none
pub const SUPPLIER_NOT_INFORMED: &str = "Fornecedor Não Informado";

/// Document type used when the source row has none
pub const DOCUMENT_TYPE_NOT_INFORMED: &str = "Não Informado";

/// Lifecycle state of a payable, derived from the raw status text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayableStatus {
    /// Not fully paid yet (`aberto`)
    Open,
    /// Fully paid, carries a settlement date (`quitado`)
    Settled,
    /// Any other status text found in the source
    Other,
}

impl PayableStatus {
    /// Case-insensitive match against both the Portuguese source terms and
    /// their English equivalents.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "aberto" | "open" => Self::Open,
            "quitado" | "settled" => Self::Settled,
            _ => Self::Other,
        }
    }
}

/// One row of the accounts-payable table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayableRecord {
    pub supplier: String,
    pub document_number: String,
    /// Part of `document_number` before the first `/`; groups installments
    /// of the same original document
    pub document_base_number: String,
    pub document_type: String,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub settlement_date: Option<NaiveDate>,
    pub document_value: f64,
    pub discount_value: f64,
    pub balance_value: f64,
    /// Raw status text as it appears in the source
    pub status: String,
}

impl PayableRecord {
    pub fn status_kind(&self) -> PayableStatus {
        PayableStatus::from_raw(&self.status)
    }

    pub fn is_open(&self) -> bool {
        self.status_kind() == PayableStatus::Open
    }

    pub fn is_settled(&self) -> bool {
        self.status_kind() == PayableStatus::Settled
    }

    /// Amount actually paid: document value minus discount
    pub fn net_paid_value(&self) -> f64 {
        self.document_value - self.discount_value
    }
}

/// "123/2" -> "123", "456" -> "456"
pub fn document_base_number(document_number: &str) -> String {
    match document_number.split_once('/') {
        Some((base, _)) => base.to_string(),
        None => document_number.to_string(),
    }
}
