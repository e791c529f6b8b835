//! Domain DTOs for the invoices API.
//!
//! # Design
//! These types mirror the backend's JSON schema but are defined
//! independently of the mock-server crate; integration tests catch schema
//! drift between the two. Every optional field accepts both a missing key
//! and an explicit `null`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default lifetime, in seconds, of a signed download or preview URL.
pub const DEFAULT_EXPIRES_IN: u32 = 900;

/// One row of the invoice list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceListItem {
    pub id: String,
    pub filename: Option<String>,
    pub intestatario: Option<String>,
    pub invoice_number: Option<String>,
    pub data_emissione: Option<String>,
    pub totale: Option<f64>,
}

/// A page of invoices plus the window that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceListResponse {
    pub items: Vec<InvoiceListItem>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

/// Signed URL returned by the download and preview endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DownloadUrl {
    pub url: String,
    pub expires_in: u32,
}

/// Where the invoice's original file lives in object storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3Ref {
    pub bucket: String,
    pub key: String,
}

/// Header fields extracted from an invoice document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InvoiceFields {
    pub intestatario: Option<String>,
    pub partita_iva: Option<String>,
    pub codice_fiscale: Option<String>,
    pub invoice_number: Option<String>,
    pub data_emissione: Option<String>,
    pub data_scadenza: Option<String>,
    pub valuta: Option<String>,
    pub imponibile: Option<f64>,
    pub iva: Option<f64>,
    pub totale: Option<f64>,
}

/// A single line item ("riga") of an invoice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InvoiceLine {
    pub descrizione: Option<String>,
    pub qta: Option<f64>,
    pub prezzo_unitario: Option<f64>,
    pub aliquota_iva: Option<f64>,
    pub totale_riga: Option<f64>,
}

/// Full invoice record returned by `GET /api/v1/invoices/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub id: String,
    pub s3: S3Ref,
    pub filename: Option<String>,
    #[serde(default)]
    pub fields: InvoiceFields,
    #[serde(default)]
    pub righe: Vec<InvoiceLine>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Overall backend health plus one entry per checked dependency
/// (`db`, `s3`, `redis` on the real backend).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthReport {
    pub status: HealthStatus,
    #[serde(flatten)]
    pub components: BTreeMap<String, ComponentHealth>,
}

impl HealthReport {
    pub fn is_up(&self) -> bool {
        self.status == HealthStatus::Up
    }
}

/// Sort column accepted by the list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    CreatedAt,
    IssueDate,
    Totale,
    InvoiceNumber,
}

impl OrderBy {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderBy::CreatedAt => "created_at",
            OrderBy::IssueDate => "issue_date",
            OrderBy::Totale => "totale",
            OrderBy::InvoiceNumber => "invoice_number",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}

impl OrderDir {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderDir::Asc => "asc",
            OrderDir::Desc => "desc",
        }
    }
}

/// Query parameters for listing invoices. `None` omits the parameter and
/// leaves the server default in place; `Some(0)` is sent as `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListInvoicesParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    /// Free-text search over filename, holder, invoice number and tax ids.
    pub q: Option<String>,
    /// Inclusive lower bound on the issue date, `YYYY-MM-DD`.
    pub date_from: Option<String>,
    /// Inclusive upper bound on the issue date, `YYYY-MM-DD`.
    pub date_to: Option<String>,
    pub order_by: Option<OrderBy>,
    pub order_dir: Option<OrderDir>,
}

impl ListInvoicesParams {
    pub fn page(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
            ..Self::default()
        }
    }

    /// Query pairs in wire order: `limit`, `offset`, then the filters.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        if let Some(q) = &self.q {
            pairs.push(("q", q.clone()));
        }
        if let Some(date_from) = &self.date_from {
            pairs.push(("date_from", date_from.clone()));
        }
        if let Some(date_to) = &self.date_to {
            pairs.push(("date_to", date_to.clone()));
        }
        if let Some(order_by) = self.order_by {
            pairs.push(("order_by", order_by.as_str().to_string()));
        }
        if let Some(order_dir) = self.order_dir {
            pairs.push(("order_dir", order_dir.as_str().to_string()));
        }
        pairs
    }
}
