//! Stateless HTTP request builder and response parser for the invoices API.
//!
//! # Design
//! `InvoiceClient` holds only the base URL and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. Whoever executes the round-trip in between (`InvoiceApi`
//! or the host) owns the I/O, keeping this type deterministic.

use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{DownloadUrl, HealthReport, Invoice, InvoiceListResponse, ListInvoicesParams};

const API_PREFIX: [&str; 2] = ["api", "v1"];

/// Synchronous, stateless client for the invoices API.
#[derive(Debug, Clone)]
pub struct InvoiceClient {
    base_url: Url,
}

impl InvoiceClient {
    /// Bind the client to `base_url`. Trailing slashes are ignored; query and
    /// fragment are dropped.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let mut url =
            Url::parse(trimmed).map_err(|e| ApiError::InvalidBaseUrl(format!("{trimmed}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(trimmed.to_string()));
        }
        url.set_query(None);
        url.set_fragment(None);
        Ok(Self { base_url: url })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url)
    }

    /// Bind the client to `INVOICES_API_BASE_URL`, or the local default.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_config(&ClientConfig::from_env())
    }

    /// The origin every request is sent to, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn build_list_invoices(&self, params: &ListInvoicesParams) -> HttpRequest {
        let mut url = self.endpoint(&["invoices"]);
        let pairs = params.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        HttpRequest::get(url.into())
    }

    pub fn build_get_invoice(&self, id: &str) -> Result<HttpRequest, ApiError> {
        let id = invoice_segment(id)?;
        Ok(HttpRequest::get(self.endpoint(&["invoices", id]).into()))
    }

    pub fn build_download_url(&self, id: &str, expires_in: u32) -> Result<HttpRequest, ApiError> {
        self.build_signed_url(id, "download", expires_in)
    }

    pub fn build_preview_url(&self, id: &str, expires_in: u32) -> Result<HttpRequest, ApiError> {
        self.build_signed_url(id, "preview", expires_in)
    }

    pub fn build_health(&self) -> HttpRequest {
        HttpRequest::get(self.endpoint(&["health"]).into())
    }

    pub fn parse_list_invoices(&self, response: HttpResponse) -> Result<InvoiceListResponse, ApiError> {
        let page: InvoiceListResponse = parse_json(response)?;
        check_window(&page, page.limit)?;
        Ok(page)
    }

    pub fn parse_get_invoice(&self, response: HttpResponse) -> Result<Invoice, ApiError> {
        parse_json(response)
    }

    /// Returns only the signed URL; the echoed `expires_in` is dropped.
    pub fn parse_download_url(&self, response: HttpResponse) -> Result<String, ApiError> {
        let signed: DownloadUrl = parse_json(response)?;
        Ok(signed.url)
    }

    pub fn parse_preview_url(&self, response: HttpResponse) -> Result<String, ApiError> {
        let signed: DownloadUrl = parse_json(response)?;
        Ok(signed.url)
    }

    pub fn parse_health(&self, response: HttpResponse) -> Result<HealthReport, ApiError> {
        parse_json(response)
    }

    fn build_signed_url(&self, id: &str, action: &str, expires_in: u32) -> Result<HttpRequest, ApiError> {
        let id = invoice_segment(id)?;
        let mut url = self.endpoint(&["invoices", id, action]);
        url.query_pairs_mut()
            .append_pair("expires_in", &expires_in.to_string());
        Ok(HttpRequest::get(url.into()))
    }

    /// `/api/v1/{segments..}` under the base URL. Each segment is
    /// percent-encoded; dot segments are filtered out by `invoice_segment`
    /// first, since URL parsing resolves them even when encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(API_PREFIX).extend(segments);
        }
        url
    }
}

/// An invoice id usable as one path segment. Empty ids and the dot
/// segments `.` and `..` would address a different endpoint.
fn invoice_segment(id: &str) -> Result<&str, ApiError> {
    match id {
        "" | "." | ".." => Err(ApiError::InvalidId(id.to_string())),
        _ => Ok(id),
    }
}

/// Fail with `ApiError::InvalidResponse` when a page holds more items than
/// `limit` allows.
pub(crate) fn check_window(page: &InvoiceListResponse, limit: u32) -> Result<(), ApiError> {
    if page.items.len() > limit as usize {
        return Err(ApiError::InvalidResponse(format!(
            "{} items exceed limit {limit}",
            page.items.len()
        )));
    }
    Ok(())
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    let body = success_body(response)?;
    Ok(serde_json::from_str(&body)?)
}

/// Map non-2xx responses to `ApiError::Http`, moving the body into the error.
fn success_body(response: HttpResponse) -> Result<String, ApiError> {
    if response.is_success() {
        return Ok(response.body);
    }
    Err(ApiError::Http {
        status: response.status,
        status_text: response.status_text,
        body: response.body,
    })
}
