//! Executing facade over `InvoiceClient`.
//!
//! Every operation runs the same three steps: build the request, hand it to
//! the transport, parse the response. `send` is the shared helper; it is the
//! only place requests and HTTP failures are logged.

use tracing::{debug, warn};

use crate::client::{check_window, InvoiceClient};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{HealthReport, Invoice, InvoiceListResponse, ListInvoicesParams, DEFAULT_EXPIRES_IN};

/// Invoices API client that performs its own I/O.
#[derive(Debug, Clone)]
pub struct InvoiceApi<T = UreqTransport> {
    client: InvoiceClient,
    transport: T,
}

impl InvoiceApi<UreqTransport> {
    /// Client bound to `INVOICES_API_BASE_URL` (or the local default) over a
    /// fresh `ureq` agent.
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self::new(InvoiceClient::from_env()?, UreqTransport::new()))
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self::new(InvoiceClient::new(base_url)?, UreqTransport::new()))
    }
}

impl<T: Transport> InvoiceApi<T> {
    pub fn new(client: InvoiceClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &InvoiceClient {
        &self.client
    }

    /// List invoices. When `params.limit` is set, a page holding more items
    /// than requested is rejected even if it matches the server's own limit.
    pub fn list_invoices(&self, params: &ListInvoicesParams) -> Result<InvoiceListResponse, ApiError> {
        let response = self.send(self.client.build_list_invoices(params))?;
        let page = self.client.parse_list_invoices(response)?;
        if let Some(limit) = params.limit {
            check_window(&page, limit)?;
        }
        Ok(page)
    }

    pub fn get_invoice(&self, id: &str) -> Result<Invoice, ApiError> {
        let response = self.send(self.client.build_get_invoice(id)?)?;
        self.client.parse_get_invoice(response)
    }

    /// Signed download URL valid for `DEFAULT_EXPIRES_IN` seconds.
    pub fn download_url(&self, id: &str) -> Result<String, ApiError> {
        self.download_url_expiring(id, DEFAULT_EXPIRES_IN)
    }

    pub fn download_url_expiring(&self, id: &str, expires_in: u32) -> Result<String, ApiError> {
        let response = self.send(self.client.build_download_url(id, expires_in)?)?;
        self.client.parse_download_url(response)
    }

    /// Signed URL that serves the file inline, for in-browser preview.
    pub fn preview_url(&self, id: &str, expires_in: u32) -> Result<String, ApiError> {
        let response = self.send(self.client.build_preview_url(id, expires_in)?)?;
        self.client.parse_preview_url(response)
    }

    pub fn health(&self) -> Result<HealthReport, ApiError> {
        let response = self.send(self.client.build_health())?;
        self.client.parse_health(response)
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.transport.execute(request)?;
        if response.is_success() {
            debug!(status = response.status, "received response");
        } else {
            warn!(
                status = response.status,
                body_len = response.body.len(),
                "request failed"
            );
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Replies with a canned response and remembers every request.
    struct StubTransport {
        status: u16,
        body: String,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl StubTransport {
        fn new(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn urls(&self) -> Vec<String> {
            self.seen.lock().unwrap().iter().map(|r| r.url.clone()).collect()
        }
    }

    impl Transport for StubTransport {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.lock().unwrap().push(request);
            Ok(HttpResponse {
                status: self.status,
                status_text: if self.status == 404 { "Not Found" } else { "OK" }.to_string(),
                headers: Vec::new(),
                body: self.body.clone(),
            })
        }
    }

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, ApiError> {
            Err(ApiError::Transport("connection refused".to_string()))
        }
    }

    fn api<T: Transport>(transport: T) -> InvoiceApi<T> {
        InvoiceApi::new(InvoiceClient::new("http://localhost:8000").unwrap(), transport)
    }

    #[test]
    fn download_url_requests_default_expiry_and_returns_url() {
        let stub = StubTransport::new(200, r#"{"url":"https://files/abc?sig=x","expires_in":900}"#);
        let url = api(&stub).download_url("abc").unwrap();
        assert_eq!(url, "https://files/abc?sig=x");
        assert_eq!(
            stub.urls(),
            vec!["http://localhost:8000/api/v1/invoices/abc/download?expires_in=900"]
        );
    }

    #[test]
    fn list_invoices_enforces_requested_limit() {
        let stub = StubTransport::new(
            200,
            r#"{"items":[{"id":"1"},{"id":"2"}],"total":2,"limit":50,"offset":0}"#,
        );
        let params = ListInvoicesParams::page(1, 0);
        let err = api(&stub).list_invoices(&params).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn list_invoices_without_params_sends_bare_path() {
        let stub = StubTransport::new(200, r#"{"items":[],"total":0,"limit":50,"offset":0}"#);
        let page = api(&stub).list_invoices(&ListInvoicesParams::default()).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(stub.urls(), vec!["http://localhost:8000/api/v1/invoices"]);
    }

    #[test]
    fn http_failure_surfaces_status_and_body() {
        let stub = StubTransport::new(404, "not found");
        let err = api(&stub).get_invoice("missing").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "HTTP 404 Not Found - not found");
    }

    #[test]
    fn dot_segment_id_never_reaches_transport() {
        let stub = StubTransport::new(200, r#"{"url":"u","expires_in":900}"#);
        let err = api(&stub).download_url("..").unwrap_err();
        assert!(matches!(err, ApiError::InvalidId(_)));
        assert!(stub.urls().is_empty());
    }

    #[test]
    fn transport_failure_propagates() {
        let err = api(FailingTransport).health().unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[test]
    fn every_request_carries_json_content_type() {
        let stub = StubTransport::new(200, r#"{"url":"u","expires_in":60}"#);
        api(&stub).preview_url("abc", 60).unwrap();
        let seen = stub.seen.lock().unwrap();
        assert_eq!(seen[0].header("content-type"), Some("application/json"));
    }
}
