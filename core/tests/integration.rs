//! End-to-end checks against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port, then drives
//! `InvoiceApi` over real HTTP with the bundled `ureq` transport. Validates
//! that request building, transport and response parsing agree with the
//! server's schema.

use invoices_core::{ApiError, InvoiceApi, ListInvoicesParams, OrderBy, OrderDir};
use mock_server::{demo_invoices, StoredInvoice};

/// Serve `invoices` on a random local port and return the base URL.
fn start_server(invoices: Vec<StoredInvoice>) -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::serve(listener, mock_server::app_with(invoices)).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn list_and_download_lifecycle() {
    let invoices = demo_invoices();
    let newest = invoices[2].clone();
    let api = InvoiceApi::with_base_url(&start_server(invoices)).unwrap();

    // Step 1: list with server defaults.
    let page = api.list_invoices(&ListInvoicesParams::default()).unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.limit, 50);
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.items[0].id, newest.id.to_string(), "newest first");

    // Step 2: explicit window.
    let page = api.list_invoices(&ListInvoicesParams::page(2, 0)).unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 3);
    assert_eq!(page.offset, 0);

    // Step 3: second page.
    let page = api.list_invoices(&ListInvoicesParams::page(2, 2)).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.offset, 2);

    // Step 4: detail of the newest invoice.
    let id = newest.id.to_string();
    let invoice = api.get_invoice(&id).unwrap();
    assert_eq!(invoice.s3.key, newest.s3.key);
    assert_eq!(invoice.fields.intestatario.as_deref(), Some("Verdi & Figli"));

    // Step 5: signed download URL with the default expiry.
    let url = api.download_url(&id).unwrap();
    assert_eq!(
        url,
        format!("http://localhost:9000/ai-agent-dev/{}?exp=900", newest.s3.key)
    );

    // Step 6: custom expiry and inline preview.
    let url = api.download_url_expiring(&id, 3600).unwrap();
    assert!(url.ends_with("?exp=3600"), "{url}");
    let url = api.preview_url(&id, 120).unwrap();
    assert!(url.ends_with("?exp=120&disposition=inline"), "{url}");
}

#[test]
fn filters_reach_the_server() {
    let api = InvoiceApi::with_base_url(&start_server(demo_invoices())).unwrap();

    let params = ListInvoicesParams {
        q: Some("s.p.a".to_string()),
        ..ListInvoicesParams::default()
    };
    let page = api.list_invoices(&params).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].intestatario.as_deref(), Some("Bianchi S.p.A."));

    let params = ListInvoicesParams {
        date_to: Some("2024-02-03".to_string()),
        order_by: Some(OrderBy::Totale),
        order_dir: Some(OrderDir::Asc),
        ..ListInvoicesParams::default()
    };
    let page = api.list_invoices(&params).unwrap();
    let numbers: Vec<_> = page
        .items
        .iter()
        .map(|item| item.invoice_number.clone().unwrap())
        .collect();
    assert_eq!(numbers, vec!["2024/002", "2024/001"]);
}

#[test]
fn missing_invoice_is_not_found() {
    let api = InvoiceApi::with_base_url(&start_server(demo_invoices())).unwrap();

    let err = api
        .download_url("00000000-0000-0000-0000-000000000000")
        .unwrap_err();
    assert!(err.is_not_found());
    let message = err.to_string();
    assert!(message.contains("404"), "{message}");
    assert!(message.contains("not found"), "{message}");
    assert!(message.contains("Not Found"), "{message}");
}

#[test]
fn server_validation_errors_surface_as_http_errors() {
    let api = InvoiceApi::with_base_url(&start_server(demo_invoices())).unwrap();

    // The backend requires limit >= 1, and `Some(0)` is sent as-is.
    let err = api.list_invoices(&ListInvoicesParams::page(0, 0)).unwrap_err();
    assert!(
        matches!(err, ApiError::Http { status: 422, ref body, .. } if body.contains("limit")),
        "{err}"
    );

    let err = api.download_url("abc").unwrap_err();
    assert_eq!(err.status(), Some(422));
}

#[test]
fn trailing_slash_in_base_url() {
    let base = start_server(demo_invoices());
    let api = InvoiceApi::with_base_url(&format!("{base}/")).unwrap();
    assert_eq!(api.client().base_url(), base);

    let page = api.list_invoices(&ListInvoicesParams::default()).unwrap();
    assert_eq!(page.total, 3);
}

#[test]
fn health_reports_components() {
    let api = InvoiceApi::with_base_url(&start_server(Vec::new())).unwrap();

    let report = api.health().unwrap();
    assert!(report.is_up());
    assert!(report.components.contains_key("db"));
    assert_eq!(
        report.components["s3"].endpoint.as_deref(),
        Some("http://localhost:9000")
    );
}

#[test]
fn unreachable_server_is_a_transport_error() {
    // Bind then drop, so nothing is listening on the port.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let api = InvoiceApi::with_base_url(&format!("http://{addr}")).unwrap();

    let err = api.health().unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err}");
}
