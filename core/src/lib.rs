//! Typed client for the invoices backend.
//!
//! # Overview
//! Lists invoices and fetches signed download URLs from the invoices REST
//! API. `InvoiceClient` builds `HttpRequest` values and parses
//! `HttpResponse` values without touching the network (host-does-IO
//! pattern); `InvoiceApi` pairs it with a `Transport` for callers that just
//! want a blocking call.
//!
//! # Design
//! - `InvoiceClient` is stateless; it holds only the base URL.
//! - Each operation is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit and the core is testable without a server.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.
//! - No retries, caching or authentication.
//!
//! ```no_run
//! use invoices_core::{InvoiceApi, ListInvoicesParams};
//!
//! let api = InvoiceApi::from_env()?;
//! let page = api.list_invoices(&ListInvoicesParams::page(10, 0))?;
//! if let Some(first) = page.items.first() {
//!     println!("{}", api.download_url(&first.id)?);
//! }
//! # Ok::<(), invoices_core::ApiError>(())
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use api::InvoiceApi;
pub use client::InvoiceClient;
pub use config::{ClientConfig, BASE_URL_ENV, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{
    ComponentHealth, DownloadUrl, HealthReport, HealthStatus, Invoice, InvoiceFields, InvoiceLine,
    InvoiceListItem, InvoiceListResponse, ListInvoicesParams, OrderBy, OrderDir, S3Ref,
    DEFAULT_EXPIRES_IN,
};
