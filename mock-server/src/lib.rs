use std::{cmp::Ordering, sync::Arc};

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_STORAGE_ORIGIN: &str = "http://localhost:9000";
pub const DEFAULT_BUCKET: &str = "ai-agent-dev";

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 200;
const DEFAULT_EXPIRES_IN: u32 = 900;
const MIN_EXPIRES_IN: u32 = 60;
const MAX_EXPIRES_IN: u32 = 86_400;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Ref {
    pub bucket: String,
    pub key: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
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

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub descrizione: Option<String>,
    pub qta: Option<f64>,
    pub prezzo_unitario: Option<f64>,
    pub aliquota_iva: Option<f64>,
    pub totale_riga: Option<f64>,
}

/// A row of the in-memory store. `created_at` is a monotonically increasing
/// sequence number standing in for the insertion timestamp.
#[derive(Clone, Debug)]
pub struct StoredInvoice {
    pub id: Uuid,
    pub filename: Option<String>,
    pub s3: S3Ref,
    pub fields: InvoiceFields,
    pub righe: Vec<InvoiceLine>,
    pub created_at: u64,
}

impl StoredInvoice {
    pub fn new(created_at: u64, filename: &str, fields: InvoiceFields) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            filename: Some(filename.to_string()),
            s3: S3Ref {
                bucket: DEFAULT_BUCKET.to_string(),
                key: format!("invoices/{id}_{filename}"),
            },
            fields,
            righe: Vec::new(),
            created_at,
        }
    }

    fn to_list_item(&self) -> InvoiceListItem {
        InvoiceListItem {
            id: self.id,
            filename: self.filename.clone(),
            intestatario: self.fields.intestatario.clone(),
            invoice_number: self.fields.invoice_number.clone(),
            data_emissione: self.fields.data_emissione.clone(),
            totale: self.fields.totale,
        }
    }

    fn to_out(&self) -> InvoiceOut {
        InvoiceOut {
            id: self.id,
            s3: self.s3.clone(),
            filename: self.filename.clone(),
            fields: self.fields.clone(),
            righe: self.righe.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvoiceOut {
    pub id: Uuid,
    pub s3: S3Ref,
    pub filename: Option<String>,
    pub fields: InvoiceFields,
    pub righe: Vec<InvoiceLine>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvoiceListItem {
    pub id: Uuid,
    pub filename: Option<String>,
    pub intestatario: Option<String>,
    pub invoice_number: Option<String>,
    pub data_emissione: Option<String>,
    pub totale: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvoiceListResponse {
    pub items: Vec<InvoiceListItem>,
    pub total: usize,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PresignedUrlOut {
    pub url: String,
    pub expires_in: u32,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub q: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub order_by: Option<String>,
    pub order_dir: Option<String>,
}

#[derive(Deserialize)]
pub struct ExpiryQuery {
    pub expires_in: Option<u32>,
}

pub type Db = Arc<RwLock<Vec<StoredInvoice>>>;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    /// Origin the fake signed URLs point at.
    pub storage_origin: Arc<str>,
}

impl AppState {
    pub fn new(invoices: Vec<StoredInvoice>, storage_origin: &str) -> Self {
        Self {
            db: Arc::new(RwLock::new(invoices)),
            storage_origin: storage_origin.trim_end_matches('/').into(),
        }
    }
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;

fn detail(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": message })))
}

pub fn app() -> Router {
    app_with(Vec::new())
}

pub fn app_with(invoices: Vec<StoredInvoice>) -> Router {
    router(AppState::new(invoices, DEFAULT_STORAGE_ORIGIN))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/invoices", get(list_invoices))
        .route("/api/v1/invoices/{id}", get(get_invoice))
        .route("/api/v1/invoices/{id}/download", get(download_invoice))
        .route("/api/v1/invoices/{id}/preview", get(preview_invoice))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}

/// A handful of invoices for running the server by hand.
pub fn demo_invoices() -> Vec<StoredInvoice> {
    let fields = |holder: &str, number: &str, date: &str, imponibile: f64, iva: f64| InvoiceFields {
        intestatario: Some(holder.to_string()),
        invoice_number: Some(number.to_string()),
        data_emissione: Some(date.to_string()),
        valuta: Some("EUR".to_string()),
        imponibile: Some(imponibile),
        iva: Some(iva),
        totale: Some(imponibile + iva),
        ..InvoiceFields::default()
    };
    vec![
        StoredInvoice::new(1, "fattura_001.xml", fields("Rossi S.r.l.", "2024/001", "2024-01-15", 1000.0, 220.0)),
        StoredInvoice::new(2, "fattura_002.pdf", fields("Bianchi S.p.A.", "2024/002", "2024-02-03", 250.0, 55.0)),
        StoredInvoice::new(3, "fattura_003.pdf", fields("Verdi & Figli", "2024/003", "2024-03-20", 80.0, 17.6)),
    ]
}

/// Same shape as the real backend: an overall status plus one object per
/// dependency. The store is in memory, so every check is up.
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "up",
        "db": { "status": "up" },
        "s3": { "status": "up", "endpoint": &*state.storage_origin },
    }))
}

async fn list_invoices(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<InvoiceListResponse> {
    let query = parse_query(query)?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(detail(
            StatusCode::UNPROCESSABLE_ENTITY,
            &format!("limit must be between 1 and {MAX_LIMIT}"),
        ));
    }
    let offset = query.offset.unwrap_or(0);

    let invoices = state.db.read().await;
    let mut matching: Vec<&StoredInvoice> = invoices.iter().filter(|inv| matches_query(inv, &query)).collect();
    let key = SortKey::parse(query.order_by.as_deref());
    let ascending = query
        .order_dir
        .as_deref()
        .is_some_and(|dir| dir.eq_ignore_ascii_case("asc"));
    matching.sort_by(|a, b| {
        let primary = key.compare(a, b);
        let primary = if ascending { primary } else { primary.reverse() };
        primary.then_with(|| b.created_at.cmp(&a.created_at))
    });

    let total = matching.len();
    let items: Vec<InvoiceListItem> = matching
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .map(StoredInvoice::to_list_item)
        .collect();
    debug!(total, returned = items.len(), limit, offset, "listed invoices");

    Ok(Json(InvoiceListResponse {
        items,
        total,
        limit,
        offset,
    }))
}

async fn get_invoice(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<InvoiceOut> {
    let id = parse_id(&id)?;
    let invoices = state.db.read().await;
    let invoice = invoices
        .iter()
        .find(|inv| inv.id == id)
        .ok_or_else(|| detail(StatusCode::NOT_FOUND, "Invoice not found"))?;
    Ok(Json(invoice.to_out()))
}

async fn download_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<ExpiryQuery>, QueryRejection>,
) -> ApiResult<PresignedUrlOut> {
    let id = parse_id(&id)?;
    let expires_in = parse_expiry(parse_query(query)?.expires_in)?;
    let invoices = state.db.read().await;
    let invoice = invoices
        .iter()
        .find(|inv| inv.id == id)
        .ok_or_else(|| detail(StatusCode::NOT_FOUND, "Invoice not found"))?;
    Ok(Json(PresignedUrlOut {
        url: signed_url(&state.storage_origin, &invoice.s3, expires_in, false),
        expires_in,
    }))
}

async fn preview_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<ExpiryQuery>, QueryRejection>,
) -> ApiResult<PresignedUrlOut> {
    let id = parse_id(&id)?;
    let expires_in = parse_expiry(parse_query(query)?.expires_in)?;
    let invoices = state.db.read().await;
    let invoice = invoices
        .iter()
        .find(|inv| inv.id == id)
        .ok_or_else(|| detail(StatusCode::NOT_FOUND, "Unable to find invoice"))?;
    Ok(Json(PresignedUrlOut {
        url: signed_url(&state.storage_origin, &invoice.s3, expires_in, true),
        expires_in,
    }))
}

/// Malformed query strings get the backend's 422 instead of axum's 400.
fn parse_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, (StatusCode, Json<Value>)> {
    query
        .map(|Query(query)| query)
        .map_err(|rejection| detail(StatusCode::UNPROCESSABLE_ENTITY, &rejection.body_text()))
}

fn parse_id(raw: &str) -> Result<Uuid, (StatusCode, Json<Value>)> {
    raw.parse()
        .map_err(|_| detail(StatusCode::UNPROCESSABLE_ENTITY, "invoice id must be a UUID"))
}

fn parse_expiry(raw: Option<u32>) -> Result<u32, (StatusCode, Json<Value>)> {
    let expires_in = raw.unwrap_or(DEFAULT_EXPIRES_IN);
    if !(MIN_EXPIRES_IN..=MAX_EXPIRES_IN).contains(&expires_in) {
        return Err(detail(
            StatusCode::UNPROCESSABLE_ENTITY,
            &format!("expires_in must be between {MIN_EXPIRES_IN} and {MAX_EXPIRES_IN}"),
        ));
    }
    Ok(expires_in)
}

fn signed_url(origin: &str, s3: &S3Ref, expires_in: u32, inline: bool) -> String {
    let mut url = format!("{origin}/{}/{}?exp={expires_in}", s3.bucket, s3.key);
    if inline {
        url.push_str("&disposition=inline");
    }
    url
}

fn matches_query(invoice: &StoredInvoice, query: &ListQuery) -> bool {
    let fields = &invoice.fields;
    if let Some(needle) = query.q.as_deref().filter(|q| !q.is_empty()) {
        let needle = needle.to_lowercase();
        let hit = [
            invoice.filename.as_deref(),
            fields.invoice_number.as_deref(),
            fields.intestatario.as_deref(),
            fields.partita_iva.as_deref(),
            fields.codice_fiscale.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|haystack| haystack.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }
    let issued = fields.data_emissione.as_deref();
    if let Some(from) = query.date_from.as_deref().filter(|d| !d.is_empty()) {
        if !issued.is_some_and(|date| date >= from) {
            return false;
        }
    }
    if let Some(to) = query.date_to.as_deref().filter(|d| !d.is_empty()) {
        if !issued.is_some_and(|date| date <= to) {
            return false;
        }
    }
    true
}

#[derive(Clone, Copy)]
enum SortKey {
    CreatedAt,
    IssueDate,
    Totale,
    InvoiceNumber,
}

impl SortKey {
    /// Unknown columns fall back to `created_at`.
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::to_lowercase).as_deref() {
            Some("issue_date") => SortKey::IssueDate,
            Some("totale") => SortKey::Totale,
            Some("invoice_number") => SortKey::InvoiceNumber,
            _ => SortKey::CreatedAt,
        }
    }

    /// Ascending comparison with missing values after present ones.
    fn compare(self, a: &StoredInvoice, b: &StoredInvoice) -> Ordering {
        match self {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::IssueDate => nulls_last(&a.fields.data_emissione, &b.fields.data_emissione, Ord::cmp),
            SortKey::Totale => nulls_last(&a.fields.totale, &b.fields.totale, f64::total_cmp),
            SortKey::InvoiceNumber => {
                nulls_last(&a.fields.invoice_number, &b.fields.invoice_number, Ord::cmp)
            }
        }
    }
}

fn nulls_last<T>(a: &Option<T>, b: &Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
