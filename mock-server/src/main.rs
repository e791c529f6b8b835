use mock_server::{demo_invoices, router, AppState, DEFAULT_STORAGE_ORIGIN};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let storage_origin =
        std::env::var("MOCK_STORAGE_ORIGIN").unwrap_or_else(|_| DEFAULT_STORAGE_ORIGIN.to_string());
    let addr = format!("127.0.0.1:{port}");

    let invoices = demo_invoices();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, invoices = invoices.len(), %storage_origin, "listening");
    mock_server::serve(listener, router(AppState::new(invoices, &storage_origin))).await
}
