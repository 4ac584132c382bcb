// Library Management System - Web Server
// REST API with Axum over an in-memory store

use anyhow::{Context, Result};
use library_management::api::{router, AppState};
use library_management::{import_catalog, load_catalog_csv, sample_library, LibraryStore, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!(version = library_management::VERSION, "📚 Library Management System - Web Server");

    // Build the store
    let mut store = if config.seed_sample_data {
        let store = sample_library().context("Failed to build sample library")?;
        info!(
            members = store.all_members().len(),
            books = store.all_books().len(),
            "✓ Sample data loaded"
        );
        store
    } else {
        LibraryStore::new()
    };

    if let Some(csv_path) = &config.catalog_csv {
        let books = load_catalog_csv(csv_path)?;
        let summary = import_catalog(&mut store, books)?;
        info!(
            path = %csv_path.display(),
            inserted = summary.inserted,
            skipped = summary.skipped,
            "✓ Catalog imported"
        );
    }

    let app = router(AppState::new(store));

    // Start server
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("🚀 Server running on http://{}", addr);
    info!("   API: http://{}/api/members", addr);

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
