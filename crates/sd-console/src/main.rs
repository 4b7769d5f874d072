mod config;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use cloud_api::{ApiClient, MockSource};
use sd_catalog::{CatalogService, WizardState};
use sd_store::models::ServerStatus;
use sd_store::{KeyValueStore, MemoryStore, ResourceStorage};

use crate::config::AppConfig;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    // Stores: session-scoped for collections, persistent for mode/token.
    let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let persistent: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let storage = ResourceStorage::new(Arc::clone(&session), Arc::clone(&persistent));

    if let Some(token) = &config.api_token {
        storage.set_token(token);
    }

    // Data sources, one per mode.
    let mock = Arc::new(MockSource::new(&config.mock_data_dir));
    let live = Arc::new(ApiClient::new(config.api_base_url.as_str(), storage.token()));

    let mut catalog = CatalogService::new(storage, mock, live, config.server_type_fallback);
    tracing::info!(mode = %catalog.mode(), "catalog ready");

    catalog.load_all().await;
    if let Some(error) = catalog.error() {
        tracing::warn!(error, "catalog loaded with errors");
    }
    tracing::info!(
        servers = catalog.servers.len(),
        templates = catalog.templates.len(),
        locations = catalog.collections.locations.len(),
        images = catalog.collections.images.len(),
        "catalog loaded"
    );

    // Walk the creation wizard the way the UI would.
    let mut wizard = WizardState::new(Arc::clone(&session));
    wizard.select_architecture("shared");
    if let Some(template) = catalog.templates.first() {
        wizard.select_server_type(template.server_type.name.clone());
    }
    if let Some(location) = catalog.collections.locations.first() {
        wizard.select_location(location.name.clone());
    }
    if let Some(image) = catalog.collections.images.first() {
        wizard.select_image(image.name.clone());
    }
    wizard.set_name("web-01");

    if !wizard.can_create() {
        tracing::warn!("wizard incomplete, nothing to create");
        return;
    }

    let type_name = wizard.server_type.clone().unwrap_or_default();
    let estimate = sd_catalog::monthly_price(
        &catalog.collections.server_types,
        &type_name,
        wizard.location.as_deref().unwrap_or_default(),
        wizard.backups_enabled,
    );
    tracing::info!(server_type = %type_name, price = ?estimate, "creating server");

    let Some(server) = catalog.create_server_from_type(
        &type_name,
        Some(&wizard.name),
        &wizard.create_config(),
    ) else {
        tracing::warn!("creation restricted in the active mode");
        return;
    };
    wizard.reset();

    tracing::info!(
        server_id = server.id,
        name = %server.name,
        ipv4 = ?server.public_net.ipv4.as_ref().map(|v4| &v4.ip),
        price = ?server.price_monthly,
        "server created"
    );

    catalog.update_server_status(server.id, ServerStatus::Stopped);

    for server in catalog.my_servers() {
        tracing::info!(
            server_id = server.id,
            name = %server.name,
            status = ?server.status,
            "inventory"
        );
    }
}
