use std::{net::TcpListener, sync::Arc};

use actix_web::web;
use beacon::{
    configuration::{get_configuration, StorageBackend},
    services::{
        EnrichmentClient, InsightFetcher, JsonFileStore, KeyValueStore, MemoryStore,
        WidgetController,
    },
    startup::run,
};
use env_logger::Env;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().expect("Failed to read configuration.");

    let store: Arc<dyn KeyValueStore> = match configuration.storage.backend {
        StorageBackend::File => Arc::new(JsonFileStore::new(&configuration.storage.path)),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };

    if configuration.enrichment.api_key.is_empty() {
        log::info!("No enrichment API key configured, company lookups will degrade to basic data");
    }

    let enrichment_client = EnrichmentClient::new(
        configuration.enrichment.logo_base_url,
        configuration.enrichment.lookup_base_url,
        configuration.enrichment.api_key,
    );
    let controller = web::Data::new(WidgetController::new(
        store,
        InsightFetcher::new(enrichment_client),
        configuration.application.max_widgets,
    ));

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(address)?;
    log::info!("Listening on {}", listener.local_addr()?);

    run(listener, controller)?.await
}
