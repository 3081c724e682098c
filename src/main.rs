use std::sync::Arc;

use anyhow::Context;
use livraria_kernel::settings::Settings;
use livraria_kernel::{InitCtx, ModuleRegistry};
use livraria_store::{MemoryStore, MongoStore, StoreBackend};

use livraria_app::modules;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load Livraria settings")?;

    livraria_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.endpoint,
        "livraria-app bootstrap starting"
    );

    let store = build_store(&settings).await?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store.clone(), &settings);

    let ctx = InitCtx {
        settings: &settings,
        store: &store,
    };
    registry.init_core_modules(&ctx).await?;
    registry.init_custom_modules(&ctx).await?;
    registry.start_core_modules(&ctx).await?;
    registry.start_custom_modules(&ctx).await?;

    tracing::info!("livraria-app bootstrap complete");

    livraria_http::start_server(&registry, &settings).await?;

    registry.stop_custom_modules().await?;
    registry.stop_core_modules().await?;

    Ok(())
}

/// Open the document store handle shared by every request handler.
async fn build_store(settings: &Settings) -> anyhow::Result<Arc<dyn StoreBackend>> {
    if settings.database.endpoint == "memory" {
        tracing::info!("using in-memory document store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = MongoStore::connect(&settings.database.endpoint, &settings.database.database)
        .await
        .with_context(|| {
            format!(
                "failed to connect to document store at {}",
                settings.database.endpoint
            )
        })?;
    Ok(Arc::new(store))
}
