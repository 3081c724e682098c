pub mod livros;

use std::sync::Arc;

use livraria_kernel::settings::Settings;
use livraria_kernel::ModuleRegistry;
use livraria_store::StoreBackend;

/// Register all application modules with the registry.
pub fn register_all(
    registry: &mut ModuleRegistry,
    store: Arc<dyn StoreBackend>,
    settings: &Settings,
) {
    registry.register_custom(livros::create_module(store, settings.report.clone()));
}
