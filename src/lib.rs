//! Bookshelf application library
//!
//! Books and users modules plus the wiring that turns settings into a
//! running server.

use anyhow::Context;
use axum::Router;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub mod modules;
pub mod utils;

pub use modules::{register_all, Services};

/// Registry with every module registered against `services`.
pub fn build_registry(services: &Services, settings: &Settings) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    register_all(&mut registry, services, settings)?;
    Ok(registry)
}

/// The full HTTP application: module routes behind Basic auth, health check,
/// API docs, and the global middleware stack.
pub fn build_app(services: &Services, settings: &Settings) -> anyhow::Result<Router> {
    let registry = build_registry(services, settings)?;
    Ok(bookshelf_http::build_router(
        &registry,
        settings,
        services.auth_guard(),
    ))
}

/// Initialize telemetry and storage, run the module lifecycle, and serve
/// until shutdown.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    bookshelf_telemetry::init(&settings.telemetry)
        .with_context(|| "failed to initialize telemetry")?;
    bookshelf_db::init();

    tracing::info!(
        env = ?settings.environment,
        catalog = %settings.catalog.base_url,
        "bookshelf bootstrap starting"
    );

    let services = Services::in_memory(&settings);
    let registry = build_registry(&services, &settings)?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;
    tracing::info!(modules = registry.len(), "bookshelf bootstrap complete");

    let served =
        bookshelf_http::start_server(&registry, &settings, services.auth_guard()).await;

    registry.stop_modules().await?;
    served
}
