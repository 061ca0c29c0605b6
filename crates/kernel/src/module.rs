use async_trait::async_trait;
use axum::Router;

use crate::settings::Settings;

/// What a module sees while the registry runs its lifecycle hooks.
pub struct InitCtx<'a> {
    pub settings: &'a Settings,
}

/// A feature area mounted under `/api/{name}`.
///
/// The registry calls [`Module::init`] on every module, then
/// [`Module::start`] on every module, and [`Module::stop`] in reverse
/// registration order once the server has drained.
#[async_trait]
pub trait Module: Sync + Send {
    /// Path segment and registry key; must be unique.
    fn name(&self) -> &'static str;

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Routes relative to the module's mount point.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment with `paths` relative to the mount point and any
    /// `components.schemas` the paths reference.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
