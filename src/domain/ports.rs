use crate::domain::model::ServerBuild;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Something a build pipeline calls after each successful build-and-load cycle.
#[async_trait]
pub trait DevNotifier: Send + Sync {
    /// Tells the dev server about `build` and waits until the notification was sent.
    async fn notify(&self, build: &ServerBuild) -> Result<()>;
}
