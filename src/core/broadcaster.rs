use crate::config::{ping_url, DevConfig};
use crate::core::{DevNotifier, PingPayload, ServerBuild};
use crate::utils::error::{DevReadyError, Result};
use async_trait::async_trait;
use reqwest::Client;
use tokio::task::JoinHandle;

/// Tells the dev server that a freshly built server bundle has been loaded.
///
/// Every call sends one `POST {origin}/ping` with `{"buildHash": ...}` and
/// returns without waiting for the dev server. Nothing is retried and no
/// state is kept between calls, so repeated calls with the same build are
/// harmless and the dev server keeps whichever hash arrived last.
#[derive(Debug, Clone)]
pub struct DevReadyBroadcaster {
    client: Client,
    config: DevConfig,
}

/// A ping that has been handed to the runtime. Drop it to fire and forget,
/// or [`wait`](PendingPing::wait) for it to learn whether it got out.
#[derive(Debug)]
pub struct PendingPing {
    origin: String,
    build_hash: String,
    handle: JoinHandle<Result<()>>,
}

impl PendingPing {
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn build_hash(&self) -> &str {
        &self.build_hash
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Resolves once the request was sent. Any HTTP response counts as sent;
    /// its status and body are ignored.
    pub async fn wait(self) -> Result<()> {
        self.handle.await?
    }
}

impl DevReadyBroadcaster {
    pub fn new(config: DevConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: DevConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &DevConfig {
        &self.config
    }

    /// Must be called from inside a tokio runtime.
    pub fn broadcast(&self, build: &ServerBuild, origin: Option<&str>) -> Result<PendingPing> {
        let origin_url = self.config.resolve_origin(origin)?;
        let url = ping_url(&origin_url)?;
        let origin = origin_url.as_str().trim_end_matches('/').to_string();

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            DevReadyError::config("broadcasting requires a running tokio runtime")
        })?;

        let payload = PingPayload::from(build);
        let mut request = self.client.post(url).json(&payload);
        if let Some(timeout) = self.config.timeout {
            request = request.timeout(timeout);
        }
        let request = request.build().map_err(|source| {
            tracing::error!("Could not reach dev server at {}", origin);
            DevReadyError::Transport {
                origin: origin.clone(),
                source,
            }
        })?;

        tracing::debug!(
            build_hash = %payload.build_hash,
            "Sending dev-ready ping to {}",
            request.url()
        );

        let client = self.client.clone();
        let task_origin = origin.clone();
        let handle = runtime.spawn(async move {
            match client.execute(request).await {
                Ok(response) => {
                    tracing::debug!(status = %response.status(), "Dev server received ping");
                    Ok(())
                }
                Err(source) => {
                    tracing::error!("Could not reach dev server at {}", task_origin);
                    Err(DevReadyError::Transport {
                        origin: task_origin,
                        source,
                    })
                }
            }
        });

        Ok(PendingPing {
            origin,
            build_hash: payload.build_hash,
            handle,
        })
    }

    pub async fn broadcast_and_wait(
        &self,
        build: &ServerBuild,
        origin: Option<&str>,
    ) -> Result<()> {
        self.broadcast(build, origin)?.wait().await
    }
}

#[async_trait]
impl DevNotifier for DevReadyBroadcaster {
    async fn notify(&self, build: &ServerBuild) -> Result<()> {
        self.broadcast_and_wait(build, None).await
    }
}
