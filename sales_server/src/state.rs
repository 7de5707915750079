//! Shared application state

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use sales_forecast::{ModelArtifact, ModelStore};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub store: ModelStore,
    model: Arc<RwLock<Option<Arc<ModelArtifact>>>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let store = ModelStore::new(config.model_dir.clone());
        Self {
            config: Arc::new(config),
            store,
            model: Arc::new(RwLock::new(None)),
        }
    }

    /// Whether a model is being served, either in memory or saved in the store
    pub async fn has_model(&self) -> bool {
        if self.model.read().await.is_some() {
            return true;
        }
        tokio::fs::try_exists(self.store.artifact_path())
            .await
            .unwrap_or(false)
    }

    /// The model being served, loaded from the store on first use
    pub async fn current_model(&self) -> Result<Arc<ModelArtifact>> {
        if let Some(artifact) = self.model.read().await.as_ref() {
            return Ok(Arc::clone(artifact));
        }

        let mut slot = self.model.write().await;
        if let Some(artifact) = slot.as_ref() {
            return Ok(Arc::clone(artifact));
        }

        let store = self.store.clone();
        let loaded = tokio::task::spawn_blocking(move || store.load()).await??;
        let Some(artifact) = loaded else {
            return Err(ServerError::NotTrained);
        };

        let artifact = Arc::new(artifact);
        info!(
            model = %artifact.kind(),
            trained_at = %artifact.trained_at,
            "stored model loaded"
        );
        *slot = Some(Arc::clone(&artifact));
        Ok(artifact)
    }

    /// Persist a freshly trained model and start serving it
    ///
    /// The model is served even when persisting fails; the failure is still
    /// reported to the caller.
    pub async fn install_model(&self, artifact: ModelArtifact) -> Result<Arc<ModelArtifact>> {
        let artifact = Arc::new(artifact);

        let store = self.store.clone();
        let to_save = Arc::clone(&artifact);
        let saved = tokio::task::spawn_blocking(move || store.save(&to_save)).await;

        *self.model.write().await = Some(Arc::clone(&artifact));

        match saved {
            Ok(Ok(())) => Ok(artifact),
            Ok(Err(e)) => {
                error!(error = %e, dir = %self.store.dir().display(), "failed to persist model");
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}
