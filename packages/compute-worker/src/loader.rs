/// Model preparation for `SIMILARITY_ENGINE_INIT`
///
/// Looks for the requested weights under
/// `<models_dir>/<preset-id>/<version file>` and keeps track of which variant
/// is loaded. No inference happens here; a successful load means the weights
/// are present and non-empty.
use crate::config::WorkerConfig;
use crate::error::{Result, WorkerError};
use semantic_bridge_core::compute::{ComputeRequest, COMPUTE_TARGET};
use semantic_bridge_core::models::{ModelConfiguration, ModelState, ModelStatus};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct ModelLoader {
    models_dir: PathBuf,
    progress_steps: u8,
    loaded: Option<ModelConfiguration>,
}

impl ModelLoader {
    pub fn new(config: WorkerConfig) -> Result<Self> {
        config.validate().map_err(WorkerError::ConfigError)?;
        let models_dir = config.resolve_models_dir()?;

        Ok(Self {
            models_dir,
            progress_steps: config.progress_steps,
            loaded: None,
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Variant confirmed by the last successful load
    pub fn loaded(&self) -> Option<ModelConfiguration> {
        self.loaded
    }

    /// Where the weights for `config` are expected
    pub fn model_path(&self, config: &ModelConfiguration) -> PathBuf {
        self.models_dir
            .join(config.preset.id())
            .join(config.version.file_name())
    }

    /// Handle one engine init request
    ///
    /// Status records produced along the way are handed to `push` in order,
    /// yielding after each so a concurrent writer can emit it. A failed load leaves the previously loaded variant in place.
    pub async fn load<F>(&mut self, request: &ComputeRequest, mut push: F) -> Result<ModelConfiguration>
    where
        F: FnMut(ModelState),
    {
        if request.target != COMPUTE_TARGET {
            return Err(WorkerError::InvalidRequest(format!(
                "unexpected target '{}'",
                request.target
            )));
        }

        let requested = request.config.model_configuration();
        let expected = requested.preset.dimension();
        if requested.dimension != expected {
            return Err(WorkerError::DimensionMismatch {
                preset: requested.preset.id().to_string(),
                expected,
                actual: requested.dimension,
            });
        }

        if self.loaded == Some(requested) {
            debug!("Model {} already loaded", requested);
            return Ok(requested);
        }

        info!("Loading model {}", requested);
        let steps = u16::from(self.progress_steps);
        for step in 1..=steps {
            // step <= steps, so the percentage never exceeds 100
            let progress = (step * 100 / steps) as u8;
            push(ModelState::downloading(progress));
            tokio::task::yield_now().await;
        }
        push(ModelState::new(ModelStatus::Initializing, 100));
        tokio::task::yield_now().await;

        let path = self.model_path(&requested);
        self.verify(&path, request.config.use_local_files).await?;

        self.loaded = Some(requested);
        info!("Model {} ready at {}", requested, path.display());
        Ok(requested)
    }

    async fn verify(&self, path: &Path, use_local_files: bool) -> Result<()> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
            Ok(meta) if meta.is_file() => {
                warn!("Model file is empty: {}", path.display());
                Err(WorkerError::EmptyModelFile(path.display().to_string()))
            }
            Ok(_) => Err(WorkerError::ModelNotFound(path.display().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if use_local_files {
                    Err(WorkerError::ModelNotFound(path.display().to_string()))
                } else {
                    Err(WorkerError::FetchFailed(format!(
                        "no download source configured and no local copy at {}",
                        path.display()
                    )))
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}
