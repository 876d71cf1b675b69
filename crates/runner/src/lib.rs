//! Inpaint Pipeline Runner
//!
//! Startup wiring for the inference pipeline: materialize the bundled
//! assets into the cache, spawn the orchestrator (which loads the model on
//! its worker), then run one inference over the cached sample image and
//! mask and write the result to the cache output path.

mod config;

pub use config::RunnerConfig;

use anyhow::{bail, ensure, Context};
use asset_cache::{ArtifactPaths, Materializer, IMAGES_DIR_NAME, MODEL_FILE_NAME};
use inference_engine::{InferenceBackend, TractBackend};
use orchestrator::{InferenceOutcome, InferenceRequest, Orchestrator, OrchestratorConfig};
use std::fs;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Full startup flow plus one sample inference.
pub async fn run(config: RunnerConfig) -> anyhow::Result<()> {
    let paths = ArtifactPaths::new(&config.cache_root);
    materialize_bundle(&config, &paths)?;

    // Per-file copy failures are forgiving, a missing model is not: the
    // session would otherwise sit at not-ready forever.
    ensure!(
        paths.model_path().is_file(),
        "model missing after materialization: {}",
        paths.model_path().display()
    );

    let loader = {
        let model_path = paths.model_path();
        let engine = config.engine;
        move || Ok(Box::new(TractBackend::load(&model_path, &engine)?) as Box<dyn InferenceBackend>)
    };
    let (orchestrator, mut outcomes) =
        Orchestrator::spawn(OrchestratorConfig { engine: config.engine }, loader)?;

    wait_for_session(&orchestrator, &mut outcomes).await?;
    info!("Session ready, running sample inference");

    let image_path = config.cache_root.join(&config.sample_image);
    let mask_path = config.cache_root.join(&config.sample_mask);
    if !image_path.is_file() || !mask_path.is_file() {
        info!("No sample image/mask in cache, skipping sample inference");
        orchestrator.shutdown();
        return Ok(());
    }

    let request = InferenceRequest::new(
        fs::read(&image_path).with_context(|| format!("reading {}", image_path.display()))?,
        fs::read(&mask_path).with_context(|| format!("reading {}", mask_path.display()))?,
        "sample",
    );
    let request_id = request.id;
    if !orchestrator.submit(request).is_accepted() {
        bail!("sample inference was not admitted");
    }

    let outcome = match outcomes.recv().await {
        Some(outcome) => outcome,
        None => bail!("orchestrator stopped before delivering an outcome"),
    };
    match outcome {
        InferenceOutcome::Success {
            output_png,
            duration,
            ..
        } => {
            let output_path = paths.output_image_path();
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&output_path, output_png)
                .with_context(|| format!("writing {}", output_path.display()))?;
            info!(
                "Sample inference {} done in {:.2}s, output at {}",
                request_id,
                duration.as_secs_f64(),
                output_path.display()
            );
        }
        InferenceOutcome::Failure { error, duration, .. } => {
            bail!(
                "sample inference failed after {:.2}s: {}",
                duration.as_secs_f64(),
                error
            );
        }
    }

    orchestrator.shutdown();
    Ok(())
}

/// Mirror the bundle into the cache: the model under its fixed name, the
/// images directory with relative paths preserved.
fn materialize_bundle(config: &RunnerConfig, paths: &ArtifactPaths) -> anyhow::Result<()> {
    let model_src = config.bundle_dir.join(&config.model_file);
    if model_src.is_file() {
        Materializer::new(paths.cache_root()).copy_file_as(&model_src, MODEL_FILE_NAME)?;
    } else if !paths.model_path().is_file() {
        warn!("Bundle has no model at {}", model_src.display());
    }

    let images_src = config.bundle_dir.join(IMAGES_DIR_NAME);
    if images_src.is_dir() {
        let report = Materializer::new(paths.images_dir()).materialize(&images_src)?;
        if report.failed > 0 {
            warn!("{} sample assets could not be copied", report.failed);
        }
    }

    Ok(())
}

/// Wait until the worker publishes readiness, surfacing a create failure.
async fn wait_for_session(
    orchestrator: &Orchestrator,
    outcomes: &mut UnboundedReceiver<InferenceOutcome>,
) -> anyhow::Result<()> {
    loop {
        if orchestrator.is_ready() {
            return Ok(());
        }
        match timeout(Duration::from_millis(50), outcomes.recv()).await {
            Ok(Some(InferenceOutcome::Failure { error, .. })) => bail!("{}", error),
            Ok(Some(_)) => {}
            Ok(None) => bail!("orchestrator stopped before the session was ready"),
            Err(_) => {} // still loading
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn test_config(bundle: &Path, cache: &Path) -> RunnerConfig {
        RunnerConfig {
            bundle_dir: bundle.to_path_buf(),
            cache_root: cache.to_path_buf(),
            ..RunnerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_run_fails_fast_without_model() {
        let bundle = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();

        let err = run(test_config(bundle.path(), cache.path()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("model missing"));
    }

    #[tokio::test]
    async fn test_run_surfaces_create_failure() {
        let bundle = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        // Not a valid ONNX file: materialization succeeds, session create
        // fails, and the failure must reach the caller.
        fs::write(bundle.path().join("lama_fp32.onnx"), b"not a model").unwrap();

        let err = run(test_config(bundle.path(), cache.path()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("model unavailable"));
        // The bad bytes were still cached under the fixed name.
        assert!(cache.path().join("inference.onnx").is_file());
    }
}
