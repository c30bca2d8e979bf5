// src/model/mod.rs — Plant-maturity model: lazy load from object storage, classify

pub mod preprocess;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tract_onnx::prelude::*;

use crate::infra::errors::LeafmarketError;
use crate::storage::{ObjectStore, StorageError};

/// Artifact names under the configured prefix.
pub const MANIFEST_BLOB: &str = "model.json";
pub const WEIGHTS_BLOB: &str = "weights.bin";
pub const METADATA_BLOB: &str = "metadata.json";

/// Used when metadata.json is absent or carries no labels.
const FALLBACK_LABELS: [&str; 2] = ["Mature", "Over Mature"];

pub type PlantModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Topology manifest stored next to the weights. Presence is required;
/// the fields are a sanity check on the artifact set.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelManifest {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub input_shape: Option<Vec<usize>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ModelMetadata {
    #[serde(default)]
    labels: Vec<String>,
}

/// Classification response shared by the single-shot and assembly endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    /// Raw scores: [mature, over-mature].
    pub predictions: [f32; 2],
    pub label: String,
    pub confidence: String,
}

pub struct LoadedModel {
    plan: PlantModel,
    labels: Option<Vec<String>>,
}

/// Process-wide model holder. First caller pays the download/decode cost;
/// concurrent first callers share one in-flight load (single-flight), and a
/// failed load leaves the cell empty so the next request retries.
pub struct ModelCache {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    cell: OnceCell<Arc<LoadedModel>>,
}

impl ModelCache {
    pub fn new(store: Arc<dyn ObjectStore>, artifact_prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: artifact_prefix.into(),
            cell: OnceCell::new(),
        }
    }

    fn blob_key(&self, name: &str) -> String {
        format!("{}/{}", self.prefix.trim_end_matches('/'), name)
    }

    pub async fn ensure_loaded(&self) -> Result<Arc<LoadedModel>, LeafmarketError> {
        self.cell
            .get_or_try_init(|| self.load())
            .await
            .map(Arc::clone)
    }

    /// Decode → preprocess → forward pass → scores → label/confidence.
    /// Preprocessing runs first so malformed input never touches the store.
    pub async fn classify(&self, bytes: &[u8]) -> Result<Classification, LeafmarketError> {
        let input = preprocess::preprocess(bytes)?;
        let model = self.ensure_loaded().await?;

        let outputs = model
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| LeafmarketError::Internal(anyhow::anyhow!("inference failed: {e}")))?;
        let view = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| LeafmarketError::Internal(anyhow::anyhow!("bad model output: {e}")))?;

        let scores: Vec<f32> = view.iter().copied().collect();
        if scores.len() < 2 {
            return Err(LeafmarketError::Internal(anyhow::anyhow!(
                "model produced {} scores, expected 2",
                scores.len()
            )));
        }

        let predictions = [scores[0], scores[1]];
        let (label, confidence) = resolve_label(predictions, model.labels.as_deref());
        Ok(Classification {
            predictions,
            label,
            confidence,
        })
    }

    async fn load(&self) -> Result<Arc<LoadedModel>, LeafmarketError> {
        let started = std::time::Instant::now();

        let manifest_raw = self
            .store
            .get(&self.blob_key(MANIFEST_BLOB))
            .await
            .map_err(|e| LeafmarketError::ModelLoad(format!("{MANIFEST_BLOB}: {e}")))?;
        let manifest: ModelManifest = serde_json::from_slice(&manifest_raw)
            .map_err(|e| LeafmarketError::ModelLoad(format!("{MANIFEST_BLOB} corrupt: {e}")))?;
        validate_manifest(&manifest)?;

        let weights = self
            .store
            .get(&self.blob_key(WEIGHTS_BLOB))
            .await
            .map_err(|e| LeafmarketError::ModelLoad(format!("{WEIGHTS_BLOB}: {e}")))?;

        let labels = match self.store.get(&self.blob_key(METADATA_BLOB)).await {
            Ok(raw) => match serde_json::from_slice::<ModelMetadata>(&raw) {
                Ok(meta) if !meta.labels.is_empty() => Some(meta.labels),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("{METADATA_BLOB} unreadable, using fallback labels: {e}");
                    None
                }
            },
            Err(StorageError::NotFound(_)) => {
                tracing::debug!("{METADATA_BLOB} absent, using fallback labels");
                None
            }
            Err(e) => {
                tracing::warn!("{METADATA_BLOB} fetch failed, using fallback labels: {e}");
                None
            }
        };

        let plan = decode_model(&weights)?;

        tracing::info!(
            "Model loaded from '{}' in {:?} ({} label(s))",
            self.prefix,
            started.elapsed(),
            labels.as_ref().map(|l| l.len()).unwrap_or(0)
        );

        Ok(Arc::new(LoadedModel { plan, labels }))
    }
}

fn validate_manifest(manifest: &ModelManifest) -> Result<(), LeafmarketError> {
    if let Some(shape) = &manifest.input_shape {
        if shape.as_slice() != [1, preprocess::INPUT_SIZE, preprocess::INPUT_SIZE, 3] {
            return Err(LeafmarketError::ModelLoad(format!(
                "{MANIFEST_BLOB} declares input shape {shape:?}, expected [1, {s}, {s}, 3]",
                s = preprocess::INPUT_SIZE
            )));
        }
    }
    Ok(())
}

fn decode_model(weights: &[u8]) -> Result<PlantModel, LeafmarketError> {
    tract_onnx::onnx()
        .model_for_read(&mut std::io::Cursor::new(weights))
        .map_err(|e| LeafmarketError::ModelLoad(e.to_string()))?
        .with_input_fact(
            0,
            InferenceFact::dt_shape(
                f32::datum_type(),
                tvec!(1, preprocess::INPUT_SIZE, preprocess::INPUT_SIZE, 3),
            ),
        )
        .map_err(|e| LeafmarketError::ModelLoad(e.to_string()))?
        .into_optimized()
        .map_err(|e| LeafmarketError::ModelLoad(e.to_string()))?
        .into_runnable()
        .map_err(|e| LeafmarketError::ModelLoad(e.to_string()))
}

/// Argmax label plus `max(score) * 100` to one decimal place.
pub fn resolve_label(scores: [f32; 2], labels: Option<&[String]>) -> (String, String) {
    let idx = if scores[0] >= scores[1] { 0 } else { 1 };
    let label = labels
        .and_then(|l| l.get(idx).cloned())
        .unwrap_or_else(|| FALLBACK_LABELS[idx].to_string());
    let confidence = format!("{:.1}", scores[idx] * 100.0);
    (label, confidence)
}
