use std::path::PathBuf;

use image::DynamicImage;
use log::{debug, info};
use ort::{session::Session, value::Tensor};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::{
    Normalization, Prediction, RecognitionBackbone, TensorLayout, parse_labels, preprocess, softmax,
    top_k,
};
use crate::error::{Result, TrustError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnnxBackboneConfig {
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub input_name: String,
    pub input_size: u32,
    pub layout: TensorLayout,
    pub normalization: Normalization,
    /// Set when the model emits logits rather than probabilities.
    pub apply_softmax: bool,
}

impl OnnxBackboneConfig {
    /// MobileNetV2 as exported to the ONNX model zoo: NCHW, ImageNet normalisation, logits out.
    pub fn mobilenet_v2(model_path: impl Into<PathBuf>, labels_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            labels_path: labels_path.into(),
            input_name: "input".into(),
            input_size: 224,
            layout: TensorLayout::Nchw,
            normalization: Normalization::ImageNet,
            apply_softmax: true,
        }
    }
}

pub struct OnnxBackbone {
    // `Session::run` takes `&mut self`.
    session: Mutex<Session>,
    labels: Vec<String>,
    config: OnnxBackboneConfig,
}

impl OnnxBackbone {
    pub fn load(config: OnnxBackboneConfig) -> Result<Self> {
        if !config.model_path.exists() {
            return Err(TrustError::ModelUnavailable(format!(
                "model file not found: {}",
                config.model_path.display()
            )));
        }

        let labels = parse_labels(&std::fs::read_to_string(&config.labels_path)?);
        if labels.is_empty() {
            return Err(TrustError::ModelUnavailable(format!(
                "no class labels in {}",
                config.labels_path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| TrustError::ModelUnavailable(format!("session builder: {e}")))?
            .commit_from_file(&config.model_path)
            .map_err(|e| {
                TrustError::ModelUnavailable(format!(
                    "failed to load {}: {e}",
                    config.model_path.display()
                ))
            })?;

        info!(
            "Loaded ONNX classifier {} with {} classes",
            config.model_path.display(),
            labels.len()
        );

        Ok(Self {
            session: Mutex::new(session),
            labels,
            config,
        })
    }
}

impl RecognitionBackbone for OnnxBackbone {
    fn name(&self) -> &str {
        "onnx"
    }

    fn input_size(&self) -> u32 {
        self.config.input_size
    }

    fn classify(&self, image: &DynamicImage, k: usize) -> Result<Vec<Prediction>> {
        let size = self.config.input_size;
        let data = preprocess(image, size, self.config.layout, self.config.normalization);

        let side = size as i64;
        let shape = match self.config.layout {
            TensorLayout::Nchw => [1, 3, side, side],
            TensorLayout::Nhwc => [1, side, side, 3],
        };

        let tensor = Tensor::from_array((shape, data))
            .map_err(|e| TrustError::Inference(format!("input tensor: {e}")))?;

        let scores = {
            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs! { self.config.input_name.clone() => tensor })
                .map_err(|e| TrustError::Inference(e.to_string()))?;

            let (_shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| TrustError::Inference(format!("output tensor: {e}")))?;

            data.to_vec()
        };

        let probabilities = if self.config.apply_softmax { softmax(&scores) } else { scores };
        let predictions = top_k(&probabilities, &self.labels, k);

        if let Some(top) = predictions.first() {
            debug!("ONNX top-1: {} ({:.3})", top.label, top.confidence);
        }

        Ok(predictions)
    }
}
