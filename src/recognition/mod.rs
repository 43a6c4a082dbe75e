pub mod labels;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod preprocess;

use image::DynamicImage;
use log::{info, warn};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::error::{Result, TrustError};

pub use labels::{humanize_label, parse_labels};
pub use preprocess::{Normalization, TensorLayout, preprocess, softmax, top_k};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
}

pub trait RecognitionBackbone: Send + Sync {
    fn name(&self) -> &str;

    fn input_size(&self) -> u32;

    /// Up to `top_k` predictions, most confident first.
    fn classify(&self, image: &DynamicImage, top_k: usize) -> Result<Vec<Prediction>>;
}

type Loader = Box<dyn Fn() -> Result<Box<dyn RecognitionBackbone>> + Send + Sync>;

/// Defers loading an expensive backbone until the first classification.
///
/// The loader runs at most once even under concurrent first use. A failed load
/// is remembered, and every later call reports `TrustError::ModelUnavailable`.
pub struct LazyBackbone {
    name: String,
    input_size: u32,
    loader: Loader,
    loaded: OnceCell<Option<Box<dyn RecognitionBackbone>>>,
}

impl LazyBackbone {
    pub fn new<F>(name: impl Into<String>, input_size: u32, loader: F) -> Self
    where
        F: Fn() -> Result<Box<dyn RecognitionBackbone>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            input_size,
            loader: Box::new(loader),
            loaded: OnceCell::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.loaded.get().is_some()
    }

    pub fn is_available(&self) -> bool {
        matches!(self.loaded.get(), Some(Some(_)))
    }

    fn backbone(&self) -> Option<&dyn RecognitionBackbone> {
        self.loaded
            .get_or_init(|| match (self.loader)() {
                Ok(backbone) => {
                    info!("Recognition backbone {} loaded ({})", self.name, backbone.name());
                    if backbone.input_size() != self.input_size {
                        warn!(
                            "Recognition backbone {} expects {}px input, declared {}px",
                            self.name,
                            backbone.input_size(),
                            self.input_size
                        );
                    }
                    Some(backbone)
                }
                Err(e) => {
                    warn!("Recognition backbone {} failed to load: {}", self.name, e);
                    None
                }
            })
            .as_deref()
    }
}

impl RecognitionBackbone for LazyBackbone {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn classify(&self, image: &DynamicImage, top_k: usize) -> Result<Vec<Prediction>> {
        let backbone = self
            .backbone()
            .ok_or_else(|| TrustError::ModelUnavailable(format!("{} could not be loaded", self.name)))?;
        backbone.classify(image, top_k)
    }
}
