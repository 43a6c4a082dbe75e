use image::{DynamicImage, imageops::FilterType};
use serde::{Deserialize, Serialize};

use super::Prediction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TensorLayout {
    Nchw,
    Nhwc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Normalization {
    /// `x / 127.5 - 1`, as MobileNetV2 expects.
    SymmetricUnit,
    /// Per-channel ImageNet mean/std on `[0, 1]` input.
    ImageNet,
}

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

impl Normalization {
    fn apply(&self, value: u8, channel: usize) -> f32 {
        let v = value as f32;
        match self {
            Normalization::SymmetricUnit => v / 127.5 - 1.0,
            Normalization::ImageNet => (v / 255.0 - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel],
        }
    }
}

pub fn preprocess(
    image: &DynamicImage,
    size: u32,
    layout: TensorLayout,
    normalization: Normalization,
) -> Vec<f32> {
    let rgb = image.resize_exact(size, size, FilterType::Triangle).to_rgb8();
    let plane = (size * size) as usize;
    let mut tensor = vec![0.0f32; plane * 3];

    for (i, pixel) in rgb.pixels().enumerate() {
        for channel in 0..3 {
            let value = normalization.apply(pixel[channel], channel);
            let index = match layout {
                TensorLayout::Nchw => channel * plane + i,
                TensorLayout::Nhwc => i * 3 + channel,
            };
            tensor[index] = value;
        }
    }

    tensor
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    if sum > 0.0 && sum.is_finite() {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        vec![0.0; logits.len()]
    }
}

/// Highest `k` scores paired with their labels, most confident first.
/// Classes without a label are reported by index.
pub fn top_k(scores: &[f32], labels: &[String], k: usize) -> Vec<Prediction> {
    let mut indexed: Vec<(usize, f32)> = scores
        .iter()
        .cloned()
        .enumerate()
        .filter(|(_, s)| s.is_finite())
        .collect();
    indexed.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    indexed
        .into_iter()
        .take(k)
        .map(|(index, score)| Prediction {
            label: labels
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("class_{index}")),
            confidence: score as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;

    #[test]
    fn nchw_layout_groups_channels() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 0, 127])));
        let tensor = preprocess(&image, 2, TensorLayout::Nchw, Normalization::SymmetricUnit);

        assert_eq!(tensor.len(), 12);
        assert_eq!(&tensor[0..4], &[1.0; 4]);
        assert_eq!(&tensor[4..8], &[-1.0; 4]);
        assert!(tensor[8].abs() < 0.01);
    }

    #[test]
    fn nhwc_layout_interleaves_channels() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([255, 0, 0])));
        let tensor = preprocess(&image, 2, TensorLayout::Nhwc, Normalization::SymmetricUnit);

        assert_eq!(&tensor[0..3], &[1.0, -1.0, -1.0]);
        assert_eq!(&tensor[3..6], &[1.0, -1.0, -1.0]);
    }

    #[test]
    fn softmax_is_a_distribution() {
        let probs = softmax(&[1.0, 2.0, 3.0, 1000.0]);
        let sum: f32 = probs.iter().sum();

        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[3] > 0.99);
    }

    #[test]
    fn top_k_orders_by_confidence() {
        let labels = vec!["mug".to_string(), "lamp".to_string()];
        let predictions = top_k(&[0.1, 0.7, 0.2], &labels, 2);

        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].label, "lamp");
        assert_eq!(predictions[1].label, "class_2");
        assert!((predictions[1].confidence - 0.2).abs() < 1e-6);
    }
}
