use image::DynamicImage;
use imageproc::edges::canny;
use statrs::statistics::Statistics;

use crate::{
    VisualFeatures,
    error::{Result, TrustError},
    image_utils::{ensure_not_empty, fraction_nonzero, resize_rgb, rgb_to_gray, rgb_to_hsv, round_to},
};

pub struct FeatureExtractor {
    canonical_size: u32,
    canny_low: f32,
    canny_high: f32,
}

impl FeatureExtractor {
    pub fn new(canonical_size: u32, canny_low: f32, canny_high: f32) -> Self {
        Self {
            canonical_size,
            canny_low,
            canny_high,
        }
    }

    pub fn extract(&self, image: &DynamicImage) -> Result<VisualFeatures> {
        ensure_not_empty(image)?;
        self.check_parameters()?;

        let rgb = resize_rgb(&image.to_rgb8(), self.canonical_size);

        let gray = rgb_to_gray(&rgb);
        let edges = canny(&gray, self.canny_low, self.canny_high);
        let edge_density = fraction_nonzero(&edges);

        let pixel_count = rgb.width() as usize * rgb.height() as usize;
        let mut hue = Vec::with_capacity(pixel_count);
        let mut saturation = Vec::with_capacity(pixel_count);
        let mut value = Vec::with_capacity(pixel_count);

        for pixel in rgb.pixels() {
            let [h, s, v] = rgb_to_hsv(pixel);
            hue.push(h);
            saturation.push(s);
            value.push(v);
        }

        let features = VisualFeatures {
            edge_density: round_to(edge_density, 4),
            brightness: round_to(value.iter().mean(), 2),
            saturation: round_to(saturation.iter().mean(), 2),
            hue_std: round_to(hue.iter().population_std_dev(), 2),
        };

        let all_finite = [
            features.edge_density,
            features.brightness,
            features.saturation,
            features.hue_std,
        ]
        .iter()
        .all(|v| v.is_finite());

        if !all_finite {
            return Err(TrustError::AnalysisFailed(format!(
                "non-finite visual features: {features:?}"
            )));
        }

        Ok(features)
    }

    // canny panics on a window smaller than its 3x3 kernel or on inverted thresholds.
    fn check_parameters(&self) -> Result<()> {
        if self.canonical_size < 3 {
            return Err(TrustError::Config(format!(
                "feature canonical_size must be at least 3, got {}",
                self.canonical_size
            )));
        }
        if !(self.canny_low >= 0.0 && self.canny_low <= self.canny_high) {
            return Err(TrustError::Config(format!(
                "canny thresholds must satisfy 0 <= low <= high, got {} / {}",
                self.canny_low, self.canny_high
            )));
        }
        Ok(())
    }
}
