use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, imageops::FilterType};
use ndarray::Array2;

use crate::error::{Result, TrustError};

pub const LAPLACIAN_KERNEL: [[f64; 3]; 3] = [[0.0, 1.0, 0.0], [1.0, -4.0, 1.0], [0.0, 1.0, 0.0]];

pub fn load_image(path: impl AsRef<std::path::Path>) -> Result<DynamicImage> {
    let image = image::open(path)?;
    ensure_not_empty(&image)?;
    Ok(image)
}

pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    let image = image::load_from_memory(bytes)?;
    ensure_not_empty(&image)?;
    Ok(image)
}

pub fn ensure_not_empty(image: &DynamicImage) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(TrustError::EmptyImage);
    }
    Ok(())
}

pub fn rgb_to_gray(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut gray = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let lum = 0.299 * pixel[0] as f64 + 0.587 * pixel[1] as f64 + 0.114 * pixel[2] as f64;
        gray.put_pixel(x, y, Luma([lum.round().clamp(0.0, 255.0) as u8]));
    }

    gray
}

pub fn resize_gray(image: &GrayImage, size: u32) -> GrayImage {
    image::imageops::resize(image, size, size, FilterType::Triangle)
}

pub fn resize_rgb(image: &RgbImage, size: u32) -> RgbImage {
    image::imageops::resize(image, size, size, FilterType::Triangle)
}

/// Mirrors an out-of-range index back into `0..len` without repeating the edge pixel.
fn reflect_101(index: i64, len: i64) -> u32 {
    if len == 1 {
        return 0;
    }
    let mut i = index;
    if i < 0 {
        i = -i;
    }
    if i >= len {
        i = 2 * (len - 1) - i;
    }
    i.clamp(0, len - 1) as u32
}

pub fn convolve_f64(image: &GrayImage, kernel: &[[f64; 3]; 3]) -> Array2<f64> {
    let (width, height) = image.dimensions();
    let mut response = Array2::zeros((height as usize, width as usize));

    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let mut sum = 0.0;

            for (ky, row) in kernel.iter().enumerate() {
                for (kx, weight) in row.iter().enumerate() {
                    if *weight == 0.0 {
                        continue;
                    }
                    let px = reflect_101(x + kx as i64 - 1, width as i64);
                    let py = reflect_101(y + ky as i64 - 1, height as i64);
                    sum += image.get_pixel(px, py)[0] as f64 * weight;
                }
            }

            response[[y as usize, x as usize]] = sum;
        }
    }

    response
}

pub fn laplacian_variance(gray: &GrayImage) -> Result<f64> {
    if gray.width() == 0 || gray.height() == 0 {
        return Err(TrustError::EmptyImage);
    }

    let response = convolve_f64(gray, &LAPLACIAN_KERNEL);
    let variance = response.var(0.0);

    if !variance.is_finite() {
        return Err(TrustError::AnalysisFailed(format!(
            "Laplacian variance is not finite: {variance}"
        )));
    }

    Ok(variance)
}

/// 8-bit HSV: hue in `0..=180`, saturation and value in `0..=255`.
pub fn rgb_to_hsv(pixel: &Rgb<u8>) -> [f64; 3] {
    let r = pixel[0] as f64;
    let g = pixel[1] as f64;
    let b = pixel[2] as f64;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

    let mut hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }

    [(hue / 2.0).round(), saturation.round(), max]
}

/// Ties go to the even neighbour, so `round_to(0.125, 2)` is `0.12`.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

pub fn fraction_nonzero(image: &GrayImage) -> f64 {
    let total = image.width() as usize * image.height() as usize;
    if total == 0 {
        return 0.0;
    }
    image.pixels().filter(|p| p[0] > 0).count() as f64 / total as f64
}
