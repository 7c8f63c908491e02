use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use ndarray::{Array2, Array3, ArrayView2};
use phasereg_core::{RegistrationParams, Shift};

/// Load an image as `rows x cols x channels` with values in [0, 1].
///
/// Grayscale files load with one channel. Color files keep their channels
/// unless `luma` is set, in which case they are converted to luminance.
pub fn load_image(path: &Path, luma: bool) -> Result<Array3<f64>> {
    let img = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let channels = img.color().channel_count() as usize;

    if luma || channels == 1 {
        return Ok(to_gray(&img).insert_axis(ndarray::Axis(2)));
    }

    let (w, h) = (img.width() as usize, img.height() as usize);
    let (raw, channels) = if img.color().has_alpha() {
        (img.to_rgba32f().into_raw(), 4)
    } else {
        (img.to_rgb32f().into_raw(), 3)
    };
    let data: Vec<f64> = raw.into_iter().map(f64::from).collect();
    Array3::from_shape_vec((h, w, channels), data)
        .with_context(|| format!("Unexpected pixel layout in {}", path.display()))
}

fn to_gray(img: &DynamicImage) -> Array2<f64> {
    let gray = img.to_luma16();
    let (w, h) = gray.dimensions();
    Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
        gray.get_pixel(col as u32, row as u32).0[0] as f64 / 65535.0
    })
}

/// Save `data` as an 8-bit grayscale PNG, stretched to its own min/max.
pub fn save_png_normalized(data: ArrayView2<f64>, path: &Path) -> Result<()> {
    let (h, w) = data.dim();
    let min = data.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = if max > min { max - min } else { 1.0 };

    let mut img = GrayImage::new(w as u32, h as u32);
    for row in 0..h {
        for col in 0..w {
            let v = ((data[[row, col]] - min) / range).clamp(0.0, 1.0);
            img.put_pixel(col as u32, row as u32, Luma([(v * 255.0).round() as u8]));
        }
    }

    img.save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Read registration parameters from a TOML file.
pub fn load_params(path: &Path) -> Result<RegistrationParams> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Failed to parse config {}", path.display()))
}

/// Parse a shift written as `dx,dy`.
pub fn parse_shift(text: &str) -> Result<Shift, String> {
    let (dx, dy) = text
        .split_once(',')
        .ok_or_else(|| format!("expected dx,dy but got '{text}'"))?;
    let parse = |s: &str| s.trim().parse::<f64>().map_err(|e| format!("'{s}': {e}"));
    Ok(Shift::new(parse(dx)?, parse(dy)?))
}
