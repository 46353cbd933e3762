//! Applies a quantization table to a grayscale image and measures the result.

use ndarray::{Array2, ArrayView2};

use crate::config::{LossyConfig, PngEffort};
use crate::error::SqueezeError;
use crate::lossy::table::QuantizationTable;

/// The outcome of quantizing one image.
#[derive(Debug, Clone)]
pub struct QuantizationResult {
    pub reconstructed: Array2<u8>,
    pub table: QuantizationTable,
    /// Mean squared error between the input and `reconstructed`.
    pub mse: f64,
    /// `original_size / png_size`.
    pub ratio: f64,
    /// Size the ratio is measured against: the caller's file size, or the
    /// pixel count when none was given.
    pub original_size: u64,
    /// Size of `reconstructed` encoded as a grayscale PNG.
    pub png_size: u64,
}

/// Quantizes `image` to `2^bit_size` levels with the default configuration.
pub fn quantize(
    image: &Array2<u8>,
    bit_size: u32,
    original_file_size: Option<u64>,
) -> Result<QuantizationResult, SqueezeError> {
    quantize_with_config(image, bit_size, original_file_size, &LossyConfig::default())
}

pub fn quantize_with_config(
    image: &Array2<u8>,
    bit_size: u32,
    original_file_size: Option<u64>,
    config: &LossyConfig,
) -> Result<QuantizationResult, SqueezeError> {
    if image.is_empty() {
        return Err(SqueezeError::EmptyInput("image has no pixels".to_string()));
    }

    let pixels: Vec<u8> = image.iter().copied().collect();
    let table = QuantizationTable::build(&pixels, bit_size, config)?;
    let reconstructed = Array2::from_shape_vec(image.dim(), table.apply(&pixels))
        .map_err(|e| SqueezeError::QuantizationError(e.to_string()))?;

    let mse = mean_squared_error(image.view(), reconstructed.view())?;
    let png_size = encode_png(reconstructed.view(), config.png_effort)?.len() as u64;
    let original_size = original_file_size.unwrap_or(pixels.len() as u64);
    let ratio = original_size as f64 / png_size as f64;

    log::info!(
        "  - Quantizer | Bits: {} | Levels: {:>3} | MSE: {:>10.3} | PNG: {:>8} B | CR: {:.3}",
        bit_size,
        table.levels(),
        mse,
        png_size,
        ratio
    );
    log_metric!(
        "event" = "quantize",
        "bit_size" = bit_size,
        "mse" = mse,
        "png_size" = png_size,
        "ratio" = ratio,
    );

    Ok(QuantizationResult {
        reconstructed,
        table,
        mse,
        ratio,
        original_size,
        png_size,
    })
}

/// Mean of the squared per-pixel differences.
pub fn mean_squared_error(
    original: ArrayView2<u8>,
    reconstructed: ArrayView2<u8>,
) -> Result<f64, SqueezeError> {
    if original.dim() != reconstructed.dim() {
        return Err(SqueezeError::QuantizationError(format!(
            "shape mismatch: {:?} vs {:?}",
            original.dim(),
            reconstructed.dim()
        )));
    }
    if original.is_empty() {
        return Ok(0.0);
    }
    let sum: u64 = original
        .iter()
        .zip(reconstructed.iter())
        .map(|(&a, &b)| {
            let d = a.abs_diff(b) as u64;
            d * d
        })
        .sum();
    Ok(sum as f64 / original.len() as f64)
}

/// Encodes `image` as an 8-bit grayscale PNG.
pub fn encode_png(image: ArrayView2<u8>, effort: PngEffort) -> Result<Vec<u8>, SqueezeError> {
    let (rows, cols) = image.dim();
    let height = u32::try_from(rows)
        .map_err(|_| SqueezeError::InvalidParameter(format!("image height {} is too large", rows)))?;
    let width = u32::try_from(cols)
        .map_err(|_| SqueezeError::InvalidParameter(format!("image width {} is too large", cols)))?;
    let data: Vec<u8> = image.iter().copied().collect();

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Grayscale);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(effort.to_png());
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&data)?;
        writer.finish()?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    fn gradient_image() -> Array2<u8> {
        Array2::from_shape_fn((16, 64), |(r, c)| ((r * 64 + c) % 256) as u8)
    }

    #[test]
    fn test_gradient_gets_every_level_and_mse_falls() {
        let image = gradient_image();
        let mut previous = f64::INFINITY;
        for bit_size in 1..=4 {
            let result = quantize(&image, bit_size, None).unwrap();
            let levels: BTreeSet<u8> = result.reconstructed.iter().copied().collect();
            assert_eq!(levels.len(), 1 << bit_size, "bit size {bit_size}");
            assert!(result.mse <= previous, "bit size {bit_size}");
            previous = result.mse;
        }
    }

    #[test]
    fn test_reconstruction_keeps_shape() {
        let image = gradient_image();
        let result = quantize(&image, 2, None).unwrap();
        assert_eq!(result.reconstructed.dim(), image.dim());
        assert_eq!(result.table.levels(), 4);
        assert_eq!(result.reconstructed[[0, 0]], 32);
        assert_eq!(result.reconstructed[[3, 63]], 224);
    }

    #[test]
    fn test_ratio_uses_file_size_or_pixel_count() {
        let image = gradient_image();
        let with_size = quantize(&image, 1, Some(10_000)).unwrap();
        assert_eq!(with_size.original_size, 10_000);
        assert!(with_size.png_size > 0);
        assert_eq!(with_size.ratio, 10_000.0 / with_size.png_size as f64);

        let without = quantize(&image, 1, None).unwrap();
        assert_eq!(without.original_size, 1024);
        assert_eq!(without.ratio, 1024.0 / without.png_size as f64);
    }

    #[test]
    fn test_two_tone_image_is_lossless() {
        let image = Array2::from_shape_fn((8, 8), |(r, _)| if r < 4 { 0 } else { 255 });
        let result = quantize(&image, 1, None).unwrap();
        assert_eq!(result.reconstructed, image);
        assert_eq!(result.mse, 0.0);
    }

    #[test]
    fn test_mean_squared_error() {
        let a = Array2::from_shape_vec((1, 4), vec![0u8, 10, 20, 30]).unwrap();
        let b = Array2::from_shape_vec((1, 4), vec![2u8, 10, 16, 30]).unwrap();
        assert_eq!(mean_squared_error(a.view(), b.view()).unwrap(), 5.0);

        let c = Array2::<u8>::zeros((2, 2));
        assert!(matches!(
            mean_squared_error(a.view(), c.view()),
            Err(SqueezeError::QuantizationError(_))
        ));
    }

    #[test]
    fn test_encode_png_writes_a_png() {
        let bytes = encode_png(gradient_image().view(), PngEffort::Fast).unwrap();
        assert_eq!(&bytes[..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_invalid_inputs() {
        let empty = Array2::<u8>::zeros((0, 5));
        assert!(matches!(quantize(&empty, 2, None), Err(SqueezeError::EmptyInput(_))));
        assert!(matches!(
            quantize(&gradient_image(), 9, None),
            Err(SqueezeError::InvalidParameter(_))
        ));
    }
}
