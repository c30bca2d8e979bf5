// src/model/preprocess.rs — Image bytes → normalized NHWC tensor

use image::imageops::FilterType;
use tract_onnx::prelude::*;

use crate::infra::errors::LeafmarketError;

/// Spatial resolution the network was trained at.
pub const INPUT_SIZE: usize = 224;

/// Decode arbitrary encoded image bytes, resize to 224×224 with bilinear
/// interpolation, scale channels to [0,1], and add a batch dimension.
pub fn preprocess(bytes: &[u8]) -> Result<Tensor, LeafmarketError> {
    let img = image::load_from_memory(bytes).map_err(|e| LeafmarketError::Decode(e.to_string()))?;

    let resized = img.resize_exact(INPUT_SIZE as u32, INPUT_SIZE as u32, FilterType::Triangle);
    let rgb = resized.to_rgb8();

    let data: Vec<f32> = rgb.into_raw().iter().map(|&v| v as f32 / 255.0).collect();

    let array =
        tract_ndarray::Array4::from_shape_vec((1, INPUT_SIZE, INPUT_SIZE, 3), data)
            .map_err(|e| LeafmarketError::Decode(format!("tensor shape: {e}")))?;
    Ok(array.into_tensor())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb(color));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_shape_and_batch_dim() {
        let tensor = preprocess(&png_bytes(64, 48, [10, 20, 30])).unwrap();
        assert_eq!(tensor.shape(), &[1, INPUT_SIZE, INPUT_SIZE, 3]);
    }

    #[test]
    fn test_values_normalized() {
        let tensor = preprocess(&png_bytes(300, 300, [255, 0, 128])).unwrap();
        let view = tensor.to_array_view::<f32>().unwrap();
        for &v in view.iter() {
            assert!((0.0..=1.0).contains(&v), "value {v} out of range");
        }
        // Uniform image survives resizing untouched.
        assert!((view[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
        assert!(view[[0, 0, 0, 1]].abs() < 1e-6);
    }

    #[test]
    fn test_malformed_bytes_fail_decode() {
        let err = preprocess(b"definitely not an image").unwrap_err();
        assert!(matches!(err, LeafmarketError::Decode(_)));
    }

    #[test]
    fn test_empty_buffer_fails_decode() {
        let err = preprocess(&[]).unwrap_err();
        assert!(matches!(err, LeafmarketError::Decode(_)));
    }
}
