use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};

use super::config::DatasetConfig;
use super::error::DatasetError;

/// Decodes the image at `path` and returns it resized to the configured
/// square, converted to the configured channel count and flattened to HWC bytes.
///
/// The format is sniffed from the content so a mislabelled extension still decodes.
pub fn load_image(path: &Path, config: &DatasetConfig) -> Result<Vec<u8>, DatasetError> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    let bytes = resize_to_sample(img, config);

    if bytes.len() != config.image_len() {
        return Err(DatasetError::ImageLength {
            expected: config.image_len(),
            actual: bytes.len(),
        });
    }

    Ok(bytes)
}

pub fn resize_to_sample(img: DynamicImage, config: &DatasetConfig) -> Vec<u8> {
    let img = match config.image_channels {
        1 => DynamicImage::ImageLuma8(img.to_luma8()),
        4 => DynamicImage::ImageRgba8(img.to_rgba8()),
        _ => DynamicImage::ImageRgb8(img.to_rgb8()),
    };

    img.resize_exact(config.image_size, config.image_size, FilterType::Triangle)
        .into_bytes()
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    use super::*;

    fn small_config(channels: u32) -> DatasetConfig {
        DatasetConfig {
            image_size: 8,
            image_channels: channels,
            ..Default::default()
        }
    }

    #[test]
    fn resizes_to_configured_square() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dog.1.jpg");
        RgbImage::from_pixel(31, 17, Rgb([200, 10, 10])).save(&path).unwrap();

        let bytes = load_image(&path, &small_config(3)).unwrap();
        assert_eq!(bytes.len(), 8 * 8 * 3);
        // Lossy JPEG keeps a flat colour close to the original
        assert!(bytes.chunks_exact(3).all(|px| px[0] > 150 && px[1] < 60));
    }

    #[test]
    fn converts_channel_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cat.png");
        RgbImage::from_pixel(4, 4, Rgb([255, 255, 255])).save(&path).unwrap();

        let gray = load_image(&path, &small_config(1)).unwrap();
        assert_eq!(gray.len(), 64);
        assert!(gray.iter().all(|&v| v >= 254));

        let rgba = load_image(&path, &small_config(4)).unwrap();
        assert_eq!(rgba.len(), 256);
    }

    #[test]
    fn sniffs_format_from_content() {
        let dir = tempdir().unwrap();
        let png = dir.path().join("real.png");
        RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])).save(&png).unwrap();
        let renamed = dir.path().join("42.jpg");
        std::fs::rename(&png, &renamed).unwrap();

        let bytes = load_image(&renamed, &small_config(3)).unwrap();
        for (got, want) in bytes[..3].iter().zip([1u8, 2, 3]) {
            assert!(got.abs_diff(want) <= 1);
        }
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(load_image(&path, &small_config(3)).is_err());
    }
}
