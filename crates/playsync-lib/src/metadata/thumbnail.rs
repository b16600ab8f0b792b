use crate::error::PlaysyncError;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

/// Downloads a thumbnail. Non-success responses yield `Ok(None)`.
pub async fn fetch_thumbnail(
    client: &reqwest::Client,
    url: &str,
) -> Result<Option<Vec<u8>>, PlaysyncError> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        tracing::debug!(url, status = %response.status(), "Thumbnail not available");
        return Ok(None);
    }
    Ok(Some(response.bytes().await?.to_vec()))
}

/// Centres the image on a black square canvas and encodes it as PNG, so
/// that players which crop covers to a square show the whole frame.
pub fn square_cover(bytes: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let image = image::load_from_memory(bytes)?;
    let (width, height) = image.dimensions();

    let squared = if width == height {
        image
    } else {
        let side = width.max(height);
        let mut canvas = DynamicImage::new(side, side, image.color());
        image::imageops::replace(
            &mut canvas,
            &image,
            i64::from((side - width) / 2),
            i64::from((side - height) / 2),
        );
        canvas
    };

    let mut png = Vec::new();
    squared.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn encode_png(image: RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_square_cover_pads_landscape_vertically() {
        let source = encode_png(RgbImage::from_pixel(4, 2, Rgb([255, 0, 0])));

        let cover = image::load_from_memory(&square_cover(&source).unwrap())
            .unwrap()
            .to_rgb8();

        assert_eq!(cover.dimensions(), (4, 4));
        assert_eq!(cover.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(cover.get_pixel(0, 1), &Rgb([255, 0, 0]));
        assert_eq!(cover.get_pixel(3, 2), &Rgb([255, 0, 0]));
        assert_eq!(cover.get_pixel(3, 3), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_square_cover_pads_portrait_horizontally() {
        let source = encode_png(RgbImage::from_pixel(2, 6, Rgb([0, 0, 255])));

        let cover = image::load_from_memory(&square_cover(&source).unwrap())
            .unwrap()
            .to_rgb8();

        assert_eq!(cover.dimensions(), (6, 6));
        assert_eq!(cover.get_pixel(1, 0), &Rgb([0, 0, 0]));
        assert_eq!(cover.get_pixel(2, 0), &Rgb([0, 0, 255]));
        assert_eq!(cover.get_pixel(3, 5), &Rgb([0, 0, 255]));
        assert_eq!(cover.get_pixel(4, 5), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_square_cover_keeps_square_images() {
        let source = encode_png(RgbImage::from_pixel(3, 3, Rgb([1, 2, 3])));

        let cover = image::load_from_memory(&square_cover(&source).unwrap()).unwrap();

        assert_eq!(cover.dimensions(), (3, 3));
    }

    #[test]
    fn test_square_cover_rejects_non_images() {
        assert!(square_cover(b"definitely not an image").is_err());
    }
}
