// this_file: src/encode.rs
//! Frame encoding (§4.8 step 5): PNG at the fastest compression level, or
//! lossless WebP at full quality. Both may be produced in one pass.

use crate::error::{Error, Result};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};

/// Encodes `rgba` (unpremultiplied, `width*height*4` bytes) as PNG using
/// zlib compression level 1 for speed (§4.8 step 5).
pub fn encode_png(width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter);
    encoder
        .write_image(rgba, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| Error::EncodeFailed(format!("png: {e}")))?;
    Ok(out)
}

/// Encodes `rgba` as lossless WebP.
pub fn encode_webp(width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let encoder = WebPEncoder::new_lossless(&mut out);
    encoder
        .encode(rgba, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| Error::EncodeFailed(format!("webp: {e}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_a_small_png() {
        let rgba = vec![255u8; 4 * 4 * 4];
        let png = encode_png(4, 4, &rgba).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn png_round_trips_to_identical_pixels() {
        let mut rgba = vec![0u8; 4 * 4 * 4];
        for (i, px) in rgba.chunks_exact_mut(4).enumerate() {
            px[0] = i as u8;
            px[1] = 255 - i as u8;
            px[2] = 128;
            px[3] = 255;
        }
        let png = encode_png(4, 4, &rgba).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.into_raw(), rgba);
    }

    #[test]
    fn encodes_a_small_webp() {
        let rgba = vec![255u8; 4 * 4 * 4];
        let webp = encode_webp(4, 4, &rgba).unwrap();
        assert!(webp.len() > 12);
        assert_eq!(&webp[0..4], b"RIFF");
    }
}
