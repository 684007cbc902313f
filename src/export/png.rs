use crate::error::{PanelError, Result};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

/// ラスタをPNGにエンコードする
pub fn encode_png(raster: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    raster
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| PanelError::BlobCreationFailed(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_encode_png_signature() {
        let raster = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 4]));
        let bytes = encode_png(&raster).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }
}
