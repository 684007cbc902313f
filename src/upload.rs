//! 画像の取り込み
//!
//! ファイル（またはフォルダ直下の画像）を読み込み、デコードできたものだけを
//! コレクションに追加できる形にする。壊れたファイル・画像でないファイルは
//! バッチから黙って除外する。

use crate::error::{PanelError, Result};
use base64::Engine;
use figure_panel_common::{ImagePayload, NewItem};
use image::ImageFormat;
use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

/// ファイル/フォルダの一覧からペイロードを読み込む
///
/// フォルダは直下のみ（再帰しない）をファイル名順に読む。
pub fn read_inputs(inputs: &[impl AsRef<Path>]) -> Result<Vec<ImagePayload>> {
    let mut payloads = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if input.is_dir() {
            payloads.extend(scan_folder(input)?);
        } else if input.is_file() {
            payloads.push(read_payload(input)?);
        } else {
            return Err(PanelError::FileNotFound(input.display().to_string()));
        }
    }
    Ok(payloads)
}

fn scan_folder(folder: &Path) -> Result<Vec<ImagePayload>> {
    let mut paths: Vec<_> = WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .map(|ext| is_image_extension(&ext.to_string_lossy()))
                .unwrap_or(false)
        })
        .collect();

    // ファイル名でソート
    paths.sort_by_key(|path| path.file_name().map(|n| n.to_os_string()));

    paths.iter().map(|path| read_payload(path)).collect()
}

fn read_payload(path: &Path) -> Result<ImagePayload> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(ImagePayload { name, bytes })
}

/// ペイロードをデコードし、寸法と表示用ロケータを付ける
///
/// デコードに失敗したものは除外する（部分的なアイテムは作らない）。順序は維持する。
pub fn decode_payloads(payloads: Vec<ImagePayload>) -> Vec<NewItem> {
    payloads
        .into_par_iter()
        .filter_map(|payload| match decode_payload(&payload) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!(file = %payload.name, error = %err, "skipping undecodable image");
                None
            }
        })
        .collect()
}

fn decode_payload(payload: &ImagePayload) -> std::result::Result<NewItem, image::ImageError> {
    let format = image::guess_format(&payload.bytes)?;
    let decoded = image::load_from_memory_with_format(&payload.bytes, format)?;
    Ok(NewItem {
        file_name: payload.name.clone(),
        source: Arc::from(payload.bytes.as_slice()),
        display_url: data_uri(mime_type(format), &payload.bytes),
        natural_width: decoded.width(),
        natural_height: decoded.height(),
    })
}

fn mime_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// `data:{mime};base64,...`
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn test_is_image_extension() {
        assert!(is_image_extension("png"));
        assert!(is_image_extension("JPG"));
        assert!(!is_image_extension("txt"));
        assert!(!is_image_extension("pdf"));
    }

    #[test]
    fn test_decode_drops_malformed() {
        let payloads = vec![
            ImagePayload { name: "a.png".into(), bytes: png_bytes(4, 3) },
            ImagePayload { name: "broken.png".into(), bytes: b"not an image".to_vec() },
            ImagePayload { name: "b.png".into(), bytes: png_bytes(2, 5) },
        ];
        let items = decode_payloads(payloads);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].file_name, "a.png");
        assert_eq!((items[0].natural_width, items[0].natural_height), (4, 3));
        assert_eq!(items[1].file_name, "b.png");
        assert!(items[1].display_url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_read_inputs_folder_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("c.png"), png_bytes(1, 1)).unwrap();
        std::fs::write(dir.path().join("a.png"), png_bytes(1, 1)).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "text").unwrap();

        let payloads = read_inputs(&[dir.path()]).unwrap();
        let names: Vec<&str> = payloads.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "c.png"]);
    }

    #[test]
    fn test_read_inputs_missing() {
        let result = read_inputs(&[Path::new("/nonexistent/x.png")]);
        assert!(matches!(result, Err(PanelError::FileNotFound(_))));
    }

    #[test]
    fn test_data_uri() {
        assert_eq!(data_uri("image/png", b"abc"), "data:image/png;base64,YWJj");
    }
}
