use super::png::encode_png;
use crate::error::Result;
use crate::sink::ArtifactSink;
use crate::upload::data_uri;
use image::RgbaImage;
use std::path::PathBuf;
use tracing::warn;

/// クリップボードコピーの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardOutcome {
    /// 画像そのものをコピーした
    Image,
    /// 画像の代わりに data URI をテキストでコピーした
    TextLocator,
    /// どちらも失敗したので `{filename}_copy.png` を保存した
    Downloaded(PathBuf),
}

impl ClipboardOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, ClipboardOutcome::Downloaded(_))
    }
}

/// 画像 → テキスト → ダウンロード の順に試す
///
/// PNGの生成に失敗した場合はどれも試さずに `BlobCreationFailed` を返す。
pub async fn copy_with_fallback<S>(sink: &S, raster: &RgbaImage, filename: &str) -> Result<ClipboardOutcome>
where
    S: ArtifactSink + ?Sized,
{
    let png = encode_png(raster)?;

    match sink.write_clipboard_image(raster).await {
        Ok(()) => return Ok(ClipboardOutcome::Image),
        Err(err) => warn!(error = %err, "clipboard image write failed, trying text"),
    }

    match sink.write_clipboard_text(&data_uri("image/png", &png)).await {
        Ok(()) => return Ok(ClipboardOutcome::TextLocator),
        Err(err) => warn!(error = %err, "clipboard text write failed, downloading instead"),
    }

    let path = sink.save_file(&png, &format!("{}_copy.png", filename)).await?;
    Ok(ClipboardOutcome::Downloaded(path))
}
