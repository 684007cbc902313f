//! 成果物の出力先
//!
//! ファイル保存とクリップボード書き込み。どれも失敗しうるので、
//! 呼び出し側（エクスポート処理）がフォールバックを決める。

use crate::error::{PanelError, Result};
use async_trait::async_trait;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::debug;

#[async_trait(?Send)]
pub trait ArtifactSink {
    /// `filename` で保存する。保存先のパスを返す
    async fn save_file(&self, bytes: &[u8], filename: &str) -> Result<PathBuf>;

    async fn write_clipboard_image(&self, image: &RgbaImage) -> Result<()>;

    async fn write_clipboard_text(&self, text: &str) -> Result<()>;
}

/// ディレクトリへの保存 +（機能 `system-clipboard` 有効時）OSクリップボード
#[derive(Debug, Clone)]
pub struct FsSink {
    out_dir: PathBuf,
}

impl FsSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

#[async_trait(?Send)]
impl ArtifactSink for FsSink {
    async fn save_file(&self, bytes: &[u8], filename: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.out_dir)
            .await
            .map_err(|e| PanelError::SaveFailed(format!("{}: {}", self.out_dir.display(), e)))?;
        let path = self.out_dir.join(filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| PanelError::SaveFailed(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), size = bytes.len(), "artifact saved");
        Ok(path)
    }

    async fn write_clipboard_image(&self, image: &RgbaImage) -> Result<()> {
        system_clipboard::set_image(image)
    }

    async fn write_clipboard_text(&self, text: &str) -> Result<()> {
        system_clipboard::set_text(text)
    }
}

#[cfg(feature = "system-clipboard")]
mod system_clipboard {
    use crate::error::{PanelError, Result};
    use image::RgbaImage;
    use std::borrow::Cow;

    fn open() -> Result<arboard::Clipboard> {
        arboard::Clipboard::new().map_err(|_| PanelError::ClipboardUnavailable)
    }

    pub fn set_image(image: &RgbaImage) -> Result<()> {
        // arboard は RGBA 順の生データを受け取る
        let data = arboard::ImageData {
            width: image.width() as usize,
            height: image.height() as usize,
            bytes: Cow::Borrowed(image.as_raw().as_slice()),
        };
        open()?
            .set_image(data)
            .map_err(|e| PanelError::ClipboardWriteFailed(e.to_string()))
    }

    pub fn set_text(text: &str) -> Result<()> {
        open()?
            .set_text(text.to_string())
            .map_err(|e| PanelError::ClipboardWriteFailed(e.to_string()))
    }
}

#[cfg(not(feature = "system-clipboard"))]
mod system_clipboard {
    use crate::error::{PanelError, Result};
    use image::RgbaImage;

    pub fn set_image(_image: &RgbaImage) -> Result<()> {
        Err(PanelError::ClipboardUnavailable)
    }

    pub fn set_text(_text: &str) -> Result<()> {
        Err(PanelError::ClipboardUnavailable)
    }
}
