pub mod png;
pub mod pdf;
pub mod clipboard;

pub use clipboard::ClipboardOutcome;

use crate::capture::{capture, RasterOptions, Rasterizer};
use crate::cli::{Background, ExportFormat, Scale};
use crate::config::Config;
use crate::error::{PanelError, Result};
use crate::notify::Notifier;
use crate::sink::ArtifactSink;
use figure_panel_common::Scene;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub const MSG_PNG_SAVED: &str = "PNG画像をダウンロードしました！";
pub const MSG_PDF_SAVED: &str = "PDF文書をダウンロードしました！";
pub const MSG_CLIPBOARD_IMAGE: &str = "画像がクリップボードにコピーされました！";
pub const MSG_CLIPBOARD_TEXT: &str = "画像URLがクリップボードにコピーされました！";
pub const MSG_CLIPBOARD_DOWNLOADED: &str = "クリップボードコピーに失敗したため、ダウンロードしました。";
pub const MSG_EXPORT_FAILED: &str = "エクスポートに失敗しました。";
pub const MSG_CLIPBOARD_FAILED: &str = "クリップボードへのコピーに失敗しました。";
pub const MSG_NO_IMAGES: &str = "エクスポートする画像がありません。";
pub const MSG_BUSY: &str = "別のエクスポートを実行中です。";

/// 出力の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Png,
    Pdf,
    Clipboard,
}

impl From<ExportFormat> for ExportKind {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Png => ExportKind::Png,
            ExportFormat::Pdf => ExportKind::Pdf,
        }
    }
}

/// エクスポート要求（呼び出しごとの指定。保存はしない）
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub kind: ExportKind,
    /// 拡張子なしのファイル名
    pub filename: String,
    pub scale: Scale,
    pub background: Background,
}

impl ExportRequest {
    pub fn new(kind: ExportKind, filename: impl Into<String>) -> Self {
        Self {
            kind,
            filename: filename.into(),
            scale: Scale::default(),
            background: Background::default(),
        }
    }

    pub fn from_config(config: &Config, kind: ExportKind) -> Self {
        Self {
            kind,
            filename: config.filename.clone(),
            scale: config.scale,
            background: config.background,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved { kind: ExportKind, path: PathBuf },
    Clipboard(ClipboardOutcome),
}

impl ExportOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            ExportOutcome::Saved { kind: ExportKind::Pdf, .. } => MSG_PDF_SAVED,
            ExportOutcome::Saved { .. } => MSG_PNG_SAVED,
            ExportOutcome::Clipboard(ClipboardOutcome::Image) => MSG_CLIPBOARD_IMAGE,
            ExportOutcome::Clipboard(ClipboardOutcome::TextLocator) => MSG_CLIPBOARD_TEXT,
            ExportOutcome::Clipboard(ClipboardOutcome::Downloaded(_)) => MSG_CLIPBOARD_DOWNLOADED,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ExportOutcome::Clipboard(outcome) if outcome.is_degraded())
    }

    /// 保存したファイル（クリップボードへ入った場合は無し）
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ExportOutcome::Saved { path, .. } => Some(path),
            ExportOutcome::Clipboard(ClipboardOutcome::Downloaded(path)) => Some(path),
            ExportOutcome::Clipboard(_) => None,
        }
    }
}

fn failure_message(kind: ExportKind, err: &PanelError) -> &'static str {
    match (kind, err) {
        (_, PanelError::NoImages) => MSG_NO_IMAGES,
        (_, PanelError::Busy) => MSG_BUSY,
        (ExportKind::Clipboard, _) => MSG_CLIPBOARD_FAILED,
        _ => MSG_EXPORT_FAILED,
    }
}

/// キャプチャ → 出力 をまとめて行う
///
/// 種類に関係なく1本のロックで直列化する。実行中に来た要求は待たずに `Busy` で返す。
/// 1回の要求につき通知はちょうど1回。
pub struct ExportPipeline<R, S, N> {
    rasterizer: R,
    sink: S,
    notifier: N,
    lock: Mutex<()>,
    settle: Duration,
}

impl<R, S, N> ExportPipeline<R, S, N>
where
    R: Rasterizer,
    S: ArtifactSink,
    N: Notifier,
{
    pub fn new(rasterizer: R, sink: S, notifier: N) -> Self {
        Self {
            rasterizer,
            sink,
            notifier,
            lock: Mutex::new(()),
            settle: Duration::from_millis(100),
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn is_busy(&self) -> bool {
        self.lock.try_lock().is_err()
    }

    pub async fn export(&self, scene: &mut Scene, request: &ExportRequest) -> Result<ExportOutcome> {
        let Ok(_token) = self.lock.try_lock() else {
            warn!(kind = ?request.kind, "export rejected while another is running");
            self.notifier.show_error(MSG_BUSY);
            return Err(PanelError::Busy);
        };

        match self.run(scene, request).await {
            Ok(outcome) => {
                if outcome.is_degraded() {
                    self.notifier.show_error(outcome.message());
                } else {
                    self.notifier.show_success(outcome.message());
                }
                info!(kind = ?request.kind, path = ?outcome.path(), "export finished");
                Ok(outcome)
            }
            Err(err) => {
                warn!(kind = ?request.kind, category = ?err.category(), error = %err, "export failed");
                self.notifier.show_error(failure_message(request.kind, &err));
                Err(err)
            }
        }
    }

    async fn run(&self, scene: &mut Scene, request: &ExportRequest) -> Result<ExportOutcome> {
        let content = scene
            .find_content_root(scene.root())
            .ok_or(PanelError::ContentNotFound)?;
        if scene.item_count(content) == 0 {
            return Err(PanelError::NoImages);
        }

        let options = RasterOptions::new(request.scale, request.background);
        let raster = capture(scene, &self.rasterizer, &options, self.settle).await?;

        match request.kind {
            ExportKind::Png => {
                let bytes = png::encode_png(&raster)?;
                let path = self.sink.save_file(&bytes, &format!("{}.png", request.filename)).await?;
                Ok(ExportOutcome::Saved { kind: request.kind, path })
            }
            ExportKind::Pdf => {
                let bytes = pdf::render_pdf(&raster, &request.filename)?;
                let path = self.sink.save_file(&bytes, &format!("{}.pdf", request.filename)).await?;
                Ok(ExportOutcome::Saved { kind: request.kind, path })
            }
            ExportKind::Clipboard => clipboard::copy_with_fallback(&self.sink, &raster, &request.filename)
                .await
                .map(ExportOutcome::Clipboard),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_messages() {
        assert_eq!(failure_message(ExportKind::Png, &PanelError::NoImages), MSG_NO_IMAGES);
        assert_eq!(failure_message(ExportKind::Pdf, &PanelError::ContentNotFound), MSG_EXPORT_FAILED);
        assert_eq!(
            failure_message(ExportKind::Clipboard, &PanelError::BlobCreationFailed("x".into())),
            MSG_CLIPBOARD_FAILED
        );
        assert_eq!(failure_message(ExportKind::Clipboard, &PanelError::Busy), MSG_BUSY);
    }

    #[test]
    fn test_outcome_messages() {
        let saved = ExportOutcome::Saved {
            kind: ExportKind::Pdf,
            path: PathBuf::from("a.pdf"),
        };
        assert_eq!(saved.message(), MSG_PDF_SAVED);
        assert!(!saved.is_degraded());

        let degraded = ExportOutcome::Clipboard(ClipboardOutcome::Downloaded(PathBuf::from("a_copy.png")));
        assert!(degraded.is_degraded());
        assert_eq!(degraded.path(), Some(&PathBuf::from("a_copy.png")));
        assert_eq!(ExportOutcome::Clipboard(ClipboardOutcome::TextLocator).path(), None);
    }
}
