//! エクスポート処理の統合テスト

use async_trait::async_trait;
use figure_panel::capture::{GridRasterizer, RasterOptions, Rasterizer};
use figure_panel::cli::{Background, Scale};
use figure_panel::error::{ErrorCategory, PanelError, Result};
use figure_panel::export::*;
use figure_panel::notify::Notifier;
use figure_panel::panel::Panel;
use figure_panel::sink::{ArtifactSink, FsSink};
use figure_panel_common::{ImagePayload, NodeId, Scene};
use image::{ImageFormat, Rgba, RgbaImage};
use std::cell::RefCell;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

// ============================================
// テスト用の出力先・通知
// ============================================

#[derive(Default)]
struct RecordingNotifier {
    events: RefCell<Vec<(bool, String)>>,
}

impl RecordingNotifier {
    fn events(&self) -> Vec<(bool, String)> {
        self.events.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show_success(&self, message: &str) {
        self.events.borrow_mut().push((true, message.to_string()));
    }

    fn show_error(&self, message: &str) {
        self.events.borrow_mut().push((false, message.to_string()));
    }
}

#[derive(Default)]
struct RecordingSink {
    fail_image: bool,
    fail_text: bool,
    saved: RefCell<Vec<(String, Vec<u8>)>>,
    image: RefCell<Option<(u32, u32)>>,
    text: RefCell<Option<String>>,
}

#[async_trait(?Send)]
impl ArtifactSink for RecordingSink {
    async fn save_file(&self, bytes: &[u8], filename: &str) -> Result<PathBuf> {
        self.saved.borrow_mut().push((filename.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(filename))
    }

    async fn write_clipboard_image(&self, image: &RgbaImage) -> Result<()> {
        if self.fail_image {
            return Err(PanelError::ClipboardWriteFailed("denied".into()));
        }
        *self.image.borrow_mut() = Some(image.dimensions());
        Ok(())
    }

    async fn write_clipboard_text(&self, text: &str) -> Result<()> {
        if self.fail_text {
            return Err(PanelError::ClipboardUnavailable);
        }
        *self.text.borrow_mut() = Some(text.to_string());
        Ok(())
    }
}

struct FailingRasterizer;

#[async_trait(?Send)]
impl Rasterizer for FailingRasterizer {
    async fn rasterize(&self, _scene: &Scene, _root: NodeId, _options: &RasterOptions) -> Result<RgbaImage> {
        Err(PanelError::RasterizationFailed("canvas tainted".into()))
    }
}

// ============================================
// ヘルパー
// ============================================

fn payload(name: &str, color: [u8; 4]) -> ImagePayload {
    let img = RgbaImage::from_pixel(8, 6, Rgba(color));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
    ImagePayload {
        name: name.to_string(),
        bytes,
    }
}

fn scene_with(count: usize) -> Scene {
    let mut panel = Panel::default();
    panel.add_images(
        (0..count)
            .map(|i| payload(&format!("{}.png", i), [200, 10, 10, 255]))
            .collect(),
    );
    panel.render_scene().unwrap()
}

fn visibility(scene: &Scene) -> Vec<bool> {
    scene
        .descendants(scene.root())
        .into_iter()
        .map(|id| scene.node(id).visible)
        .collect()
}

fn pipeline<S: ArtifactSink>(sink: S) -> ExportPipeline<GridRasterizer, S, RecordingNotifier> {
    ExportPipeline::new(GridRasterizer::new(40, 30), sink, RecordingNotifier::default()).with_settle(Duration::ZERO)
}

fn request(kind: ExportKind) -> ExportRequest {
    ExportRequest {
        kind,
        filename: "figure".into(),
        scale: Scale::X1,
        background: Background::White,
    }
}

// ============================================
// ファイル出力
// ============================================

#[tokio::test]
async fn test_png_export_to_directory() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(FsSink::new(dir.path()));
    let mut scene = scene_with(5);
    let before = visibility(&scene);

    let outcome = pipeline.export(&mut scene, &request(ExportKind::Png)).await.unwrap();

    let path = dir.path().join("figure.png");
    assert_eq!(outcome.path(), Some(&path));
    let decoded = image::open(&path).unwrap();
    assert!(decoded.width() > 0 && decoded.height() > 0);
    assert_eq!(visibility(&scene), before);
    assert_eq!(pipeline.notifier().events(), vec![(true, MSG_PNG_SAVED.to_string())]);
    assert!(!pipeline.is_busy());
}

#[tokio::test]
async fn test_pdf_export_to_directory() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(FsSink::new(dir.path()));
    let mut scene = scene_with(2);

    pipeline.export(&mut scene, &request(ExportKind::Pdf)).await.unwrap();

    let bytes = std::fs::read(dir.path().join("figure.pdf")).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(pipeline.notifier().events(), vec![(true, MSG_PDF_SAVED.to_string())]);
}

#[tokio::test]
async fn test_scale_multiplies_raster() {
    let pipeline = pipeline(RecordingSink::default());
    let mut scene = scene_with(1);

    let mut x1 = request(ExportKind::Png);
    x1.filename = "x1".into();
    let mut x2 = request(ExportKind::Png);
    x2.filename = "x2".into();
    x2.scale = Scale::X2;
    pipeline.export(&mut scene, &x1).await.unwrap();
    pipeline.export(&mut scene, &x2).await.unwrap();

    let saved = pipeline.sink().saved.borrow();
    let small = image::load_from_memory(&saved[0].1).unwrap();
    let large = image::load_from_memory(&saved[1].1).unwrap();
    assert_eq!(large.width(), small.width() * 2);
    assert_eq!(large.height(), small.height() * 2);
}

// ============================================
// クリップボードのフォールバック
// ============================================

#[tokio::test]
async fn test_clipboard_image() {
    let pipeline = pipeline(RecordingSink::default());
    let mut scene = scene_with(3);

    let outcome = pipeline.export(&mut scene, &request(ExportKind::Clipboard)).await.unwrap();

    assert_eq!(outcome, ExportOutcome::Clipboard(ClipboardOutcome::Image));
    assert!(pipeline.sink().image.borrow().is_some());
    assert!(pipeline.sink().saved.borrow().is_empty());
    assert_eq!(pipeline.notifier().events(), vec![(true, MSG_CLIPBOARD_IMAGE.to_string())]);
}

#[tokio::test]
async fn test_clipboard_falls_back_to_text() {
    let sink = RecordingSink {
        fail_image: true,
        ..Default::default()
    };
    let pipeline = pipeline(sink);
    let mut scene = scene_with(3);

    let outcome = pipeline.export(&mut scene, &request(ExportKind::Clipboard)).await.unwrap();

    assert_eq!(outcome, ExportOutcome::Clipboard(ClipboardOutcome::TextLocator));
    let text = pipeline.sink().text.borrow().clone().unwrap();
    assert!(text.starts_with("data:image/png;base64,"));
    assert_eq!(pipeline.notifier().events(), vec![(true, MSG_CLIPBOARD_TEXT.to_string())]);
}

#[tokio::test]
async fn test_clipboard_falls_back_to_download() {
    let sink = RecordingSink {
        fail_image: true,
        fail_text: true,
        ..Default::default()
    };
    let pipeline = pipeline(sink);
    let mut scene = scene_with(3);

    let outcome = pipeline.export(&mut scene, &request(ExportKind::Clipboard)).await.unwrap();

    assert!(outcome.is_degraded());
    assert_eq!(outcome.path(), Some(&PathBuf::from("figure_copy.png")));
    let saved = pipeline.sink().saved.borrow();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, "figure_copy.png");
    assert!(image::load_from_memory(&saved[0].1).is_ok());
    // 成功扱いにはしない。通知は1回だけ
    assert_eq!(
        pipeline.notifier().events(),
        vec![(false, MSG_CLIPBOARD_DOWNLOADED.to_string())]
    );
}

// ============================================
// 失敗時
// ============================================

#[tokio::test]
async fn test_rasterization_failure_restores_ui() {
    let pipeline = ExportPipeline::new(FailingRasterizer, RecordingSink::default(), RecordingNotifier::default())
        .with_settle(Duration::ZERO);
    let mut scene = scene_with(5);
    let content = scene.find_content_root(scene.root()).unwrap();
    let k = scene.transient_nodes(content).len();
    assert!(k > 0);
    let before = visibility(&scene);

    let err = pipeline
        .export(&mut scene, &request(ExportKind::Png))
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Rasterization);
    assert_eq!(visibility(&scene), before);
    assert!(pipeline.sink().saved.borrow().is_empty());
    assert_eq!(pipeline.notifier().events(), vec![(false, MSG_EXPORT_FAILED.to_string())]);
}

#[tokio::test]
async fn test_clipboard_rasterization_failure_message() {
    let pipeline = ExportPipeline::new(FailingRasterizer, RecordingSink::default(), RecordingNotifier::default())
        .with_settle(Duration::ZERO);
    let mut scene = scene_with(1);

    let result = pipeline.export(&mut scene, &request(ExportKind::Clipboard)).await;

    assert!(matches!(result, Err(PanelError::RasterizationFailed(_))));
    assert_eq!(pipeline.notifier().events(), vec![(false, MSG_CLIPBOARD_FAILED.to_string())]);
}

#[tokio::test]
async fn test_missing_content_root() {
    let pipeline = pipeline(RecordingSink::default());
    let mut scene = Scene::default();

    let err = pipeline
        .export(&mut scene, &request(ExportKind::Pdf))
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::ContentMissing);
    assert_eq!(pipeline.notifier().events(), vec![(false, MSG_EXPORT_FAILED.to_string())]);
}

#[tokio::test]
async fn test_empty_panel_is_not_exported() {
    let pipeline = pipeline(RecordingSink::default());
    let mut scene = scene_with(0);

    let result = pipeline.export(&mut scene, &request(ExportKind::Png)).await;

    assert!(matches!(result, Err(PanelError::NoImages)));
    assert!(pipeline.sink().saved.borrow().is_empty());
    assert_eq!(pipeline.notifier().events(), vec![(false, MSG_NO_IMAGES.to_string())]);
}

// ============================================
// 排他
// ============================================

#[tokio::test]
async fn test_second_export_is_busy() {
    let pipeline = pipeline(RecordingSink::default());
    let mut first = scene_with(2);
    let mut second = scene_with(2);
    let second_before = visibility(&second);
    let png = request(ExportKind::Png);
    let clipboard = request(ExportKind::Clipboard);

    let (a, b) = tokio::join!(
        pipeline.export(&mut first, &png),
        pipeline.export(&mut second, &clipboard),
    );

    assert!(a.is_ok());
    assert!(matches!(b, Err(PanelError::Busy)));
    // 拒否された側のシーンには一切触れない
    assert_eq!(visibility(&second), second_before);
    assert_eq!(pipeline.sink().saved.borrow().len(), 1);
    assert!(pipeline.sink().image.borrow().is_none());

    let events = pipeline.notifier().events();
    assert_eq!(events.len(), 2);
    assert!(events.contains(&(false, MSG_BUSY.to_string())));
    assert!(events.contains(&(true, MSG_PNG_SAVED.to_string())));
    assert!(!pipeline.is_busy());

    // 終了後はロックが解放され、次の要求は通る
    assert!(pipeline.export(&mut second, &png).await.is_ok());
    assert_eq!(pipeline.sink().saved.borrow().len(), 2);
}
