//! シーンのキャプチャ
//!
//! 1. エクスポート対象のグリッドを探す（無ければ `ContentNotFound`）
//! 2. 編集用UIを隠す（ガードが元の表示状態を記録）
//! 3. 表示の反映を待つ
//! 4. ラスタライズ（ラスタライザ側でも編集用UIを除外）
//! 5. ガードの破棄で表示状態を戻す（失敗時も必ず戻る）

pub mod raster;

pub use raster::{GridRasterizer, Rasterizer};

use crate::cli::{Background, Scale};
use crate::error::{PanelError, Result};
use figure_panel_common::{Node, NodeId, Scene};
use image::RgbaImage;
use std::ops::Deref;
use std::time::Duration;
use tracing::debug;

/// ラスタライズ設定
#[derive(Debug, Clone, Copy)]
pub struct RasterOptions {
    pub scale: Scale,
    pub background: Background,
    /// true を返したノードは子も含めて描画しない
    pub ignore: fn(&Node) -> bool,
}

impl RasterOptions {
    pub fn new(scale: Scale, background: Background) -> Self {
        Self {
            scale,
            background,
            ignore: Node::is_transient,
        }
    }
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self::new(Scale::default(), Background::default())
    }
}

/// 編集用UIを隠している間だけ生きるガード
///
/// 破棄時に、隠す前の表示状態へ1件ずつ戻す。
pub struct TransientUiGuard<'a> {
    scene: &'a mut Scene,
    saved: Vec<(NodeId, bool)>,
}

impl<'a> TransientUiGuard<'a> {
    pub fn hide(scene: &'a mut Scene, from: NodeId) -> Self {
        let saved: Vec<(NodeId, bool)> = scene
            .transient_nodes(from)
            .into_iter()
            .map(|id| (id, scene.node(id).visible))
            .collect();
        for (id, _) in &saved {
            scene.set_visible(*id, false);
        }
        debug!(count = saved.len(), "transient ui hidden");
        Self { scene, saved }
    }

    pub fn hidden_count(&self) -> usize {
        self.saved.len()
    }
}

impl Deref for TransientUiGuard<'_> {
    type Target = Scene;

    fn deref(&self) -> &Scene {
        self.scene
    }
}

impl Drop for TransientUiGuard<'_> {
    fn drop(&mut self) {
        for (id, visible) in self.saved.drain(..) {
            self.scene.set_visible(id, visible);
        }
        debug!("transient ui restored");
    }
}

/// 隠した結果が反映されるまで待つ。0なら1tickだけ譲る
async fn settle(delay: Duration) {
    if delay.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(delay).await;
    }
}

/// シーンのグリッド部分を画像にする
pub async fn capture<R>(
    scene: &mut Scene,
    rasterizer: &R,
    options: &RasterOptions,
    settle_delay: Duration,
) -> Result<RgbaImage>
where
    R: Rasterizer + ?Sized,
{
    let content = scene
        .find_content_root(scene.root())
        .ok_or(PanelError::ContentNotFound)?;

    let guard = TransientUiGuard::hide(scene, content);
    settle(settle_delay).await;
    let raster = rasterizer.rasterize(&guard, content, options).await;
    drop(guard);

    let raster = raster?;
    debug!(width = raster.width(), height = raster.height(), "captured");
    Ok(raster)
}
