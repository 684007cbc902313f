//! グリッドのラスタライズ
//!
//! シーンの行・セルを固定サイズのセルに並べて1枚の画像にする。
//! 画像は縦横比を保ったままセル内に収め、中央に置く。
//! キャプションは組み込みの8x8ビットマップフォントで欄に書き込む。

use super::RasterOptions;
use crate::error::{PanelError, Result};
use async_trait::async_trait;
use figure_panel_common::{parse_hex_color, CaptionConfig, NodeId, NodeKind, Scene};
use font8x8::{UnicodeFonts, BASIC_FONTS, GREEK_FONTS, HIRAGANA_FONTS, LATIN_FONTS};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// シーンの部分木を画像にする
#[async_trait(?Send)]
pub trait Rasterizer {
    async fn rasterize(&self, scene: &Scene, root: NodeId, options: &RasterOptions) -> Result<RgbaImage>;
}

const SLOT_BORDER: Rgba<u8> = Rgba([204, 204, 204, 255]);
const REMOVE_BUTTON: Rgba<u8> = Rgba([220, 53, 69, 255]);
const REMOVE_BUTTON_SIZE_PX: u32 = 20;
const GLYPH_PX: u32 = 8;
const CAPTION_INSET_PX: u32 = 4;
const CAPTION_FALLBACK_COLOR: Rgba<u8> = Rgba([51, 51, 51, 255]);

/// 固定セルサイズのグリッド描画
#[derive(Debug, Clone, Copy)]
pub struct GridRasterizer {
    /// セル幅（1x換算px）
    pub cell_width: u32,
    /// 画像欄の高さ（1x換算px）
    pub image_height: u32,
}

impl Default for GridRasterizer {
    fn default() -> Self {
        Self {
            cell_width: 240,
            image_height: 200,
        }
    }
}

/// 1セル分の寸法（倍率適用済み）
struct Metrics {
    scale: u32,
    cell_width: u32,
    image_height: u32,
    caption_height: u32,
    /// 1グリフ点あたりのpx
    glyph_scale: u32,
    text_color: Rgba<u8>,
    gap: u32,
    padding: u32,
}

impl Metrics {
    fn new(rasterizer: &GridRasterizer, scene: &Scene, caption: &CaptionConfig, scale: u32) -> Self {
        Self {
            scale,
            cell_width: rasterizer.cell_width * scale,
            image_height: rasterizer.image_height * scale,
            caption_height: caption.min_line_height_px() * scale,
            glyph_scale: ((caption.font_size + GLYPH_PX / 2) / GLYPH_PX).max(1) * scale,
            text_color: parse_hex_color(&caption.color)
                .map(|[r, g, b]| Rgba([r, g, b, 255]))
                .unwrap_or(CAPTION_FALLBACK_COLOR),
            gap: scene.layout.gap * scale,
            padding: scene.layout.padding * scale,
        }
    }
}

struct RowPlan {
    cells: Vec<NodeId>,
    height: u32,
}

fn drawable(scene: &Scene, id: NodeId, options: &RasterOptions) -> bool {
    let node = scene.node(id);
    node.visible && !(options.ignore)(node)
}

fn drawable_children<'a>(
    scene: &'a Scene,
    id: NodeId,
    options: &'a RasterOptions,
) -> impl Iterator<Item = NodeId> + 'a {
    scene
        .node(id)
        .children()
        .iter()
        .copied()
        .filter(move |child| drawable(scene, *child, options))
}

impl GridRasterizer {
    pub fn new(cell_width: u32, image_height: u32) -> Self {
        Self {
            cell_width,
            image_height,
        }
    }

    fn cell_height(&self, scene: &Scene, cell: NodeId, options: &RasterOptions, m: &Metrics) -> u32 {
        match scene.node(cell).kind {
            NodeKind::EmptySlot { .. } => m.image_height,
            _ => drawable_children(scene, cell, options)
                .map(|child| match scene.node(child).kind {
                    NodeKind::Image { .. } => m.image_height,
                    NodeKind::Caption { .. } => m.caption_height,
                    _ => 0,
                })
                .sum(),
        }
    }

    fn plan_rows(&self, scene: &Scene, root: NodeId, options: &RasterOptions, m: &Metrics) -> Vec<RowPlan> {
        drawable_children(scene, root, options)
            .filter(|row| matches!(scene.node(*row).kind, NodeKind::Row { .. }))
            .filter_map(|row| {
                let cells: Vec<NodeId> = drawable_children(scene, row, options)
                    .filter(|cell| {
                        matches!(
                            scene.node(*cell).kind,
                            NodeKind::Cell { .. } | NodeKind::EmptySlot { .. }
                        )
                    })
                    .collect();
                if cells.is_empty() {
                    return None;
                }
                let height = cells
                    .iter()
                    .map(|cell| self.cell_height(scene, *cell, options, m))
                    .max()
                    .unwrap_or(0);
                Some(RowPlan { cells, height })
            })
            .collect()
    }
}

/// 描画対象の画像をまとめてデコード・縮小する
fn decode_images(
    scene: &Scene,
    rows: &[RowPlan],
    options: &RasterOptions,
    m: &Metrics,
) -> Result<HashMap<NodeId, RgbaImage>> {
    let sources: Vec<(NodeId, &[u8])> = rows
        .iter()
        .flat_map(|row| row.cells.iter())
        .flat_map(|cell| drawable_children(scene, *cell, options))
        .filter_map(|child| match &scene.node(child).kind {
            NodeKind::Image { source, .. } => Some((child, &source[..])),
            _ => None,
        })
        .collect();

    sources
        .into_par_iter()
        .map(|(id, bytes)| -> Result<(NodeId, RgbaImage)> {
            let decoded = image::load_from_memory(bytes)
                .map_err(|e| PanelError::RasterizationFailed(format!("画像のデコードに失敗: {}", e)))?;
            let fitted = decoded
                .resize(m.cell_width, m.image_height, FilterType::Triangle)
                .to_rgba8();
            Ok((id, fitted))
        })
        .collect()
}

fn draw_outline(canvas: &mut RgbaImage, x: u32, y: u32, width: u32, height: u32, thickness: u32, color: Rgba<u8>) {
    let (cw, ch) = canvas.dimensions();
    for py in y..(y + height).min(ch) {
        for px in x..(x + width).min(cw) {
            let edge = px < x + thickness
                || py < y + thickness
                || px + thickness >= x + width
                || py + thickness >= y + height;
            if edge {
                canvas.put_pixel(px, py, color);
            }
        }
    }
}

fn fill_rect(canvas: &mut RgbaImage, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>) {
    let (cw, ch) = canvas.dimensions();
    for py in y..(y + height).min(ch) {
        for px in x..(x + width).min(cw) {
            canvas.put_pixel(px, py, color);
        }
    }
}

fn glyph(ch: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| GREEK_FONTS.get(ch))
        .or_else(|| HIRAGANA_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
}

/// 1行の文字列を `(x, y)` から描く。`max_width` を超える文字は描かない
fn draw_text(canvas: &mut RgbaImage, text: &str, x: u32, y: u32, max_width: u32, scale: u32, color: Rgba<u8>) {
    let advance = GLYPH_PX * scale;
    let right = x + max_width;
    let mut cursor_x = x;
    for ch in text.chars() {
        if cursor_x + advance > right {
            break;
        }
        if let Some(rows) = glyph(ch) {
            for (row_idx, bits) in rows.iter().enumerate() {
                for col_idx in 0..GLYPH_PX {
                    // 最下位ビットが左端
                    if (*bits >> col_idx) & 1 == 1 {
                        fill_rect(
                            canvas,
                            cursor_x + col_idx * scale,
                            y + row_idx as u32 * scale,
                            scale,
                            scale,
                            color,
                        );
                    }
                }
            }
        }
        cursor_x += advance;
    }
}

#[async_trait(?Send)]
impl Rasterizer for GridRasterizer {
    async fn rasterize(&self, scene: &Scene, root: NodeId, options: &RasterOptions) -> Result<RgbaImage> {
        let m = Metrics::new(self, scene, &scene.caption_style, options.scale.factor());
        let rows = self.plan_rows(scene, root, options, &m);
        let columns = rows.iter().map(|row| row.cells.len() as u32).max().unwrap_or(0);
        if columns == 0 {
            return Err(PanelError::RasterizationFailed("描画できる要素がありません".into()));
        }

        let width = m.padding * 2 + columns * m.cell_width + (columns - 1) * m.gap;
        let height = m.padding * 2
            + rows.iter().map(|row| row.height).sum::<u32>()
            + (rows.len() as u32 - 1) * m.gap;
        debug!(width, height, rows = rows.len(), columns, "rasterizing grid");

        let images = decode_images(scene, &rows, options, &m)?;
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba(options.background.rgba()));

        let mut y = m.padding;
        for row in &rows {
            let mut x = m.padding;
            for cell in &row.cells {
                if let NodeKind::EmptySlot { .. } = scene.node(*cell).kind {
                    draw_outline(&mut canvas, x, y, m.cell_width, m.image_height, 2 * m.scale, SLOT_BORDER);
                    x += m.cell_width + m.gap;
                    continue;
                }

                let mut cursor = y;
                for child in drawable_children(scene, *cell, options) {
                    match &scene.node(child).kind {
                        NodeKind::Caption { text, .. } => {
                            if !text.trim().is_empty() {
                                let inset = CAPTION_INSET_PX * m.scale;
                                let glyph_height = GLYPH_PX * m.glyph_scale;
                                let ty = cursor + m.caption_height.saturating_sub(glyph_height) / 2;
                                draw_text(
                                    &mut canvas,
                                    text.trim(),
                                    x + inset,
                                    ty,
                                    m.cell_width.saturating_sub(inset * 2),
                                    m.glyph_scale,
                                    m.text_color,
                                );
                            }
                            cursor += m.caption_height;
                        }
                        NodeKind::Image { .. } => {
                            if let Some(fitted) = images.get(&child) {
                                let ox = x + (m.cell_width - fitted.width().min(m.cell_width)) / 2;
                                let oy = cursor + (m.image_height - fitted.height().min(m.image_height)) / 2;
                                imageops::overlay(&mut canvas, fitted, ox as i64, oy as i64);
                            }
                            cursor += m.image_height;
                        }
                        NodeKind::RemoveButton { .. } => {
                            let size = REMOVE_BUTTON_SIZE_PX * m.scale;
                            fill_rect(&mut canvas, x + m.cell_width.saturating_sub(size), y, size, size, REMOVE_BUTTON);
                        }
                        _ => {}
                    }
                }
                x += m.cell_width + m.gap;
            }
            y += row.height + m.gap;
        }

        Ok(canvas)
    }
}
