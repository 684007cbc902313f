//! レイアウト設定モジュール
//!
//! グリッドの行容量、PDFページ寸法、余白・キャプション設定を定義する。

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

// ============================================
// グリッド
// ============================================

/// 1行あたりの画像数
pub const ROW_CAPACITY: usize = 4;

// ============================================
// PDFページ（A4横）
// ============================================

/// A4横サイズ（mm）
pub const A4_LANDSCAPE_WIDTH_MM: f32 = 297.0;
pub const A4_LANDSCAPE_HEIGHT_MM: f32 = 210.0;

/// mm → pt変換 (1mm = 72/25.4 pt ≈ 2.835pt)
pub const MM_TO_PT: f32 = 72.0 / 25.4;

/// mm → pt 変換
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * MM_TO_PT
}

/// ページ幅に合わせたときの画像高さ（mm）。縦横比を維持する
pub fn fitted_height_mm(page_width_mm: f32, image_width_px: u32, image_height_px: u32) -> f32 {
    if image_width_px == 0 {
        return 0.0;
    }
    image_height_px as f32 * page_width_mm / image_width_px as f32
}

// ============================================
// 余白・キャプション設定
// ============================================

pub const MAX_SPACING_PX: u32 = 100;
pub const MIN_FONT_SIZE_PX: u32 = 8;
pub const MAX_FONT_SIZE_PX: u32 = 32;

/// グリッドの余白設定（px）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// 画像間の余白
    pub gap: u32,
    /// 外側の余白
    pub padding: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { gap: 10, padding: 20 }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<()> {
        if self.gap > MAX_SPACING_PX {
            return Err(Error::Config(format!("gap {} は 0〜{} の範囲で指定してください", self.gap, MAX_SPACING_PX)));
        }
        if self.padding > MAX_SPACING_PX {
            return Err(Error::Config(format!(
                "padding {} は 0〜{} の範囲で指定してください",
                self.padding, MAX_SPACING_PX
            )));
        }
        Ok(())
    }
}

/// キャプション位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionPosition {
    Top,
    #[default]
    Bottom,
}

impl std::str::FromStr for CaptionPosition {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top" => Ok(CaptionPosition::Top),
            "bottom" => Ok(CaptionPosition::Bottom),
            _ => Err(format!("Unknown caption position: {}. Use top or bottom", s)),
        }
    }
}

/// キャプション表示設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptionConfig {
    /// フォントサイズ（px）
    pub font_size: u32,
    /// 文字色（#rrggbb）
    pub color: String,
    pub position: CaptionPosition,
    pub font_family: String,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            font_size: 14,
            color: "#333333".into(),
            position: CaptionPosition::Bottom,
            font_family: "Arial, sans-serif".into(),
        }
    }
}

impl CaptionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_FONT_SIZE_PX..=MAX_FONT_SIZE_PX).contains(&self.font_size) {
            return Err(Error::Config(format!(
                "フォントサイズ {} は {}〜{} の範囲で指定してください",
                self.font_size, MIN_FONT_SIZE_PX, MAX_FONT_SIZE_PX
            )));
        }
        parse_hex_color(&self.color)
            .ok_or_else(|| Error::Config(format!("色の形式が不正です: {}", self.color)))?;
        Ok(())
    }

    /// キャプション欄の最小高さ（px）: max(fontSize * 1.5, 24)
    pub fn min_line_height_px(&self) -> u32 {
        ((self.font_size as f32 * 1.5).ceil() as u32).max(24)
    }
}

/// `#rrggbb` を RGB に変換
pub fn parse_hex_color(color: &str) -> Option<[u8; 3]> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}
