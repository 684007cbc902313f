use crate::cli::{Background, ExportFormat, Scale};
use crate::error::{PanelError, Result};
use figure_panel_common::{CaptionConfig, LayoutConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 既定値の設定。読み込みのみで、セッション中の変更は書き戻さない
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub format: ExportFormat,
    pub scale: Scale,
    pub background: Background,
    /// 出力ファイル名（拡張子なし）
    pub filename: String,
    /// ラスタライズ時のセル幅（px, 1x換算）
    pub cell_width: u32,
    /// ラスタライズ時の画像欄の高さ（px, 1x換算）
    pub image_height: u32,
    /// 編集用UIを隠してからキャプチャするまでの待ち時間（ms）。0は1tick譲るだけ
    pub settle_ms: u64,
    pub layout: LayoutConfig,
    pub caption: CaptionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            scale: Scale::X2,
            background: Background::White,
            filename: "figure-layout".into(),
            cell_width: 240,
            image_height: 200,
            settle_ms: 100,
            layout: LayoutConfig::default(),
            caption: CaptionConfig::default(),
        }
    }
}

impl Config {
    /// 既定の場所から読み込む。ファイルが無ければ既定値
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PanelError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PanelError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("figure-panel").join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.filename.trim().is_empty() {
            return Err(PanelError::Config("ファイル名が空です".into()));
        }
        if self.cell_width == 0 || self.image_height == 0 {
            return Err(PanelError::Config("セルの寸法は1px以上にしてください".into()));
        }
        self.layout.validate()?;
        self.caption.validate()?;
        Ok(())
    }
}
