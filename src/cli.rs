use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "figure-panel")]
#[command(about = "論文用画像レイアウトツール: キャプション付きグリッドをPNG/PDF/クリップボードへ出力", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 設定ファイル（省略時: ~/.config/figure-panel/config.json）
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像を並べてパネルを作成し、エクスポート
    Compose {
        /// 画像ファイルまたはフォルダ（フォルダは直下の画像を名前順に追加）
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// キャプション "番号=テキスト"（番号は1始まり、数式は$...$）
        #[arg(short, long = "caption")]
        captions: Vec<String>,

        /// 並べ替え "移動元:移動先"（0始まり、ドロップと同じ規則）
        #[arg(short = 'm', long = "move")]
        moves: Vec<String>,

        /// 出力形式 (png/pdf)
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// ファイル保存の代わりにクリップボードへコピー
        #[arg(long)]
        clipboard: bool,

        /// 解像度倍率 (1/2/3)
        #[arg(short, long)]
        scale: Option<Scale>,

        /// 背景 (white/transparent)
        #[arg(short, long)]
        background: Option<Background>,

        /// ファイル名（拡張子なし）
        #[arg(short, long)]
        output: Option<String>,

        /// 出力ディレクトリ
        #[arg(short = 'd', long)]
        out_dir: Option<PathBuf>,

        /// 画像間の余白 (px)
        #[arg(long)]
        gap: Option<u32>,

        /// 外側の余白 (px)
        #[arg(long)]
        padding: Option<u32>,
    },

    /// 行分割を表示
    Layout {
        /// 画像ファイルまたはフォルダ
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// 設定を表示
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// 出力形式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Pdf,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(format!("Unknown format: {}. Use png or pdf", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Png => write!(f, "png"),
            ExportFormat::Pdf => write!(f, "pdf"),
        }
    }
}

/// 解像度倍率
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Scale {
    /// 標準 (1x)
    X1,
    /// 高解像度 (2x)（デフォルト）
    #[default]
    X2,
    /// 超高解像度 (3x)
    X3,
}

impl Scale {
    pub fn factor(&self) -> u32 {
        match self {
            Scale::X1 => 1,
            Scale::X2 => 2,
            Scale::X3 => 3,
        }
    }
}

impl TryFrom<u32> for Scale {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Scale::X1),
            2 => Ok(Scale::X2),
            3 => Ok(Scale::X3),
            _ => Err(format!("Unknown scale: {}. Use 1, 2, or 3", value)),
        }
    }
}

impl From<Scale> for u32 {
    fn from(scale: Scale) -> Self {
        scale.factor()
    }
}

impl std::str::FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches(['x', 'X']);
        let value: u32 = trimmed
            .parse()
            .map_err(|_| format!("Unknown scale: {}. Use 1, 2, or 3", s))?;
        Scale::try_from(value)
    }
}

impl std::fmt::Display for Scale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x", self.factor())
    }
}

/// 背景
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    #[default]
    White,
    Transparent,
}

impl Background {
    pub fn rgba(&self) -> [u8; 4] {
        match self {
            Background::White => [255, 255, 255, 255],
            Background::Transparent => [0, 0, 0, 0],
        }
    }
}

impl std::str::FromStr for Background {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "white" | "w" => Ok(Background::White),
            "transparent" | "t" | "none" => Ok(Background::Transparent),
            _ => Err(format!("Unknown background: {}. Use white or transparent", s)),
        }
    }
}

impl std::fmt::Display for Background {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Background::White => write!(f, "white"),
            Background::Transparent => write!(f, "transparent"),
        }
    }
}

/// "3=図1 $x^2$" → (3, "図1 $x^2$")
pub fn parse_caption_arg(arg: &str) -> Result<(usize, String), String> {
    let (seq, text) = arg
        .split_once('=')
        .ok_or_else(|| format!("キャプションは 番号=テキスト で指定してください: {}", arg))?;
    let seq: usize = seq
        .trim()
        .parse()
        .map_err(|_| format!("キャプション番号が不正です: {}", arg))?;
    if seq == 0 {
        return Err(format!("キャプション番号は1から始まります: {}", arg));
    }
    Ok((seq, text.to_string()))
}

/// "1:4" → (1, 4)
pub fn parse_move_arg(arg: &str) -> Result<(usize, usize), String> {
    let (from, to) = arg
        .split_once(':')
        .ok_or_else(|| format!("並べ替えは 移動元:移動先 で指定してください: {}", arg))?;
    let from = from.trim().parse().map_err(|_| format!("移動元が不正です: {}", arg))?;
    let to = to.trim().parse().map_err(|_| format!("移動先が不正です: {}", arg))?;
    Ok((from, to))
}
