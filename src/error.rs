use thiserror::Error;

/// エラーの大分類（利用者への通知用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    ContentMissing,
    Rasterization,
    Clipboard,
    Output,
    Busy,
    Input,
}

#[derive(Error, Debug)]
pub enum PanelError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("エクスポートする画像がありません")]
    NoImages,

    #[error("エクスポート対象のグリッドが見つかりません")]
    ContentNotFound,

    #[error("ラスタライズに失敗: {0}")]
    RasterizationFailed(String),

    #[error("クリップボードが利用できません")]
    ClipboardUnavailable,

    #[error("クリップボードへの書き込みに失敗: {0}")]
    ClipboardWriteFailed(String),

    #[error("画像データの生成に失敗: {0}")]
    BlobCreationFailed(String),

    #[error("PDF生成エラー: {0}")]
    PdfGeneration(String),

    #[error("ファイル保存エラー: {0}")]
    SaveFailed(String),

    #[error("別のエクスポートを実行中です")]
    Busy,

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] figure_panel_common::Error),
}

impl PanelError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PanelError::ContentNotFound => ErrorCategory::ContentMissing,
            PanelError::RasterizationFailed(_) => ErrorCategory::Rasterization,
            PanelError::ClipboardUnavailable
            | PanelError::ClipboardWriteFailed(_)
            | PanelError::BlobCreationFailed(_) => ErrorCategory::Clipboard,
            PanelError::PdfGeneration(_) | PanelError::SaveFailed(_) | PanelError::Io(_) => {
                ErrorCategory::Output
            }
            PanelError::Busy => ErrorCategory::Busy,
            PanelError::Config(_)
            | PanelError::FileNotFound(_)
            | PanelError::NoImages
            | PanelError::JsonParse(_)
            | PanelError::Common(_) => ErrorCategory::Input,
        }
    }
}

pub type Result<T> = std::result::Result<T, PanelError>;
