//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    /// 行・列・インデックスが現在のレイアウト範囲外
    #[error("Index out of range: {0}")]
    OutOfRange(String),

    #[error("Unknown item: {0}")]
    UnknownItem(String),

    /// 数式の組版に失敗（呼び出し側で元の文字列に置き換える）
    #[error("Math error: {0}")]
    Math(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let error = Error::Config("フォントサイズが範囲外です".to_string());
        let display = format!("{}", error);
        assert_eq!(display, "Config error: フォントサイズが範囲外です");
    }

    #[test]
    fn test_error_display_out_of_range() {
        let error = Error::OutOfRange("row 3 / 2 rows".to_string());
        assert_eq!(format!("{}", error), "Index out of range: row 3 / 2 rows");
    }

    #[test]
    fn test_error_debug() {
        let error = Error::UnknownItem("img-7".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("UnknownItem"));
        assert!(debug.contains("img-7"));
    }
}
