//! figure-panel
//!
//! 画像を4列のグリッドに並べ、キャプション（数式対応）を付けて
//! PNG/PDF/クリップボードへ書き出す。

pub mod cli;
pub mod config;
pub mod error;
pub mod upload;
pub mod notify;
pub mod sink;
pub mod capture;
pub mod export;
pub mod panel;
