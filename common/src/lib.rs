//! Figure Panel Common Library
//!
//! 画像コレクション・グリッド配置・ドラッグ並べ替え・キャプション編集・
//! 描画シーンなど、UIやファイル入出力に依存しない部分

pub mod types;
pub mod layout;
pub mod error;
pub mod collection;
pub mod grid;
pub mod drag;
pub mod caption;
pub mod scene;

pub use types::{ImagePayload, Item, ItemId, NewItem};
pub use layout::{parse_hex_color, CaptionConfig, CaptionPosition, LayoutConfig, ROW_CAPACITY};
pub use error::{Error, Result};
pub use collection::OrderedCollection;
pub use grid::{row_col_to_global, to_rows, RowLayout};
pub use drag::{DataTransfer, DragOrigin, DragReorderController, DragState, DropCommand};
pub use caption::{
    plain_caption, CaptionEditor, CaptionHandle, CaptionView, EditorKey, FocusRing, KeyOutcome, MarkupMathRenderer,
    MathMode, MathRenderer,
};
pub use scene::{Node, NodeId, NodeKind, RenderContext, Scene};
