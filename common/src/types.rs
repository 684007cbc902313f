//! パネル画像の型定義
//!
//! - ItemId: コレクションが払い出す不変の識別子
//! - ImagePayload: デコード前のファイル
//! - NewItem: 挿入前の画像（アップロード/外部ドロップ由来）
//! - Item: コレクションが所有する画像1枚

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 画像アイテムの識別子（コレクション内で一意・再利用なし）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "img-{}", self.0)
    }
}

/// 未デコードの画像ペイロード（ファイル選択・外部ドロップ由来）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// 挿入前の画像データ
///
/// デコード済みで寸法が判明しているものだけがこの型になる。
#[derive(Debug, Clone)]
pub struct NewItem {
    pub file_name: String,
    pub source: Arc<[u8]>,
    /// 表示用ロケータ（data URI）
    pub display_url: String,
    pub natural_width: u32,
    pub natural_height: u32,
}

/// パネル上の画像1枚
#[derive(Debug, Clone)]
pub struct Item {
    id: ItemId,
    pub file_name: String,
    /// 元画像のバイト列（シーン・ラスタライザと共有）
    pub source: Arc<[u8]>,
    pub display_url: String,
    pub caption: String,
    pub natural_width: u32,
    pub natural_height: u32,
}

impl Item {
    pub(crate) fn new(id: ItemId, new_item: NewItem) -> Self {
        Self {
            id,
            file_name: new_item.file_name,
            source: new_item.source,
            display_url: new_item.display_url,
            caption: String::new(),
            natural_width: new_item.natural_width,
            natural_height: new_item.natural_height,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    /// 縦横比（幅/高さ）。高さ0は1.0扱い
    pub fn aspect_ratio(&self) -> f32 {
        if self.natural_height == 0 {
            1.0
        } else {
            self.natural_width as f32 / self.natural_height as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_display() {
        assert_eq!(ItemId(12).to_string(), "img-12");
    }

    #[test]
    fn test_aspect_ratio() {
        let item = Item::new(
            ItemId(1),
            NewItem {
                file_name: "a.png".into(),
                source: Arc::from(Vec::new()),
                display_url: String::new(),
                natural_width: 400,
                natural_height: 200,
            },
        );
        assert!((item.aspect_ratio() - 2.0).abs() < f32::EPSILON);
        assert!(item.caption.is_empty());
    }
}
