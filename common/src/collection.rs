//! 画像コレクション
//!
//! パネル上の画像の順序と寿命を一元管理する。位置は常に `[0, n)` で連続し、
//! 削除・移動のたびに後続の位置が詰め直される。

use crate::error::{Error, Result};
use crate::types::{Item, ItemId, NewItem};

/// 順序付き画像コレクション
#[derive(Debug, Clone, Default)]
pub struct OrderedCollection {
    items: Vec<Item>,
    next_id: u64,
}

impl OrderedCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn find(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn position_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(Item::id).collect()
    }

    fn mint_id(&mut self) -> ItemId {
        self.next_id += 1;
        ItemId(self.next_id)
    }

    /// 末尾に追加
    pub fn append(&mut self, new_item: NewItem) -> ItemId {
        let id = self.mint_id();
        self.items.push(Item::new(id, new_item));
        id
    }

    /// 指定位置に挿入（範囲外は末尾に追加）
    pub fn insert_at(&mut self, index: usize, new_item: NewItem) -> ItemId {
        let id = self.mint_id();
        let index = index.min(self.items.len());
        self.items.insert(index, Item::new(id, new_item));
        id
    }

    /// 複数をまとめて挿入。返り値は挿入順のID
    pub fn insert_many_at(&mut self, index: usize, new_items: Vec<NewItem>) -> Vec<ItemId> {
        let mut at = index.min(self.items.len());
        let mut ids = Vec::with_capacity(new_items.len());
        for new_item in new_items {
            ids.push(self.insert_at(at, new_item));
            at += 1;
        }
        ids
    }

    /// IDで削除し、後続を詰める
    pub fn remove(&mut self, id: ItemId) -> Result<Item> {
        let index = self
            .position_of(id)
            .ok_or_else(|| Error::UnknownItem(id.to_string()))?;
        Ok(self.items.remove(index))
    }

    /// `from` の画像を取り出し、取り出し後の並びで `to` に挿入する
    ///
    /// `to` が末尾を超える場合は末尾に置く。位置が変わらなければ `Ok(false)`。
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<bool> {
        let len = self.items.len();
        if from >= len {
            return Err(Error::OutOfRange(format!("move source {} / {} items", from, len)));
        }
        let to = to.min(len - 1);
        if from == to {
            return Ok(false);
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        Ok(true)
    }

    /// キャプション更新（位置は変わらない）
    pub fn update_caption(&mut self, id: ItemId, caption: impl Into<String>) -> Result<()> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| Error::UnknownItem(id.to_string()))?;
        item.caption = caption.into();
        Ok(())
    }

    /// すべて削除（ID採番は継続）
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
