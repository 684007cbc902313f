//! パネル全体の状態
//!
//! コレクション・ドラッグ・キャプション編集をまとめ、ジェスチャーごとの
//! ハンドラからコレクションを更新する。描画用のシーンは毎回作り直す。

use crate::error::Result;
use crate::upload;
use figure_panel_common::{
    CaptionConfig, CaptionEditor, DataTransfer, DragReorderController, DropCommand, EditorKey, FocusRing,
    ImagePayload, Item, ItemId, KeyOutcome, LayoutConfig, MarkupMathRenderer, MathRenderer, OrderedCollection,
    RenderContext, RowLayout, Scene, ROW_CAPACITY,
};
use tracing::{debug, info};

/// ドロップの適用結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropResult {
    /// 何もしなかった（自分自身へのドロップ・不明なドラッグ）
    Ignored,
    Moved { from: usize, to: usize },
    Inserted(Vec<ItemId>),
}

pub struct Panel {
    collection: OrderedCollection,
    drag: DragReorderController,
    editor: CaptionEditor,
    pub layout: LayoutConfig,
    pub caption: CaptionConfig,
    math: Box<dyn MathRenderer>,
}

impl Default for Panel {
    fn default() -> Self {
        Self::new(LayoutConfig::default(), CaptionConfig::default())
    }
}

impl Panel {
    pub fn new(layout: LayoutConfig, caption: CaptionConfig) -> Self {
        Self {
            collection: OrderedCollection::new(),
            drag: DragReorderController::new(),
            editor: CaptionEditor::new(),
            layout,
            caption,
            math: Box::new(MarkupMathRenderer),
        }
    }

    pub fn with_math_renderer(mut self, math: Box<dyn MathRenderer>) -> Self {
        self.math = math;
        self
    }

    pub fn collection(&self) -> &OrderedCollection {
        &self.collection
    }

    pub fn items(&self) -> &[Item] {
        self.collection.items()
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    pub fn drag(&self) -> &DragReorderController {
        &self.drag
    }

    pub fn editor(&self) -> &CaptionEditor {
        &self.editor
    }

    pub fn rows(&self) -> Result<RowLayout<'_, Item>> {
        Ok(RowLayout::new(self.collection.items(), ROW_CAPACITY)?)
    }

    pub fn focus_ring(&self) -> FocusRing {
        FocusRing::from_collection(&self.collection)
    }

    // ============================================
    // 画像の追加・削除
    // ============================================

    /// デコードできた画像だけを末尾に追加する
    pub fn add_images(&mut self, payloads: Vec<ImagePayload>) -> Vec<ItemId> {
        let requested = payloads.len();
        let items = upload::decode_payloads(payloads);
        let at = self.collection.len();
        let ids = self.collection.insert_many_at(at, items);
        info!(requested, added = ids.len(), "images added");
        ids
    }

    pub fn remove(&mut self, id: ItemId) -> Result<()> {
        self.collection.remove(id)?;
        self.editor.retain(&self.collection);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.collection.clear();
        self.editor.retain(&self.collection);
        self.drag.on_drag_end();
    }

    /// ドロップと同じ規則での並べ替え。変化があれば true
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<bool> {
        Ok(self.collection.move_item(from, to)?)
    }

    // ============================================
    // ドラッグ
    // ============================================

    pub fn drag_start(&mut self, index: usize, transfer: &mut DataTransfer) {
        self.drag.on_drag_start(index, transfer);
    }

    pub fn drag_over(&mut self, row: usize, col: usize) {
        self.drag.on_drag_over(row, col);
    }

    pub fn drag_leave(&mut self) {
        self.drag.on_drag_leave();
    }

    pub fn drag_end(&mut self) {
        self.drag.on_drag_end();
    }

    pub fn drop_at(&mut self, row: usize, col: usize, transfer: DataTransfer) -> Result<DropResult> {
        let command = {
            let layout = RowLayout::new(self.collection.items(), ROW_CAPACITY)?;
            self.drag.on_drop(row, col, transfer, &layout)
        };

        match command {
            DropCommand::None => Ok(DropResult::Ignored),
            DropCommand::Move { from, to } => {
                if self.collection.move_item(from, to)? {
                    Ok(DropResult::Moved { from, to })
                } else {
                    Ok(DropResult::Ignored)
                }
            }
            DropCommand::Insert { files, at } => {
                let items = upload::decode_payloads(files);
                let ids = self.collection.insert_many_at(at, items);
                debug!(at, count = ids.len(), "external files inserted");
                Ok(DropResult::Inserted(ids))
            }
        }
    }

    // ============================================
    // キャプション
    // ============================================

    pub fn caption_click(&mut self, id: ItemId) {
        self.editor.activate(id);
    }

    pub fn caption_blur(&mut self, id: ItemId) {
        self.editor.blur(id);
    }

    pub fn caption_key(&mut self, id: ItemId, key: EditorKey) -> KeyOutcome {
        let ring = self.focus_ring();
        self.editor.key_down(id, key, &ring)
    }

    pub fn caption_input(&mut self, id: ItemId, text: &str) -> Result<()> {
        Ok(self.editor.input(&mut self.collection, id, text)?)
    }

    /// 表示番号（1始まり）でキャプションを設定する
    pub fn set_caption_by_seq(&mut self, seq: usize, text: &str) -> Result<()> {
        let handle = self.focus_ring().by_seq(seq).ok_or_else(|| {
            figure_panel_common::Error::OutOfRange(format!("キャプション番号 {} (画像数 {})", seq, self.len()))
        })?;
        Ok(self.collection.update_caption(handle.id, text)?)
    }

    // ============================================
    // 描画
    // ============================================

    pub fn render_scene(&self) -> Result<Scene> {
        Ok(Scene::render(&RenderContext {
            collection: &self.collection,
            editor: &self.editor,
            drag: &self.drag,
            layout: self.layout,
            caption: &self.caption,
            math: self.math.as_ref(),
        })?)
    }
}
