//! 描画シーン
//!
//! 画面に描画されるグリッドをノードの木として表す。キャプチャ処理はこの木を
//! 読み、削除ボタン・空きスロット・プレースホルダーといった編集用UIを
//! 一時的に非表示にしてからラスタライズする。

use crate::caption::{plain_caption, CaptionEditor, CaptionView, FocusRing, MathRenderer};
use crate::collection::OrderedCollection;
use crate::drag::DragReorderController;
use crate::error::Result;
use crate::grid::RowLayout;
use crate::layout::{CaptionConfig, CaptionPosition, LayoutConfig, ROW_CAPACITY};
use crate::types::ItemId;
use std::sync::Arc;

/// シーン内ノードの番号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// 外枠（エクスポート対象を含むコンテナ）
    Container,
    /// エクスポート対象のグリッド本体
    ContentRoot,
    Row {
        index: usize,
    },
    Cell {
        item: ItemId,
        index: usize,
        row: usize,
        col: usize,
        dragging: bool,
        drop_target: bool,
    },
    Image {
        item: ItemId,
        source: Arc<[u8]>,
        width: u32,
        height: u32,
    },
    Caption {
        item: ItemId,
        seq: usize,
        view: CaptionView,
        /// 画像に書き出す文字列（数式区切りを外したもの）
        text: String,
    },
    RemoveButton {
        item: ItemId,
    },
    EmptySlot {
        row: usize,
        col: usize,
        drop_target: bool,
    },
    CaptionPlaceholder {
        item: ItemId,
    },
}

impl NodeKind {
    /// 編集用UI（エクスポート時に隠す要素）か
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            NodeKind::RemoveButton { .. } | NodeKind::EmptySlot { .. } | NodeKind::CaptionPlaceholder { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

/// シーン描画に必要な入力一式
pub struct RenderContext<'a> {
    pub collection: &'a OrderedCollection,
    pub editor: &'a CaptionEditor,
    pub drag: &'a DragReorderController,
    pub layout: LayoutConfig,
    pub caption: &'a CaptionConfig,
    pub math: &'a dyn MathRenderer,
}

/// ノードの木
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<Node>,
    pub layout: LayoutConfig,
    pub caption_style: CaptionConfig,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(LayoutConfig::default(), CaptionConfig::default())
    }
}

impl Scene {
    /// コンテナだけを持つ空のシーン
    pub fn new(layout: LayoutConfig, caption_style: CaptionConfig) -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Container,
                visible: true,
                parent: None,
                children: Vec::new(),
            }],
            layout,
            caption_style,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn add(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            visible: true,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.nodes[id.0].visible = visible;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `from` 以下を行きがけ順に列挙（`from` 自身を含む）
    pub fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    /// エクスポート対象のグリッドを探す
    pub fn find_content_root(&self, from: NodeId) -> Option<NodeId> {
        self.descendants(from)
            .into_iter()
            .find(|id| self.nodes[id.0].kind == NodeKind::ContentRoot)
    }

    /// `from` 以下の編集用UI
    pub fn transient_nodes(&self, from: NodeId) -> Vec<NodeId> {
        self.descendants(from)
            .into_iter()
            .filter(|id| self.nodes[id.0].is_transient())
            .collect()
    }

    /// `from` 以下の画像数
    pub fn item_count(&self, from: NodeId) -> usize {
        self.descendants(from)
            .into_iter()
            .filter(|id| matches!(self.nodes[id.0].kind, NodeKind::Cell { .. }))
            .count()
    }

    /// 現在のコレクションからシーンを組み立てる
    ///
    /// 行分割は毎回コレクションから計算し直す。各行の末尾に空きスロット、
    /// 最後に新規行用の空きスロットを置く。
    pub fn render(ctx: &RenderContext<'_>) -> Result<Self> {
        let mut scene = Scene::new(ctx.layout, ctx.caption.clone());
        let content = scene.add(scene.root(), NodeKind::ContentRoot);

        let rows = RowLayout::new(ctx.collection.items(), ROW_CAPACITY)?;
        let ring = FocusRing::from_collection(ctx.collection);
        let hover = ctx.drag.hover_cell();
        let dragged = ctx.drag.dragged_index();

        for (row_index, row) in rows.rows().iter().enumerate() {
            let row_node = scene.add(content, NodeKind::Row { index: row_index });
            for (col, item) in row.iter().enumerate() {
                let index = rows.to_global(row_index, col)?;
                let cell = scene.add(
                    row_node,
                    NodeKind::Cell {
                        item: item.id(),
                        index,
                        row: row_index,
                        col,
                        dragging: dragged == Some(index),
                        drop_target: hover == Some((row_index, col)),
                    },
                );

                let seq = ring.handle_of(item.id()).map(|h| h.seq).unwrap_or(index + 1);
                let view = ctx.editor.view(item, ctx.math);
                let placeholder = view == CaptionView::Placeholder;
                let caption_kind = NodeKind::Caption {
                    item: item.id(),
                    seq,
                    view,
                    text: plain_caption(&item.caption),
                };

                if ctx.caption.position == CaptionPosition::Top {
                    let caption = scene.add(cell, caption_kind.clone());
                    if placeholder {
                        scene.add(caption, NodeKind::CaptionPlaceholder { item: item.id() });
                    }
                }
                scene.add(
                    cell,
                    NodeKind::Image {
                        item: item.id(),
                        source: Arc::clone(&item.source),
                        width: item.natural_width,
                        height: item.natural_height,
                    },
                );
                scene.add(cell, NodeKind::RemoveButton { item: item.id() });
                if ctx.caption.position == CaptionPosition::Bottom {
                    let caption = scene.add(cell, caption_kind);
                    if placeholder {
                        scene.add(caption, NodeKind::CaptionPlaceholder { item: item.id() });
                    }
                }
            }
            let col = row.len();
            scene.add(
                row_node,
                NodeKind::EmptySlot {
                    row: row_index,
                    col,
                    drop_target: hover == Some((row_index, col)),
                },
            );
        }

        let new_row = rows.row_count();
        let row_node = scene.add(content, NodeKind::Row { index: new_row });
        scene.add(
            row_node,
            NodeKind::EmptySlot {
                row: new_row,
                col: 0,
                drop_target: hover == Some((new_row, 0)),
            },
        );

        Ok(scene)
    }
}
