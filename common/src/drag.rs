//! ドラッグ&ドロップ並べ替え
//!
//! 1回のドラッグ操作を状態機械として扱い、ドロップ時に
//! 「並べ替え」「外部ファイル挿入」「何もしない」のいずれかのコマンドを返す。
//! コレクションの変更は呼び出し側がコマンドを適用して行う。

use crate::grid::RowLayout;
use crate::types::ImagePayload;
use tracing::{debug, warn};

/// 内部ドラッグを識別するためのデータ型（値はドラッグ元インデックスの10進表記）
pub const INTERNAL_DRAG_TYPE: &str = "application/x-internal-drag-index";

/// ドラッグで運ばれるデータ
#[derive(Debug, Clone)]
pub struct DataTransfer {
    entries: Vec<(String, String)>,
    files: Vec<ImagePayload>,
    readable: bool,
}

impl Default for DataTransfer {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            files: Vec::new(),
            readable: true,
        }
    }
}

impl DataTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 外部ファイルのドロップ
    pub fn with_files(files: Vec<ImagePayload>) -> Self {
        Self {
            files,
            ..Self::default()
        }
    }

    /// 型一覧は見えるが値を読めない転送データ（クロスオリジン相当）
    pub fn opaque(mut self) -> Self {
        self.readable = false;
        self
    }

    pub fn set_data(&mut self, data_type: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(t, _)| t == data_type) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((data_type.to_string(), value)),
        }
    }

    pub fn has_type(&self, data_type: &str) -> bool {
        self.entries.iter().any(|(t, _)| t == data_type)
    }

    pub fn get_data(&self, data_type: &str) -> Option<&str> {
        if !self.readable {
            return None;
        }
        self.entries
            .iter()
            .find(|(t, _)| t == data_type)
            .map(|(_, v)| v.as_str())
    }

    pub fn files(&self) -> &[ImagePayload] {
        &self.files
    }

    pub fn into_files(self) -> Vec<ImagePayload> {
        self.files
    }
}

/// 進行中のドラッグ操作
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragGesture {
    pub source: Option<usize>,
    pub hover: Option<(usize, usize)>,
}

/// コントローラの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging { source: usize },
    /// 外部ファイルのドラッグ中は `source` が無い
    Hovering { source: Option<usize>, row: usize, col: usize },
}

/// ドラッグ元。ドロップ時に一度だけ解決する
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOrigin {
    Internal(usize),
    External(Vec<ImagePayload>),
    Unknown,
}

impl DragOrigin {
    /// 優先順位: 転送データのマーカー → ドラッグ開始時の記録 → 外部ファイル
    pub fn resolve(transfer: DataTransfer, remembered: Option<usize>, len: usize) -> Self {
        if transfer.has_type(INTERNAL_DRAG_TYPE) {
            let marker = transfer
                .get_data(INTERNAL_DRAG_TYPE)
                .and_then(|value| value.trim().parse::<usize>().ok())
                .filter(|index| *index < len);
            match marker {
                Some(index) => return DragOrigin::Internal(index),
                None => debug!("internal drag marker unreadable, falling back to remembered source"),
            }
        }
        if let Some(index) = remembered.filter(|index| *index < len) {
            return DragOrigin::Internal(index);
        }
        let files = transfer.into_files();
        if files.is_empty() {
            DragOrigin::Unknown
        } else {
            DragOrigin::External(files)
        }
    }
}

/// ドロップの結果としてコレクションに適用するコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropCommand {
    None,
    /// `to` は取り出し後の並びでの挿入位置
    Move { from: usize, to: usize },
    Insert { files: Vec<ImagePayload>, at: usize },
}

/// ドラッグ並べ替えコントローラ
#[derive(Debug, Clone, Default)]
pub struct DragReorderController {
    gesture: Option<DragGesture>,
}

impl DragReorderController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        match self.gesture {
            None => DragState::Idle,
            Some(DragGesture { source, hover: Some((row, col)) }) => DragState::Hovering { source, row, col },
            Some(DragGesture { source: Some(source), hover: None }) => DragState::Dragging { source },
            Some(DragGesture { source: None, hover: None }) => DragState::Idle,
        }
    }

    pub fn gesture(&self) -> Option<DragGesture> {
        self.gesture
    }

    /// ドラッグ中の画像（半透明表示用）
    pub fn dragged_index(&self) -> Option<usize> {
        self.gesture.and_then(|g| g.source)
    }

    /// ハイライト中のセル
    pub fn hover_cell(&self) -> Option<(usize, usize)> {
        self.gesture.and_then(|g| g.hover)
    }

    pub fn on_drag_start(&mut self, index: usize, transfer: &mut DataTransfer) {
        debug!(index, "drag start");
        self.gesture = Some(DragGesture {
            source: Some(index),
            hover: None,
        });
        transfer.set_data(INTERNAL_DRAG_TYPE, index.to_string());
    }

    /// 何度呼ばれてもよい。コレクションは変更しない
    pub fn on_drag_over(&mut self, row: usize, col: usize) {
        let gesture = self.gesture.get_or_insert_with(DragGesture::default);
        gesture.hover = Some((row, col));
    }

    /// ドロップせずに離れた場合はジェスチャーを破棄する
    pub fn on_drag_leave(&mut self) {
        self.gesture = None;
    }

    pub fn on_drag_end(&mut self) {
        self.gesture = None;
    }

    /// ドロップを解決してコマンドを返す。ジェスチャーはどの分岐でも破棄される
    pub fn on_drop<T>(
        &mut self,
        row: usize,
        col: usize,
        transfer: DataTransfer,
        layout: &RowLayout<'_, T>,
    ) -> DropCommand {
        let remembered = self.gesture.take().and_then(|g| g.source);
        match DragOrigin::resolve(transfer, remembered, layout.len()) {
            DragOrigin::Internal(from) => match layout.to_global(row, col) {
                Ok(to) if to == from => {
                    debug!(from, "self drop ignored");
                    DropCommand::None
                }
                Ok(to) => {
                    debug!(from, to, "drop resolved to move");
                    DropCommand::Move { from, to }
                }
                Err(err) => {
                    warn!(row, col, error = %err, "drop target outside layout");
                    DropCommand::None
                }
            },
            DragOrigin::External(files) => {
                let at = layout.to_global(row, col).unwrap_or(layout.len());
                debug!(count = files.len(), at, "drop resolved to insert");
                DropCommand::Insert { files, at }
            }
            DragOrigin::Unknown => DropCommand::None,
        }
    }
}
