//! キャプション編集
//!
//! - 画像ごとの表示/編集モード切り替え
//! - `$$...$$`（ディスプレイ）と `$...$`（インライン）の数式置換
//! - コレクション順に採番したリングでのTab移動

use crate::collection::OrderedCollection;
use crate::error::{Error, Result};
use crate::types::{Item, ItemId};
use regex::{Captures, Regex};
use std::collections::HashSet;
use tracing::{debug, warn};

// ============================================
// 数式置換
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathMode {
    Inline,
    Display,
}

/// 数式組版の外部コラボレータ
pub trait MathRenderer {
    fn render(&self, expr: &str, mode: MathMode) -> Result<String>;
}

/// 数式をエスケープしてタグで囲むだけの組版器
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupMathRenderer;

impl MathRenderer for MarkupMathRenderer {
    fn render(&self, expr: &str, mode: MathMode) -> Result<String> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(Error::Math("empty expression".into()));
        }
        let mut depth: i32 = 0;
        for c in expr.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                break;
            }
        }
        if depth != 0 {
            return Err(Error::Math(format!("unbalanced braces in `{}`", expr)));
        }
        let body = escape_html(expr);
        Ok(match mode {
            MathMode::Inline => format!(r#"<span class="math math-inline">{}</span>"#, body),
            MathMode::Display => format!(r#"<div class="math math-display">{}</div>"#, body),
        })
    }
}

lazy_static::lazy_static! {
    // ディスプレイ数式を先に試す。同じ位置で `$$` が `$` に食われないようにするため
    static ref MATH_RE: Regex = Regex::new(r"\$\$([^$]+)\$\$|\$([^$]+)\$").unwrap();
}

/// キャプション文字列を表示用マークアップに変換する
///
/// 認識できない・組版に失敗した区間は元の文字列のまま残す。
pub fn render_caption(text: &str, renderer: &dyn MathRenderer) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in MATH_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&escape_html(&text[last..whole.start()]));
        out.push_str(&render_segment(&caps, renderer));
        last = whole.end();
    }
    out.push_str(&escape_html(&text[last..]));
    out
}

/// 画像へ書き出すための素のキャプション文字列。数式の区切り記号だけ外す
pub fn plain_caption(text: &str) -> String {
    MATH_RE
        .replace_all(text, |caps: &Captures<'_>| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default()
        })
        .into_owned()
}

fn render_segment(caps: &Captures<'_>, renderer: &dyn MathRenderer) -> String {
    let (expr, mode) = match (caps.get(1), caps.get(2)) {
        (Some(m), _) => (m.as_str(), MathMode::Display),
        (None, Some(m)) => (m.as_str(), MathMode::Inline),
        (None, None) => return String::new(),
    };
    match renderer.render(expr, mode) {
        Ok(markup) => markup,
        Err(err) => {
            warn!(error = %err, "math rendering failed, keeping literal text");
            escape_html(&caps[0])
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// ============================================
// フォーカスリング
// ============================================

/// キャプション1件への参照（seqは1始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptionHandle {
    pub seq: usize,
    pub id: ItemId,
}

/// コレクション順のキャプション一覧。末尾の次は先頭に戻る
#[derive(Debug, Clone, Default)]
pub struct FocusRing {
    handles: Vec<CaptionHandle>,
}

impl FocusRing {
    pub fn from_collection(collection: &OrderedCollection) -> Self {
        let handles = collection
            .iter()
            .enumerate()
            .map(|(index, item)| CaptionHandle {
                seq: index + 1,
                id: item.id(),
            })
            .collect();
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn first(&self) -> Option<CaptionHandle> {
        self.handles.first().copied()
    }

    pub fn by_seq(&self, seq: usize) -> Option<CaptionHandle> {
        seq.checked_sub(1).and_then(|i| self.handles.get(i)).copied()
    }

    pub fn handle_of(&self, id: ItemId) -> Option<CaptionHandle> {
        self.handles.iter().find(|h| h.id == id).copied()
    }

    pub fn next(&self, current: CaptionHandle) -> Option<CaptionHandle> {
        self.by_seq(current.seq + 1).or_else(|| self.first())
    }
}

// ============================================
// 編集状態
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    Enter,
    Space,
    Tab,
    Escape,
    Other,
}

/// キー処理の結果。`Handled` は既定動作を抑止する
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Ignored,
}

/// 表示用のキャプション
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptionView {
    Editing { text: String },
    Rendered { markup: String },
    Placeholder,
}

/// 全キャプションの編集状態とフォーカス
#[derive(Debug, Clone, Default)]
pub struct CaptionEditor {
    editing: HashSet<ItemId>,
    focused: Option<ItemId>,
}

impl CaptionEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_editing(&self, id: ItemId) -> bool {
        self.editing.contains(&id)
    }

    pub fn focused(&self) -> Option<ItemId> {
        self.focused
    }

    pub fn focus(&mut self, id: ItemId) {
        self.focused = Some(id);
    }

    /// クリック: フォーカスして編集開始
    pub fn activate(&mut self, id: ItemId) {
        debug!(%id, "caption editing");
        self.focused = Some(id);
        self.editing.insert(id);
    }

    /// フォーカス喪失: 表示モードへ
    pub fn blur(&mut self, id: ItemId) {
        self.editing.remove(&id);
        if self.focused == Some(id) {
            self.focused = None;
        }
    }

    /// 入力は即座にアイテムへ反映する（下書きバッファは持たない）
    pub fn input(&self, collection: &mut OrderedCollection, id: ItemId, text: &str) -> Result<()> {
        collection.update_caption(id, text)
    }

    pub fn key_down(&mut self, id: ItemId, key: EditorKey, ring: &FocusRing) -> KeyOutcome {
        if self.is_editing(id) {
            match key {
                EditorKey::Escape => {
                    self.editing.remove(&id);
                    KeyOutcome::Ignored
                }
                EditorKey::Tab => {
                    self.editing.remove(&id);
                    if let Some(next) = self.advance(id, ring) {
                        self.editing.insert(next.id);
                    }
                    KeyOutcome::Handled
                }
                _ => KeyOutcome::Ignored,
            }
        } else {
            match key {
                EditorKey::Enter | EditorKey::Space => {
                    self.activate(id);
                    KeyOutcome::Handled
                }
                EditorKey::Tab => {
                    self.advance(id, ring);
                    KeyOutcome::Handled
                }
                _ => KeyOutcome::Ignored,
            }
        }
    }

    fn advance(&mut self, id: ItemId, ring: &FocusRing) -> Option<CaptionHandle> {
        let next = match ring.handle_of(id) {
            Some(current) => ring.next(current),
            None => ring.first(),
        };
        self.focused = next.map(|h| h.id);
        next
    }

    /// 削除済みアイテムの状態を捨てる
    pub fn retain(&mut self, collection: &OrderedCollection) {
        self.editing.retain(|id| collection.find(*id).is_some());
        if let Some(id) = self.focused {
            if collection.find(id).is_none() {
                self.focused = None;
            }
        }
    }

    pub fn view(&self, item: &Item, renderer: &dyn MathRenderer) -> CaptionView {
        if self.is_editing(item.id()) {
            CaptionView::Editing {
                text: item.caption.clone(),
            }
        } else if item.caption.is_empty() {
            CaptionView::Placeholder
        } else {
            CaptionView::Rendered {
                markup: render_caption(&item.caption, renderer),
            }
        }
    }
}
