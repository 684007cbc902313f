//! グリッド配置
//!
//! 順序付きコレクションを固定容量の行に分割し、(行, 列) とグローバル
//! インデックスを相互変換する。分割は常に現在のスナップショットから
//! 計算し直す（挿入・削除後に古い行境界を使わないため）。

use crate::error::{Error, Result};

/// `items` を `capacity` 件ずつの行に分割する。最終行は短くてもよい
pub fn to_rows<T>(items: &[T], capacity: usize) -> Result<Vec<&[T]>> {
    if capacity == 0 {
        return Err(Error::Config("row capacity must be positive".into()));
    }
    Ok(items.chunks(capacity).collect())
}

/// (行, 列) → グローバルインデックス
///
/// `col == rows[row].len()` は行末の空きスロット、`row == rows.len()` かつ
/// `col == 0` は末尾の新規行スロットを指す。
pub fn row_col_to_global<T>(rows: &[&[T]], row: usize, col: usize) -> Result<usize> {
    let before: usize = rows.iter().take(row).map(|r| r.len()).sum();
    match rows.get(row) {
        Some(r) if col <= r.len() => Ok(before + col),
        None if row == rows.len() && col == 0 => Ok(before),
        Some(r) => Err(Error::OutOfRange(format!(
            "col {} / row {} has {} items",
            col,
            row,
            r.len()
        ))),
        None => Err(Error::OutOfRange(format!("row {} / {} rows", row, rows.len()))),
    }
}

/// グローバルインデックス → (行, 列)
pub fn global_to_row_col<T>(rows: &[&[T]], global: usize) -> Option<(usize, usize)> {
    let mut start = 0;
    for (row, r) in rows.iter().enumerate() {
        if global < start + r.len() {
            return Some((row, global - start));
        }
        start += r.len();
    }
    None
}

/// あるスナップショットに対する行分割
#[derive(Debug, Clone)]
pub struct RowLayout<'a, T> {
    rows: Vec<&'a [T]>,
    len: usize,
}

impl<'a, T> RowLayout<'a, T> {
    pub fn new(items: &'a [T], capacity: usize) -> Result<Self> {
        Ok(Self {
            rows: to_rows(items, capacity)?,
            len: items.len(),
        })
    }

    pub fn rows(&self) -> &[&'a [T]] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row_len(&self, row: usize) -> Option<usize> {
        self.rows.get(row).map(|r| r.len())
    }

    /// 分割前の要素数
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn to_global(&self, row: usize, col: usize) -> Result<usize> {
        row_col_to_global(&self.rows, row, col)
    }

    pub fn to_row_col(&self, global: usize) -> Option<(usize, usize)> {
        global_to_row_col(&self.rows, global)
    }

    /// ドロップ可能な空きスロット（各行末 + 末尾の新規行）
    pub fn empty_slots(&self) -> Vec<(usize, usize)> {
        let mut slots: Vec<(usize, usize)> =
            self.rows.iter().enumerate().map(|(row, r)| (row, r.len())).collect();
        slots.push((self.rows.len(), 0));
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ROW_CAPACITY;

    #[test]
    fn test_row_counts() {
        for n in 0..=17usize {
            let items: Vec<usize> = (0..n).collect();
            let rows = to_rows(&items, ROW_CAPACITY).unwrap();
            assert_eq!(rows.len(), n.div_ceil(ROW_CAPACITY));
            for (i, row) in rows.iter().enumerate() {
                if i + 1 < rows.len() {
                    assert_eq!(row.len(), ROW_CAPACITY);
                } else {
                    assert!(!row.is_empty() && row.len() <= ROW_CAPACITY);
                }
            }
            let joined: Vec<usize> = rows.concat();
            assert_eq!(joined, items);
        }
    }

    #[test]
    fn test_zero_capacity() {
        let items = [1, 2, 3];
        assert!(matches!(to_rows(&items, 0), Err(Error::Config(_))));
    }

    #[test]
    fn test_inverse_mapping() {
        for n in 0..=13usize {
            let items: Vec<usize> = (0..n).collect();
            let rows = to_rows(&items, ROW_CAPACITY).unwrap();
            for g in 0..n {
                let (row, col) = global_to_row_col(&rows, g).unwrap();
                assert_eq!(rows[row][col], g);
                assert_eq!(row_col_to_global(&rows, row, col).unwrap(), g);
            }
            assert_eq!(global_to_row_col(&rows, n), None);
        }
    }

    #[test]
    fn test_trailing_slots() {
        let items = ["A", "B", "C", "D", "E"];
        let rows = to_rows(&items, ROW_CAPACITY).unwrap();
        assert_eq!(rows, vec![&["A", "B", "C", "D"][..], &["E"][..]]);

        // 行末の空きスロット
        assert_eq!(row_col_to_global(&rows, 0, 4).unwrap(), 4);
        assert_eq!(row_col_to_global(&rows, 1, 1).unwrap(), 5);
        // 新規行スロット
        assert_eq!(row_col_to_global(&rows, 2, 0).unwrap(), 5);
    }

    #[test]
    fn test_out_of_range() {
        let items = ["A", "B", "C", "D", "E"];
        let rows = to_rows(&items, ROW_CAPACITY).unwrap();
        assert!(row_col_to_global(&rows, 1, 2).is_err());
        assert!(row_col_to_global(&rows, 2, 1).is_err());
        assert!(row_col_to_global(&rows, 5, 0).is_err());
    }

    #[test]
    fn test_empty_collection_slot() {
        let items: [u8; 0] = [];
        let layout = RowLayout::new(&items, ROW_CAPACITY).unwrap();
        assert_eq!(layout.row_count(), 0);
        assert_eq!(layout.to_global(0, 0).unwrap(), 0);
        assert_eq!(layout.empty_slots(), vec![(0, 0)]);
    }

    #[test]
    fn test_row_layout_recomputed_after_mutation() {
        let mut items = vec![1, 2, 3, 4, 5];
        {
            let layout = RowLayout::new(&items, ROW_CAPACITY).unwrap();
            assert_eq!(layout.row_len(1), Some(1));
        }
        items.remove(0);
        let layout = RowLayout::new(&items, ROW_CAPACITY).unwrap();
        assert_eq!(layout.row_count(), 1);
        assert_eq!(layout.empty_slots(), vec![(0, 4), (1, 0)]);
    }
}
