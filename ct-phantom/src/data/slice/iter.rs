use std::ops::Range;

use crate::config::BandFractions;
use crate::Idx2d;

/// 图像上的半开矩形 `[top, bottom) × [left, right)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// 起始行 (含).
    pub top: usize,
    /// 终止行 (不含).
    pub bottom: usize,
    /// 起始列 (含).
    pub left: usize,
    /// 终止列 (不含).
    pub right: usize,
}

/// 乘积向下取整. 加上一个微小量以消除 `W * (3 / 7)` 一类的浮点误差.
#[inline]
fn floor_fraction(len: usize, fraction: f64) -> usize {
    let v = (len as f64 * fraction + 1e-9).floor();
    if v <= 0.0 {
        0
    } else {
        (v as usize).min(len)
    }
}

impl Rect {
    /// 由行, 列范围创建矩形.
    #[inline]
    pub fn new(rows: Range<usize>, cols: Range<usize>) -> Self {
        Self {
            top: rows.start,
            bottom: rows.end,
            left: cols.start,
            right: cols.end,
        }
    }

    /// 由图像形状 `(H, W)` 和宽高分数创建矩形. 边界向下取整.
    pub fn from_fractions((h, w): Idx2d, band: &BandFractions) -> Self {
        Self {
            top: floor_fraction(h, band.y.0),
            bottom: floor_fraction(h, band.y.1),
            left: floor_fraction(w, band.x.0),
            right: floor_fraction(w, band.x.1),
        }
    }

    /// 矩形是否不含任何位置?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.top >= self.bottom || self.left >= self.right
    }

    /// 矩形形状 `(高, 宽)`. 空矩形返回 `(0, 0)`.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        if self.is_empty() {
            (0, 0)
        } else {
            (self.bottom - self.top, self.right - self.left)
        }
    }

    /// 与形状为 `(H, W)` 的图像求交.
    #[inline]
    pub fn clip(&self, (h, w): Idx2d) -> Self {
        Self {
            top: self.top.min(h),
            bottom: self.bottom.min(h),
            left: self.left.min(w),
            right: self.right.min(w),
        }
    }

    /// 行优先迭代矩形内所有位置.
    #[inline]
    pub fn positions(&self) -> RectIter {
        RectIter::new(*self)
    }
}

/// 矩形内的行优先索引迭代器.
///
/// 虽然如下函数也能实现相同的功能:
///
/// ```
/// type Idx2d = (usize, usize);
///
/// fn rect_iter_auto(rows: std::ops::Range<usize>, cols: std::ops::Range<usize>)
///     -> impl Iterator<Item = Idx2d> {
///     rows.flat_map(move |h| cols.clone().map(move |w| (h, w)))
/// }
///
/// // ...
/// ```
///
/// 但该迭代器对象占用的空间更大, 而 ROI 统计会大量创建它. 因此我们保留该结构.
#[derive(Debug, Clone)]
pub struct RectIter {
    cur_h: usize,
    cur_w: usize,
    rect: Rect,
}

impl RectIter {
    #[inline]
    fn new(rect: Rect) -> Self {
        Self {
            cur_h: rect.top,
            cur_w: rect.left,
            rect,
        }
    }
}

impl Iterator for RectIter {
    type Item = Idx2d;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rect.is_empty() || self.cur_h >= self.rect.bottom {
            return None;
        }
        let ret_pos = (self.cur_h, self.cur_w);
        if self.cur_w + 1 == self.rect.right {
            self.cur_w = self.rect.left;
            self.cur_h += 1;
        } else {
            self.cur_w += 1;
        }
        Some(ret_pos)
    }
}
