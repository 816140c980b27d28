use crate::config::{BandFractions, SearchBands};
use crate::data::{Rect, Slice, SliceStack};
use crate::{idx_to_point, Point};

/// 单张切片上五个搜索带的校准读数.
///
/// 空的搜索带 (图像过小) 的最大值为 `-inf`, 均值为 `NaN`, 因此不会满足任何阈值条件.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BandReading {
    /// 切片在序列中的下标.
    pub index: usize,
    /// 切片扫描位置.
    pub location: f64,
    /// 顶部标记带最大值.
    pub top_max: f64,
    /// 底部标记带最大值.
    pub bottom_max: f64,
    /// 线对带均值.
    pub line_pair_mean: f64,
    /// 中心带均值.
    pub center_mean: f64,
    /// 对角标记带最大值.
    pub diagonal_max: f64,
}

impl BandReading {
    /// 读取第 `index` 张切片.
    pub fn read(index: usize, slice: &Slice, bands: &SearchBands) -> Self {
        let rect = |b: &BandFractions| Rect::from_fractions(slice.shape(), b);
        Self {
            index,
            location: slice.location(),
            top_max: band_max(slice, &rect(&bands.top)),
            bottom_max: band_max(slice, &rect(&bands.bottom)),
            line_pair_mean: band_mean(slice, &rect(&bands.line_pairs)),
            center_mean: band_mean(slice, &rect(&bands.center)),
            diagonal_max: band_max(slice, &rect(&bands.diagonal)),
        }
    }

    /// 上下两个标记带最大值之和, 用于在候选切片中择优.
    #[inline]
    pub fn marker_sum(&self) -> f64 {
        self.top_max + self.bottom_max
    }

    /// 上下两个标记带是否都超过 `threshold`?
    #[inline]
    pub fn has_markers(&self, threshold: f64) -> bool {
        self.top_max > threshold && self.bottom_max > threshold
    }
}

fn band_max(slice: &Slice, rect: &Rect) -> f64 {
    let rescale = slice.rescale();
    slice
        .rect_positions(rect)
        .map(|p| rescale.apply(slice[p]))
        .fold(f64::NEG_INFINITY, f64::max)
}

fn band_mean(slice: &Slice, rect: &Rect) -> f64 {
    let rescale = slice.rescale();
    let (sum, n) = slice
        .rect_positions(rect)
        .fold((0.0, 0usize), |(sum, n), p| (sum + rescale.apply(slice[p]), n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// 搜索带内原始值最大的像素 (行优先顺序的第一个), 作为定位标记坐标.
/// 搜索带为空时返回 `None`.
pub(crate) fn band_argmax(slice: &Slice, band: &BandFractions) -> Option<Point> {
    let rect = Rect::from_fractions(slice.shape(), band);
    let mut best: Option<(crate::Idx2d, i32)> = None;
    for pos in slice.rect_positions(&rect) {
        let raw = slice[pos];
        match best {
            Some((_, v)) if v >= raw => {}
            _ => best = Some((pos, raw)),
        }
    }
    best.map(|(pos, _)| idx_to_point(pos))
}

/// 整个序列的搜索带读数, 按切片顺序排列. 只用于定位和诊断.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BandProfile {
    readings: Vec<BandReading>,
}

impl BandProfile {
    /// 计算序列中每张切片的读数. 打开 `rayon` feature 时并行计算.
    pub fn compute(stack: &SliceStack, bands: &SearchBands) -> Self {
        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                use rayon::prelude::*;

                let readings = stack
                    .slices()
                    .par_iter()
                    .enumerate()
                    .map(|(i, s)| BandReading::read(i, s, bands))
                    .collect();
            } else {
                let readings = stack
                    .iter()
                    .enumerate()
                    .map(|(i, s)| BandReading::read(i, s, bands))
                    .collect();
            }
        }
        Self { readings }
    }

    /// 所有读数.
    #[inline]
    pub fn readings(&self) -> &[BandReading] {
        &self.readings
    }

    /// 读数个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// 是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}
