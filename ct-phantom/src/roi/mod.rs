//! ROI 掩膜, 线剖面与掩膜统计.
//!
//! 所有统计只考虑 **原始值非 0** 的像素 (0 通常表示重建视野外的填充).

use itertools::{Itertools, MinMaxResult};

use crate::data::Slice;
use crate::{Idx2d, PhantomError, PhantomResult};

mod mask;
mod profile;

pub use mask::{Annulus, Disk, Roi};
pub use profile::LineProfile;

/// 掩膜内校准强度的统计量.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoiStats {
    /// 均值.
    pub mean: f64,
    /// 最大值.
    pub max: f64,
    /// 最小值.
    pub min: f64,
    /// 总体标准差.
    pub std: f64,
    /// 参与统计的像素个数.
    pub count: usize,
}

impl RoiStats {
    /// 从一组 (非空) 校准值计算统计量.
    fn from_values(values: &[f64]) -> Option<Self> {
        let (min, max) = match values.iter().copied().minmax() {
            MinMaxResult::NoElements => return None,
            MinMaxResult::OneElement(v) => (v, v),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            mean,
            max,
            min,
            std: var.sqrt(),
            count: values.len(),
        })
    }

    /// 调制度 `(max - min) / (max + min)`.
    #[inline]
    pub fn modulation(&self) -> PhantomResult<f64> {
        modulation(self.max, self.min)
    }
}

/// 调制度 `(max - min) / (max + min)`. `max == min` (非 0) 时为 0.
///
/// `max + min == 0` 时返回 `Err(PhantomError::UndefinedStatistic)`.
pub fn modulation(max: f64, min: f64) -> PhantomResult<f64> {
    let sum = max + min;
    if sum == 0.0 {
        return Err(PhantomError::UndefinedStatistic(format!(
            "modulation with max + min = 0 (max = {max})"
        )));
    }
    Ok((max - min).abs() / sum)
}

/// 计算 `roi` 覆盖的有效像素的校准统计量.
///
/// # 返回值
///
/// 有效像素个数为 0 时返回 `Err(PhantomError::EmptyRoi)`.
pub fn masked_stats(slice: &Slice, roi: &Roi) -> PhantomResult<RoiStats> {
    let rescale = slice.rescale();
    let values: Vec<f64> = roi
        .positions(slice)
        .into_iter()
        .map(|p| slice[p])
        .filter(|&raw| raw != 0)
        .map(|raw| rescale.apply(raw))
        .collect();
    RoiStats::from_values(&values).ok_or_else(|| PhantomError::EmptyRoi(roi.to_string()))
}

/// `roi` 覆盖的有效像素中原始值最大者的位置. 并列时取行优先顺序的第一个.
///
/// # 返回值
///
/// 有效像素个数为 0 时返回 `Err(PhantomError::EmptyRoi)`.
pub fn masked_argmax(slice: &Slice, roi: &Roi) -> PhantomResult<Idx2d> {
    let mut best: Option<(Idx2d, i32)> = None;
    for pos in roi.positions(slice) {
        let raw = slice[pos];
        if raw == 0 {
            continue;
        }
        match best {
            Some((_, v)) if v >= raw => {}
            _ => best = Some((pos, raw)),
        }
    }
    best.map(|(pos, _)| pos)
        .ok_or_else(|| PhantomError::EmptyRoi(roi.to_string()))
}
