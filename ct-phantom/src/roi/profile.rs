use itertools::{Itertools, MinMaxResult};

use super::modulation;
use crate::data::Slice;
use crate::geometry::{distance, lerp};
use crate::{PhantomResult, Point};

/// 沿线段的校准强度剖面.
///
/// 采样点数为 `ceil(长度 + 1)`, 两端点都被采样; 每个采样点用双线性插值.
#[derive(Debug, Clone)]
pub struct LineProfile {
    values: Vec<f64>,
}

impl LineProfile {
    /// 在 `slice` 上采样 `start -> end` 的剖面.
    pub fn sample(slice: &Slice, start: Point, end: Point) -> Self {
        let n = (distance(start, end) + 1.0).ceil().max(1.0) as usize;
        let rescale = slice.rescale();
        let values = (0..n)
            .map(|i| {
                let t = if n == 1 {
                    0.0
                } else {
                    i as f64 / (n - 1) as f64
                };
                rescale.apply_f64(slice.bilinear(lerp(start, end, t)))
            })
            .collect();
        Self { values }
    }

    /// 采样值.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// 剖面的 `(min, max)`. 剖面总是至少含一个采样点.
    pub fn min_max(&self) -> (f64, f64) {
        match self.values.iter().copied().minmax() {
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
            MinMaxResult::OneElement(v) => (v, v),
            MinMaxResult::NoElements => (f64::NAN, f64::NAN),
        }
    }

    /// 所有局部极大值的下标.
    ///
    /// 平台 (连续相等的值) 两侧都严格更低时视为一个峰, 下标取平台中点 (向左取整).
    /// 两端点不会成为峰.
    pub fn peaks(&self) -> Vec<usize> {
        let x = &self.values;
        let mut ans = vec![];
        if x.len() < 3 {
            return ans;
        }
        let i_max = x.len() - 1;
        let mut i = 1;
        while i < i_max {
            if x[i - 1] < x[i] {
                let mut ahead = i + 1;
                while ahead < i_max && x[ahead] == x[i] {
                    ahead += 1;
                }
                if x[ahead] < x[i] {
                    ans.push((i + ahead - 1) / 2);
                    i = ahead;
                }
            }
            i += 1;
        }
        ans
    }

    /// 高度超过 `min + ratio * (max - min)` 的峰的个数.
    pub fn count_peaks_above(&self, ratio: f64) -> usize {
        let (lo, hi) = self.min_max();
        let threshold = lo + ratio * (hi - lo);
        self.peaks()
            .into_iter()
            .filter(|&i| self.values[i] > threshold)
            .count()
    }

    /// 剖面的调制度 `(max - min) / (max + min)`.
    ///
    /// `max + min == 0` 时返回 `Err(PhantomError::UndefinedStatistic)`.
    pub fn modulation(&self) -> PhantomResult<f64> {
        let (lo, hi) = self.min_max();
        modulation(hi, lo)
    }
}
