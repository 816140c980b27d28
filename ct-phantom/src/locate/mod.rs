//! 模块定位.
//!
//! 1. 对每张切片读取五个搜索带 ([`BandProfile`]);
//! 2. 上下标记都亮且线对区暗的切片是模块 1 的候选, 线对区亮的是模块 4 的候选,
//!    各取标记和最大者;
//! 3. 模块 2 按名义间距和层厚推算, 模块 3 在模块 1, 4 之间寻找对角标记最亮的切片;
//! 4. 模块 2, 3 的标记坐标在模块 1, 4 之间按轴向距离线性插值.

use std::fmt::{Display, Formatter};

use binary_heap_plus::BinaryHeap;
use log::{debug, warn};

use crate::config::LocatorConfig;
use crate::data::SliceStack;
use crate::geometry::{lerp, midpoint_and_rotation, Geometry};
use crate::{PhantomError, PhantomResult, Point};

mod band;

pub use band::{BandProfile, BandReading};

/// 体模的四个测试模块.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Module {
    /// 层厚与 CT 值.
    One = 1,
    /// 低对比度.
    Two = 2,
    /// 均匀性与距离.
    Three = 3,
    /// 空间分辨率.
    Four = 4,
}

impl Module {
    /// 按顺序排列的全部模块.
    pub const ALL: [Module; 4] = [Module::One, Module::Two, Module::Three, Module::Four];

    /// 模块编号 `1..=4`.
    #[inline]
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// 在 [`Self::ALL`] 中的下标.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize - 1
    }

    /// 相对模块 1 的名义轴向距离.
    #[inline]
    pub fn nominal_offset(self, module_spacing: f64) -> f64 {
        self.index() as f64 * module_spacing
    }
}

impl Display for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Module {}", self.number())
    }
}

/// 扫描方向: 模块 1 的位置小于模块 4 时为正.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScanDirection {
    /// 位置从模块 1 向模块 4 递增.
    Positive,
    /// 位置从模块 1 向模块 4 递减.
    Negative,
}

impl ScanDirection {
    /// `+1.0` 或 `-1.0`.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
        }
    }
}

/// 单个模块的定位结果.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LandmarkRecord {
    /// 模块.
    pub module: Module,
    /// 切片在序列中的下标.
    pub slice_index: usize,
    /// 切片扫描位置.
    pub location: f64,
    /// 顶部定位标记 `(x, y)`.
    pub top: Point,
    /// 底部定位标记 `(x, y)`.
    pub bottom: Point,
}

impl LandmarkRecord {
    /// 由两个定位标记推出的体模几何.
    #[inline]
    pub fn geometry(&self) -> PhantomResult<Geometry> {
        midpoint_and_rotation(self.top, self.bottom)
    }
}

/// 四个模块的定位结果, 按模块顺序排列.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LandmarkSet {
    records: [LandmarkRecord; 4],
    direction: ScanDirection,
}

impl LandmarkSet {
    /// 获取 `module` 的定位结果.
    #[inline]
    pub fn get(&self, module: Module) -> &LandmarkRecord {
        &self.records[module.index()]
    }

    /// 按模块顺序迭代.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, LandmarkRecord> {
        self.records.iter()
    }

    /// 扫描方向.
    #[inline]
    pub fn direction(&self) -> ScanDirection {
        self.direction
    }
}

/// 定位结果及用于诊断的搜索带读数.
#[derive(Debug, Clone)]
pub struct Localization {
    /// 四个模块的定位结果.
    pub landmarks: LandmarkSet,
    /// 每张切片的搜索带读数.
    pub profile: BandProfile,
}

/// 在 `readings` 中选出满足 `pred` 且标记和最大的切片. 并列时取序列中靠前者.
fn best_candidate<P>(readings: &[BandReading], pred: P) -> Option<BandReading>
where
    P: Fn(&BandReading) -> bool,
{
    // 堆顶标记和最大
    let mut heap = BinaryHeap::new_by(|a: &BandReading, b: &BandReading| {
        a.marker_sum()
            .total_cmp(&b.marker_sum())
            .then_with(|| b.index.cmp(&a.index))
    });
    heap.extend(readings.iter().copied().filter(|r| pred(r)));
    debug!("候选切片 {} 张", heap.len());
    heap.pop()
}

/// 模块 2 相对模块 1 的切片步数, 四舍五入 (0.5 进位).
#[inline]
fn module2_steps(distance: f64, thickness: f64) -> f64 {
    (distance / thickness + 0.5).floor()
}

/// 模块 3 搜索的偏移范围 `(span / 2, 5 * span / 6)`, 不含两端.
#[inline]
fn module3_offsets(span: usize) -> std::ops::Range<usize> {
    (span / 2 + 1)..(span * 5 / 6)
}

/// 定位四个模块.
///
/// # 返回值
///
/// - 序列不足四张切片时返回 `Err(PhantomError::InsufficientLandmarks)`;
/// - 找不到模块 1 或模块 4 的候选时返回 `Err(PhantomError::InsufficientLandmarks)`;
/// - 模块 2 的目标位置附近 (半个层厚内) 没有切片时同上;
/// - 模块 3 的搜索范围为空时同上.
pub fn locate_landmarks(stack: &SliceStack, cfg: &LocatorConfig) -> PhantomResult<Localization> {
    let insufficient = |msg: &str| PhantomError::InsufficientLandmarks(msg.to_string());
    if stack.len() < Module::ALL.len() {
        return Err(insufficient("fewer than four usable slices"));
    }
    let profile = BandProfile::compute(stack, &cfg.bands);
    let readings = profile.readings();

    let marker = cfg.marker_threshold;
    let line_pair = cfg.line_pair_threshold;
    let first = best_candidate(readings, |r| {
        r.has_markers(marker) && r.line_pair_mean <= line_pair
    })
    .ok_or_else(|| insufficient("no slice qualifies as module 1"))?;
    let last = best_candidate(readings, |r| {
        r.has_markers(marker) && r.line_pair_mean > line_pair
    })
    .ok_or_else(|| insufficient("no slice qualifies as module 4"))?;
    debug!(
        "模块 1: 切片 {} (位置 {}), 模块 4: 切片 {} (位置 {})",
        first.index, first.location, last.index, last.location
    );

    let direction = if first.location < last.location {
        ScanDirection::Positive
    } else {
        ScanDirection::Negative
    };
    let total = (last.location - first.location).abs();
    if total == 0.0 {
        return Err(insufficient("modules 1 and 4 share a scan position"));
    }
    let nominal_total = Module::Four.nominal_offset(cfg.module_spacing_mm);
    if (total - nominal_total).abs() > stack[first.index].thickness() * 2.0 {
        warn!("模块 1 与模块 4 相距 {total} mm, 名义值为 {nominal_total} mm");
    }

    // 模块 2: 由层厚推算.
    let thickness = stack[first.index].thickness();
    let steps = module2_steps(cfg.module_spacing_mm, thickness);
    let target = first.location + direction.sign() * steps * thickness;
    let second = readings
        .iter()
        .fold(None::<&BandReading>, |best, r| match best {
            Some(b) if (b.location - target).abs() <= (r.location - target).abs() => Some(b),
            _ => Some(r),
        })
        .filter(|r| (r.location - target).abs() <= thickness / 2.0 + 1e-6)
        .ok_or_else(|| insufficient("no slice near the module 2 position"))?;

    // 模块 3: 在模块 1, 4 之间寻找对角标记最亮的切片.
    let span = first.index.abs_diff(last.index);
    let towards_last = |k: usize| {
        if last.index > first.index {
            first.index + k
        } else {
            first.index - k
        }
    };
    let third = module3_offsets(span)
        .map(|k| &readings[towards_last(k)])
        .fold(None::<&BandReading>, |best, r| match best {
            Some(b) if b.diagonal_max >= r.diagonal_max => Some(b),
            _ => Some(r),
        })
        .ok_or_else(|| insufficient("module 3 search range is empty"))?;
    debug!(
        "模块 2: 切片 {} (位置 {}), 模块 3: 切片 {} (位置 {})",
        second.index, second.location, third.index, third.location
    );

    let marker_of = |r: &BandReading| -> PhantomResult<(Point, Point)> {
        let s = &stack[r.index];
        let top = band::band_argmax(s, &cfg.bands.top);
        let bottom = band::band_argmax(s, &cfg.bands.bottom);
        top.zip(bottom)
            .ok_or_else(|| insufficient("marker band is empty"))
    };
    let (top1, bottom1) = marker_of(&first)?;
    let (top4, bottom4) = marker_of(&last)?;

    let record = |module: Module, r: &BandReading| {
        let t = (r.location - first.location).abs() / total;
        LandmarkRecord {
            module,
            slice_index: r.index,
            location: r.location,
            top: lerp(top1, top4, t),
            bottom: lerp(bottom1, bottom4, t),
        }
    };
    let records = [
        record(Module::One, &first),
        record(Module::Two, second),
        record(Module::Three, third),
        record(Module::Four, &last),
    ];
    for r in records.iter() {
        debug!("{}: {r:?}", r.module);
    }

    Ok(Localization {
        landmarks: LandmarkSet { records, direction },
        profile,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{landmark_stack, StackOptions};
    use approx::assert_relative_eq;

    fn assert_point_near(p: Point, q: Point, tol: f64) {
        assert!(
            (p.0 - q.0).abs() <= tol && (p.1 - q.1).abs() <= tol,
            "{p:?} vs {q:?}"
        );
    }

    fn check(set: &LandmarkSet) {
        let m1 = set.get(Module::One);
        let m2 = set.get(Module::Two);
        let m3 = set.get(Module::Three);
        let m4 = set.get(Module::Four);
        assert_eq!(
            set.iter().map(|r| r.module).collect::<Vec<_>>(),
            Module::ALL.to_vec()
        );
        assert_eq!(m1.top, (100.0, 10.0));
        assert_eq!(m1.bottom, (100.0, 190.0));
        assert_eq!(m4.top, (105.0, 12.0));
        assert_eq!(m4.bottom, (106.0, 188.0));
        assert_relative_eq!((m2.location - m1.location).abs(), 40.0);
        assert_relative_eq!((m3.location - m1.location).abs(), 70.0);
        assert_point_near(m2.top, (101.67, 10.67), 2.0);
        assert_point_near(m2.bottom, (102.0, 189.33), 2.0);
        assert_point_near(m3.top, (102.92, 11.17), 2.0);
        assert_point_near(m3.bottom, (103.5, 188.83), 2.0);
    }

    #[test]
    fn test_locate_sorted() {
        let stack = landmark_stack(&StackOptions::default());
        let loc = locate_landmarks(&stack, &LocatorConfig::default()).unwrap();
        check(&loc.landmarks);
        assert_eq!(loc.landmarks.direction(), ScanDirection::Positive);
        assert_eq!(loc.profile.len(), stack.len());
        // 相邻的弱标记切片不会被选中.
        assert_eq!(loc.landmarks.get(Module::One).slice_index, 2);
    }

    #[test]
    fn test_locate_shuffled() {
        let opts = StackOptions {
            shuffled: true,
            ..Default::default()
        };
        let stack = landmark_stack(&opts);
        let loc = locate_landmarks(&stack, &LocatorConfig::default()).unwrap();
        check(&loc.landmarks);
    }

    #[test]
    fn test_locate_negative_direction() {
        let opts = StackOptions {
            reversed: true,
            ..Default::default()
        };
        let stack = landmark_stack(&opts);
        let loc = locate_landmarks(&stack, &LocatorConfig::default()).unwrap();
        check(&loc.landmarks);
        assert_eq!(loc.landmarks.direction(), ScanDirection::Negative);
        let m1 = loc.landmarks.get(Module::One);
        let m4 = loc.landmarks.get(Module::Four);
        assert!(m1.location > m4.location);
    }

    #[test]
    fn test_missing_module4() {
        let opts = StackOptions {
            with_line_pairs: false,
            ..Default::default()
        };
        let stack = landmark_stack(&opts);
        let err = locate_landmarks(&stack, &LocatorConfig::default()).unwrap_err();
        assert!(matches!(err, PhantomError::InsufficientLandmarks(_)));
    }

    #[test]
    fn test_too_few_slices() {
        use crate::test_utils::blank_slice;

        let stack = SliceStack::from_slices(vec![
            blank_slice((32, 32), 1.0),
            blank_slice((32, 32), 1.0),
            blank_slice((32, 32), 1.0),
        ])
        .unwrap();
        let err = locate_landmarks(&stack, &LocatorConfig::default()).unwrap_err();
        assert_eq!(
            err,
            PhantomError::InsufficientLandmarks("fewer than four usable slices".to_string())
        );
    }

    #[test]
    fn test_module2_steps_round_half_up() {
        assert_eq!(module2_steps(40.0, 5.0), 8.0);
        assert_eq!(module2_steps(40.0, 3.0), 13.0);
        assert_eq!(module2_steps(40.0, 16.0), 3.0);
        assert_eq!(module2_steps(40.0, 80.0), 1.0);
    }

    #[test]
    fn test_module3_offsets() {
        assert_eq!(module3_offsets(24), 13..20);
        assert!(module3_offsets(2).is_empty());
    }
}
