//! 四个模块的测量, 以及测量结果的记录格式.
//!
//! 每个模块的测量都是纯函数: 输入切片, 模块几何和容差, 输出一条 [`MeasurementRecord`].
//! 单项测量失败 (例如 ROI 落在图像外) 只记录在该项上, 不影响其它项.

use std::fmt::{Display, Formatter};

use log::{debug, warn};

use crate::config::Tolerances;
use crate::data::SliceStack;
use crate::locate::{LandmarkRecord, LandmarkSet, Module};
use crate::{PhantomError, PhantomResult};

pub mod contrast;
pub mod resolution;
pub mod thickness;
pub mod uniformity;

/// 读数的单位.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Unit {
    /// CT 值.
    Hu,
    /// 毫米.
    Mm,
    /// 计数.
    Count,
    /// 无量纲比值.
    Ratio,
}

impl Display for Unit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Hu => "HU",
            Self::Mm => "mm",
            Self::Count => "count",
            Self::Ratio => "ratio",
        })
    }
}

/// 通过 / 不通过.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Verdict {
    /// 通过.
    Pass,
    /// 不通过.
    Fail,
}

impl Display for Verdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pass => "Pass",
            Self::Fail => "Fail",
        })
    }
}

/// 一项数值读数.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// 测量值.
    pub value: f64,
    /// 单位.
    pub unit: Unit,
    /// 判定结果. 没有适用容差时为 `None`.
    pub verdict: Option<Verdict>,
    /// 超出接受区间的带符号量 (区间内为 0). 没有适用容差时为 `None`.
    pub excess: Option<f64>,
}

impl Reading {
    /// 无容差的读数.
    #[inline]
    pub fn plain(value: f64, unit: Unit) -> Self {
        Self {
            value,
            unit,
            verdict: None,
            excess: None,
        }
    }

    /// 接受区间为 `[lo, hi]` (含端点) 的读数.
    pub fn within(value: f64, unit: Unit, lo: f64, hi: f64) -> Self {
        let excess = if value < lo {
            value - lo
        } else if value > hi {
            value - hi
        } else {
            0.0
        };
        let verdict = if (lo..=hi).contains(&value) {
            Verdict::Pass
        } else {
            Verdict::Fail
        };
        Self {
            value,
            unit,
            verdict: Some(verdict),
            excess: Some(excess),
        }
    }

    /// 接受区间为 `[min, +inf)` 的读数.
    #[inline]
    pub fn at_least(value: f64, unit: Unit, min: f64) -> Self {
        Self::within(value, unit, min, f64::INFINITY)
    }

    /// 是否通过? 没有适用容差时返回 `None`.
    #[inline]
    pub fn passed(&self) -> Option<bool> {
        self.verdict.map(|v| v == Verdict::Pass)
    }
}

/// 单项测量的结果: 读数或失败原因.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    /// 测量成功.
    Measured(Reading),
    /// 测量失败.
    Failed(PhantomError),
}

impl From<PhantomResult<Reading>> for Outcome {
    #[inline]
    fn from(r: PhantomResult<Reading>) -> Self {
        match r {
            Ok(reading) => Self::Measured(reading),
            Err(e) => Self::Failed(e),
        }
    }
}

impl Outcome {
    /// 读数. 失败时返回 `None`.
    #[inline]
    pub fn reading(&self) -> Option<&Reading> {
        match self {
            Self::Measured(r) => Some(r),
            Self::Failed(_) => None,
        }
    }

    /// 失败原因. 成功时返回 `None`.
    #[inline]
    pub fn error(&self) -> Option<&PhantomError> {
        match self {
            Self::Measured(_) => None,
            Self::Failed(e) => Some(e),
        }
    }
}

/// 一项带标签的测量结果.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entry {
    /// 标签, 在同一模块内唯一.
    pub label: String,
    /// 结果.
    pub outcome: Outcome,
}

/// 单个模块的全部测量结果, 保持测量顺序.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeasurementRecord {
    module: Module,
    entries: Vec<Entry>,
}

impl MeasurementRecord {
    /// 创建空记录.
    #[inline]
    pub fn new(module: Module) -> Self {
        Self {
            module,
            entries: Vec::new(),
        }
    }

    /// 整个模块失败时的记录: 仅含一项 `Geometry` 失败.
    pub fn failed(module: Module, error: PhantomError) -> Self {
        let mut ans = Self::new(module);
        ans.push("Geometry", Err(error));
        ans
    }

    /// 追加一项结果. 失败会记录 `warn` 日志.
    pub fn push<S: Into<String>>(&mut self, label: S, result: PhantomResult<Reading>) {
        let label = label.into();
        if let Err(e) = &result {
            warn!("{} {label}: {e}", self.module);
        }
        self.entries.push(Entry {
            label,
            outcome: result.into(),
        });
    }

    /// 所属模块.
    #[inline]
    pub fn module(&self) -> Module {
        self.module
    }

    /// 按测量顺序排列的所有结果.
    #[inline]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// 按标签查找结果.
    pub fn get(&self, label: &str) -> Option<&Outcome> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| &e.outcome)
    }

    /// 按标签查找读数. 不存在或测量失败时返回 `None`.
    #[inline]
    pub fn reading(&self, label: &str) -> Option<&Reading> {
        self.get(label).and_then(Outcome::reading)
    }

    /// 所有失败项.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &PhantomError)> {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.error().map(|err| (e.label.as_str(), err)))
    }

    /// 所有项都测量成功, 且有判定的项全部通过?
    pub fn all_passed(&self) -> bool {
        self.entries.iter().all(|e| match &e.outcome {
            Outcome::Measured(r) => r.passed() != Some(false),
            Outcome::Failed(_) => false,
        })
    }
}

/// 测量单个模块.
///
/// 模块几何退化时返回只含一项失败的记录.
pub fn measure_module(
    stack: &SliceStack,
    record: &LandmarkRecord,
    tolerances: &Tolerances,
) -> MeasurementRecord {
    let geometry = match record.geometry() {
        Ok(g) => g,
        Err(e) => return MeasurementRecord::failed(record.module, e),
    };
    debug!("{}: {geometry:?}", record.module);

    let slice = &stack[record.slice_index];
    match record.module {
        Module::One => thickness::measure(slice, &geometry, tolerances),
        Module::Two => contrast::measure(slice, &geometry, tolerances),
        Module::Three => uniformity::measure(slice, &geometry, tolerances),
        Module::Four => resolution::measure(slice, &geometry, tolerances),
    }
}

/// 测量全部四个模块, 结果按模块顺序排列. 打开 `rayon` feature 时四个模块并行测量.
pub fn measure_all(
    stack: &SliceStack,
    landmarks: &LandmarkSet,
    tolerances: &Tolerances,
) -> [MeasurementRecord; 4] {
    let run = |m: Module| measure_module(stack, landmarks.get(m), tolerances);

    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            let ((r1, r2), (r3, r4)) = rayon::join(
                || rayon::join(|| run(Module::One), || run(Module::Two)),
                || rayon::join(|| run(Module::Three), || run(Module::Four)),
            );
            [r1, r2, r3, r4]
        } else {
            Module::ALL.map(run)
        }
    }
}
