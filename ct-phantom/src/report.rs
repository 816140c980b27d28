//! 单个序列的分析结果汇总.

use crate::data::SeriesInfo;
use crate::locate::{BandProfile, LandmarkSet, Module};
use crate::measure::{Entry, MeasurementRecord};
use crate::PhantomError;

/// 一个序列的完整结果: 描述信息, 定位结果, 按模块顺序排列的四条测量记录.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhantomReport {
    /// 序列描述信息.
    pub series: SeriesInfo,
    /// 四个模块的定位结果.
    pub landmarks: LandmarkSet,
    /// 每张切片的搜索带读数.
    pub band_profile: BandProfile,
    modules: [MeasurementRecord; 4],
}

impl PhantomReport {
    /// 汇总. `modules` 须按模块顺序排列.
    pub fn new(
        series: SeriesInfo,
        landmarks: LandmarkSet,
        band_profile: BandProfile,
        modules: [MeasurementRecord; 4],
    ) -> Self {
        debug_assert!(modules
            .iter()
            .zip(Module::ALL)
            .all(|(r, m)| r.module() == m));
        Self {
            series,
            landmarks,
            band_profile,
            modules,
        }
    }

    /// 获取 `module` 的测量记录.
    #[inline]
    pub fn module(&self, module: Module) -> &MeasurementRecord {
        &self.modules[module.index()]
    }

    /// 按模块顺序排列的测量记录.
    #[inline]
    pub fn records(&self) -> &[MeasurementRecord; 4] {
        &self.modules
    }

    /// 按模块顺序展开所有测量项.
    pub fn entries(&self) -> impl Iterator<Item = (Module, &Entry)> {
        self.modules
            .iter()
            .flat_map(|r| r.entries().iter().map(move |e| (r.module(), e)))
    }

    /// 所有失败项.
    pub fn failures(&self) -> impl Iterator<Item = (Module, &str, &PhantomError)> {
        self.modules
            .iter()
            .flat_map(|r| r.failures().map(move |(l, e)| (r.module(), l, e)))
    }

    /// 所有模块都通过?
    #[inline]
    pub fn all_passed(&self) -> bool {
        self.modules.iter().all(MeasurementRecord::all_passed)
    }
}
