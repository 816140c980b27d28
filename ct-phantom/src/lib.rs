#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 对 ACR CT 质控体模 (四模块圆柱体模) 的一组连续横断面切片进行模块定位,
//! 并在每个模块上放置几何 ROI, 计算质控指标.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 库本身不负责解码影像容器格式. 调用者负责把像素矩阵和
//!   扫描位置 / 层厚 / 像素间距 / 线性变换系数交给 [`data::SliceStack`].
//!   `io` feature 提供了一个以 `series.toml` + `.npy` 组织的简单目录格式.
//! 2. 坐标约定: 像素索引为 `(行, 列)`, 即 [`Idx2d`]; 几何计算使用 `(x, y)`,
//!   即 [`Point`], 其中 `x` 为列方向, `y` 为行方向 (向下增长).
//!   像素索引通过 [`idx_to_point`] 转换为平面点.
//!
//! # 开发计划
//!
//! ### 切片模型与序列排序 ✅
//!
//! 排除无扫描位置 (定位片) 的切片, 按扫描位置升序排列.
//!
//! 实现位于 `ct-phantom/src/data`.
//!
//! ### 极坐标几何 ✅
//!
//! 角度以竖直向上为 0, 顺时针为正. 由上下两个定位标记求中点, 半径和旋转角.
//!
//! 实现位于 `ct-phantom/src/geometry.rs`.
//!
//! ### 模块定位 ✅
//!
//! 对每张切片计算五个矩形带的读数, 选出模块 1 和模块 4, 再据此推出模块 2 和模块 3,
//! 并插值得到它们的标记坐标.
//!
//! 实现位于 `ct-phantom/src/locate`.
//!
//! ### ROI 掩膜, 线剖面与统计 ✅
//!
//! 圆盘 (按距离有序扩展), 圆环, 圆盘并集; 双线性插值线剖面与峰值计数.
//! 所有统计都排除原始值为 0 的像素.
//!
//! 实现位于 `ct-phantom/src/roi`.
//!
//! ### 四个模块的测量 ✅
//!
//! 1. 层厚与 CT 值 ✅
//! 2. 对比噪声比 ✅
//! 3. 均匀性与几何距离 ✅
//! 4. 空间分辨率 (调制度) ✅
//!
//! 实现位于 `ct-phantom/src/measure`.
//!
//! ### 结果汇总与流水线 ✅
//!
//! 实现位于 `ct-phantom/src/report.rs` 和 `ct-phantom/src/pipeline.rs`.
//!
//! ### 单点标记回退 ⌛️
//!
//! 只找到模块 1 或模块 4 之一时, 目前直接报错.

/// 二维像素索引, 即 `(行, 列)`.
pub type Idx2d = (usize, usize);

/// 平面点 `(x, y)`. `x` 对应列, `y` 对应行, 单位为像素.
pub type Point = (f64, f64);

/// 将像素索引转换为平面点 (像素中心).
#[inline]
pub fn idx_to_point((row, col): Idx2d) -> Point {
    (col as f64, row as f64)
}

pub mod config;
pub mod consts;
pub mod data;
pub mod error;
pub mod geometry;
pub mod locate;
pub mod measure;
pub mod pipeline;
pub mod prelude;
pub mod report;
pub mod roi;

#[cfg(feature = "io")]
pub mod dataset;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{LocatorConfig, PhantomConfig, Tolerances};
pub use data::{Rescale, Slice, SliceMeta, SliceStack};
pub use error::{PhantomError, PhantomResult};
pub use geometry::Geometry;
pub use locate::{LandmarkRecord, LandmarkSet, Module, ScanDirection};
pub use measure::{MeasurementRecord, Outcome, Reading, Verdict};
pub use report::PhantomReport;
