//! 模块 1: 层厚 (斜坡线条计数) 与 CT 值准确性.

use std::f64::consts::PI;

use log::debug;

use super::{MeasurementRecord, Reading, Unit};
use crate::config::Tolerances;
use crate::consts::module1::*;
use crate::data::Slice;
use crate::geometry::Geometry;
use crate::locate::Module;
use crate::roi::{masked_stats, Disk, LineProfile};
use crate::Point;

/// 一条斜坡线剖面.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampLine {
    /// 名称.
    pub name: &'static str,
    /// 起点.
    pub start: Point,
    /// 终点.
    pub end: Point,
}

/// 一个 CT 值插件 ROI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Insert {
    /// 材料名称.
    pub material: &'static str,
    /// ROI.
    pub disk: Disk,
    /// 接受区间 `[lo, hi]` (HU).
    pub limits: (f64, f64),
}

/// 模块 1 的全部 ROI.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// 四条斜坡线: 左上, 右上, 左下, 右下.
    pub ramps: [RampLine; 4],
    /// 五个插件.
    pub inserts: [Insert; 5],
}

/// 计算模块 1 的 ROI 位置. `spacing` 为像素间距 (mm).
pub fn layout(g: &Geometry, spacing: f64) -> Layout {
    let inner = g.radius() * RAMP_INNER;
    let outer = g.radius() * RAMP_OUTER;
    let ramp = |name, (r0, a0): (f64, f64), (r1, a1): (f64, f64)| RampLine {
        name,
        start: g.at_radius(r0, a0),
        end: g.at_radius(r1, a1),
    };
    let ramps = [
        ramp(
            "Top Left",
            (inner, -RAMP_NEAR_ARC),
            (outer, -RAMP_FAR_ARC),
        ),
        ramp(
            "Top Right",
            (inner, RAMP_NEAR_ARC),
            (outer, RAMP_FAR_ARC),
        ),
        ramp(
            "Bottom Left",
            (outer, PI + RAMP_FAR_ARC),
            (inner, PI + RAMP_NEAR_ARC),
        ),
        ramp(
            "Bottom Right",
            (outer, PI - RAMP_FAR_ARC),
            (inner, PI - RAMP_NEAR_ARC),
        ),
    ];

    let radius = ((INSERT_AREA_MM2 / PI).sqrt() / spacing).trunc();
    let inserts = MATERIALS.map(|(material, offset, lo, hi)| Insert {
        material,
        disk: Disk::new(g.at(INSERT_RADIUS, offset), radius),
        limits: (lo, hi),
    });
    Layout { ramps, inserts }
}

/// 测量模块 1.
///
/// - 每条斜坡线上高于 `min + ratio * (max - min)` 的峰的个数;
/// - 四条线计数的平均值作为测得层厚 (mm), 与名义层厚之差不超过容差时通过;
/// - 每个插件的 CT 均值 (按材料区间判定) 与标准差.
pub fn measure(slice: &Slice, g: &Geometry, tol: &Tolerances) -> MeasurementRecord {
    let layout = layout(g, slice.spacing());
    let mut rec = MeasurementRecord::new(Module::One);

    let counts: Vec<usize> = layout
        .ramps
        .iter()
        .map(|line| {
            let profile = LineProfile::sample(slice, line.start, line.end);
            let n = profile.count_peaks_above(tol.peak_height_ratio);
            debug!("{}: {} 个采样点, {n} 条", line.name, profile.values().len());
            n
        })
        .collect();
    for (line, &n) in layout.ramps.iter().zip(counts.iter()) {
        rec.push(
            format!("Slice thickness: {} bars", line.name),
            Ok(Reading::plain(n as f64, Unit::Count)),
        );
    }
    let average = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
    let nominal = slice.thickness();
    rec.push(
        "Slice thickness",
        Ok(Reading::within(
            average,
            Unit::Mm,
            nominal - tol.thickness_mm,
            nominal + tol.thickness_mm,
        )),
    );
    rec.push(
        "Slice thickness: difference from nominal",
        Ok(Reading::plain(average - nominal, Unit::Mm)),
    );

    for insert in layout.inserts.iter() {
        let stats = masked_stats(slice, &insert.disk.into());
        let (lo, hi) = insert.limits;
        rec.push(
            format!("CT number: {}", insert.material),
            stats.clone().map(|s| Reading::within(s.mean, Unit::Hu, lo, hi)),
        );
        rec.push(
            format!("CT number std: {}", insert.material),
            stats.map(|s| Reading::plain(s.std, Unit::Hu)),
        );
    }
    rec
}
