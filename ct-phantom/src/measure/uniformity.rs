//! 模块 3: 均匀性与几何距离.

use std::f64::consts::PI;

use super::{MeasurementRecord, Reading, Unit};
use crate::config::Tolerances;
use crate::consts::module3::*;
use crate::data::Slice;
use crate::geometry::{distance, Geometry};
use crate::locate::Module;
use crate::roi::{masked_argmax, masked_stats, Annulus, Disk, Roi};
use crate::{idx_to_point, PhantomResult};

/// 模块 3 的全部 ROI.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// 中心均匀性 ROI.
    pub center: Disk,
    /// 外周均匀性 ROI: 3:00, 6:00, 9:00, 12:00.
    pub peripherals: [(&'static str, Disk); 4],
    /// 搜索第一个距离标记的内圆.
    pub inner: Disk,
    /// 搜索第二个距离标记的外环.
    pub outer: Annulus,
}

/// 计算模块 3 的 ROI 位置. `spacing` 为像素间距 (mm).
pub fn layout(g: &Geometry, spacing: f64) -> Layout {
    let radius = ((ROI_AREA_MM2 / PI).sqrt() / spacing).trunc();
    let distance = g.radius() - 2.0 * radius;
    let peripherals = PERIPHERALS.map(|(name, offset)| {
        (name, Disk::new(g.at_radius(distance, offset), radius))
    });

    let search = (g.radius() * 0.5).trunc();
    Layout {
        center: Disk::new(g.center(), radius),
        peripherals,
        inner: Disk::new(g.center(), search),
        outer: Annulus {
            center: g.center(),
            inner: search,
            outer: search * 2.0,
        },
    }
}

/// 外周与中心均值之差的读数. `|diff| <= tol` 时通过.
#[inline]
pub fn uniformity_reading(diff: f64, tol: f64) -> Reading {
    Reading::within(diff, Unit::Hu, -tol, tol)
}

/// 两个距离标记间距 (mm) 的读数. 与名义值之差的绝对值不超过容差时通过.
#[inline]
pub fn distance_reading(mm: f64, tol: &Tolerances) -> Reading {
    let nominal = tol.nominal_distance_mm;
    Reading::within(mm, Unit::Mm, nominal - tol.distance_mm, nominal + tol.distance_mm)
}

/// 两个距离标记之间的像素距离.
fn marker_distance(slice: &Slice, layout: &Layout) -> PhantomResult<f64> {
    let first = masked_argmax(slice, &layout.inner.into())?;
    let second = masked_argmax(slice, &layout.outer.into())?;
    Ok(distance(idx_to_point(first), idx_to_point(second)))
}

/// 测量模块 3.
///
/// - 四个外周 ROI 与中心 ROI 的均值差;
/// - 内圆与外环中最亮像素的间距 (mm).
pub fn measure(slice: &Slice, g: &Geometry, tol: &Tolerances) -> MeasurementRecord {
    let layout = layout(g, slice.spacing());
    let mut rec = MeasurementRecord::new(Module::Three);

    let center = masked_stats(slice, &Roi::Disk(layout.center)).map(|s| s.mean);
    rec.push(
        "Uniformity: center mean",
        center.clone().map(|m| Reading::plain(m, Unit::Hu)),
    );
    for (name, disk) in layout.peripherals.iter() {
        let mean = masked_stats(slice, &Roi::Disk(*disk)).map(|s| s.mean);
        rec.push(
            format!("Uniformity: {name} mean"),
            mean.clone().map(|m| Reading::plain(m, Unit::Hu)),
        );
        let diff = mean.and_then(|m| center.clone().map(|c| m - c));
        rec.push(
            format!("Uniformity: {name}"),
            diff.map(|d| uniformity_reading(d, tol.uniformity_hu)),
        );
    }

    let mm = marker_distance(slice, &layout).map(|px| px * slice.spacing());
    rec.push(
        "Distance between markers",
        mm.map(|d| distance_reading(d, tol)),
    );
    rec
}
