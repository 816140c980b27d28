//! 模块 4: 空间分辨率 (线对 ROI 的调制度).

use super::{MeasurementRecord, Reading, Unit};
use crate::config::Tolerances;
use crate::consts::module4::*;
use crate::data::Slice;
use crate::geometry::Geometry;
use crate::locate::Module;
use crate::roi::{masked_stats, Disk, LineProfile};
use crate::Point;

/// 一组线对的 ROI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePairRoi {
    /// 线对频率 (lp/cm).
    pub frequency: u32,
    /// 圆 ROI.
    pub disk: Disk,
    /// 穿过 ROI 的对角线段 (左下到右上).
    pub line: (Point, Point),
}

/// 计算模块 4 的八个 ROI, 按频率升序排列. `spacing` 为像素间距 (mm).
pub fn layout(g: &Geometry, spacing: f64) -> [LinePairRoi; 8] {
    let radius = (ROI_RADIUS_MM / spacing).trunc();
    let shift = (g.radius() * LINE_HALF).trunc();
    let mut i = 0;
    FREQUENCIES.map(|frequency| {
        i += 1;
        let angle = (45.0 * i as f64).to_radians();
        let (x, y) = g.at(ROI_CENTER, -angle);
        LinePairRoi {
            frequency,
            disk: Disk::new((x, y), radius),
            line: ((x - shift, y + shift), (x + shift, y - shift)),
        }
    })
}

/// 测量模块 4: 每组线对 ROI 的调制度, 线剖面调制度, 均值与标准差. 均没有判定.
pub fn measure(slice: &Slice, g: &Geometry, _tol: &Tolerances) -> MeasurementRecord {
    let mut rec = MeasurementRecord::new(Module::Four);

    for roi in layout(g, slice.spacing()) {
        let f = roi.frequency;
        let stats = masked_stats(slice, &roi.disk.into());
        rec.push(
            format!("{f} lp/cm: modulation"),
            stats
                .clone()
                .and_then(|s| s.modulation())
                .map(|m| Reading::plain(m, Unit::Ratio)),
        );
        let profile = LineProfile::sample(slice, roi.line.0, roi.line.1);
        rec.push(
            format!("{f} lp/cm: line modulation"),
            profile.modulation().map(|m| Reading::plain(m, Unit::Ratio)),
        );
        rec.push(
            format!("{f} lp/cm: mean"),
            stats.clone().map(|s| Reading::plain(s.mean, Unit::Hu)),
        );
        rec.push(
            format!("{f} lp/cm: std"),
            stats.map(|s| Reading::plain(s.std, Unit::Hu)),
        );
    }
    rec
}
