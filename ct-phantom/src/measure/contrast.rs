//! 模块 2: 低对比度对比噪声比 (CNR).

use std::f64::consts::PI;

use super::{MeasurementRecord, Reading, Unit};
use crate::config::Tolerances;
use crate::consts::module2::*;
use crate::data::Slice;
use crate::geometry::{lerp, Geometry};
use crate::locate::Module;
use crate::roi::{masked_stats, Disk, Roi, RoiStats};
use crate::{PhantomError, PhantomResult};

/// 模块 2 的全部 ROI.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// 25mm 大对比棒.
    pub large_rod: Disk,
    /// 背景.
    pub background: Disk,
    /// 6mm 组的四根棒 A, B, C, D.
    pub group_6mm: [Disk; 4],
    /// 5mm 组的四根棒 E, F, G, H.
    pub group_5mm: [Disk; 4],
}

/// 两端点之间等分出的四根棒.
fn rod_group(g: &Geometry, [(r0, a0), (r1, a1)]: [(f64, f64); 2], radius: f64) -> [Disk; 4] {
    let first = g.at(r0, a0);
    let last = g.at(r1, a1);
    [0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0].map(|t| Disk::new(lerp(first, last, t), radius))
}

/// 计算模块 2 的 ROI 位置. `spacing` 为像素间距 (mm).
pub fn layout(g: &Geometry, spacing: f64) -> Layout {
    let roi_radius = (ROI_AREA_MM2 / PI).sqrt() / spacing;
    let rod_radius = (roi_radius * ROD_SCALE).trunc();
    let roi_radius = roi_radius.trunc();

    let (r, a) = LARGE_ROD;
    let large_rod = Disk::new(g.at(r, a), roi_radius);
    let (r, a) = BACKGROUND;
    let background = Disk::new(g.at(r, a), roi_radius);
    Layout {
        large_rod,
        background,
        group_6mm: rod_group(g, GROUP_6MM, rod_radius),
        group_5mm: rod_group(g, GROUP_5MM, rod_radius),
    }
}

/// 对比噪声比 `(roi.mean - bkg.mean) / bkg.std`.
///
/// 背景标准差为 0 时返回 `Err(PhantomError::UndefinedStatistic)`.
pub fn cnr(roi: &RoiStats, background: &RoiStats) -> PhantomResult<f64> {
    if background.std == 0.0 {
        return Err(PhantomError::UndefinedStatistic(
            "cnr with zero background noise".into(),
        ));
    }
    Ok((roi.mean - background.mean) / background.std)
}

/// 测量模块 2.
///
/// 背景与 25mm 棒使用 100 mm² 的圆 ROI; 两组小棒的统计量在四根棒 ROI 的并集上计算.
/// 只有 25mm 棒的 CNR 有判定.
pub fn measure(slice: &Slice, g: &Geometry, tol: &Tolerances) -> MeasurementRecord {
    let layout = layout(g, slice.spacing());
    let mut rec = MeasurementRecord::new(Module::Two);

    let background = masked_stats(slice, &layout.background.into());
    rec.push(
        "Background: mean",
        background.clone().map(|s| Reading::plain(s.mean, Unit::Hu)),
    );
    rec.push(
        "Background: std",
        background.clone().map(|s| Reading::plain(s.std, Unit::Hu)),
    );

    let targets: [(&str, Roi, Option<f64>); 3] = [
        ("25mm rod", layout.large_rod.into(), Some(tol.min_cnr)),
        ("6mm group", Roi::Union(layout.group_6mm.to_vec()), None),
        ("5mm group", Roi::Union(layout.group_5mm.to_vec()), None),
    ];
    for (name, roi, min_cnr) in targets {
        let stats = masked_stats(slice, &roi);
        rec.push(
            format!("{name}: mean"),
            stats.clone().map(|s| Reading::plain(s.mean, Unit::Hu)),
        );
        rec.push(
            format!("{name}: std"),
            stats.clone().map(|s| Reading::plain(s.std, Unit::Hu)),
        );
        let value = stats.and_then(|s| {
            let bkg = background.clone()?;
            cnr(&s, &bkg)
        });
        rec.push(
            format!("{name}: CNR"),
            value.map(|v| match min_cnr {
                Some(min) => Reading::at_least(v, Unit::Ratio, min),
                None => Reading::plain(v, Unit::Ratio),
            }),
        );
    }
    rec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::midpoint_and_rotation;
    use crate::measure::{Outcome, Verdict};
    use crate::test_utils::{blank_slice, paint_disk, paint_with, raw_hu};
    use approx::assert_relative_eq;

    fn geometry() -> Geometry {
        midpoint_and_rotation((128.0, 28.0), (128.0, 228.0)).unwrap()
    }

    /// 背景为 ±2 HU 棋盘格噪声, 大棒 +10 HU, 小棒 +6 HU.
    fn phantom(noise: bool) -> Slice {
        let g = geometry();
        let l = layout(&g, 1.0);
        let mut s = blank_slice((256, 256), 1.0);
        paint_disk(&mut s, l.large_rod.center, 8.0, raw_hu(10));
        for rod in l.group_6mm.iter().chain(l.group_5mm.iter()) {
            paint_disk(&mut s, rod.center, 5.0, raw_hu(6));
        }
        if noise {
            paint_with(&mut s, |(h, w), v| if (h + w) % 2 == 0 { v + 2 } else { v - 2 });
        }
        s
    }

    #[test]
    fn test_layout() {
        let l = layout(&geometry(), 1.0);
        // sqrt(100 / pi) = 5.64
        assert_eq!(l.background.radius, 5.0);
        assert_eq!(l.group_6mm[0].radius, 3.0);
        assert_relative_eq!(l.large_rod.center.0, 128.0, epsilon = 1e-9);
        assert_relative_eq!(l.large_rod.center.1, 70.0, epsilon = 1e-9);
        let [a, b, c, d] = l.group_6mm;
        assert_relative_eq!(b.center.0 - a.center.0, c.center.0 - b.center.0, epsilon = 1e-9);
        assert_relative_eq!(d.center.1 - c.center.1, c.center.1 - b.center.1, epsilon = 1e-9);
    }

    #[test]
    fn test_cnr() {
        let s = phantom(true);
        let rec = measure(&s, &geometry(), &Tolerances::default());
        assert_relative_eq!(rec.reading("Background: std").unwrap().value, 2.0, epsilon = 0.02);

        let bkg_mean = rec.reading("Background: mean").unwrap().value;
        let bkg_std = rec.reading("Background: std").unwrap().value;

        // 棋盘格在小圆盘上不完全抵消, 因此只做近似比较.
        let large = rec.reading("25mm rod: CNR").unwrap();
        let mean = rec.reading("25mm rod: mean").unwrap().value;
        assert_relative_eq!(large.value, (mean - bkg_mean) / bkg_std, epsilon = 1e-9);
        assert_relative_eq!(large.value, 5.0, epsilon = 0.3);
        assert_eq!(large.verdict, Some(Verdict::Pass));

        for group in ["6mm group", "5mm group"] {
            let r = rec.reading(&format!("{group}: CNR")).unwrap();
            assert_relative_eq!(r.value, 3.0, epsilon = 0.35);
            assert_eq!(r.verdict, None);
        }
    }

    #[test]
    fn test_zero_noise() {
        let s = phantom(false);
        let rec = measure(&s, &geometry(), &Tolerances::default());
        assert_relative_eq!(rec.reading("25mm rod: mean").unwrap().value, 10.0);
        for name in ["25mm rod", "6mm group", "5mm group"] {
            assert!(matches!(
                rec.get(&format!("{name}: CNR")),
                Some(Outcome::Failed(PhantomError::UndefinedStatistic(_)))
            ));
        }
    }
}
