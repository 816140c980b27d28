//! 体模横断面上的极坐标几何.
//!
//! 图像坐标系中 `y` 向下增长. 这里的角度以 **竖直向上** 为 0, **顺时针** 为正,
//! 即 `x = ox + r * sin(θ)`, `y = oy - r * cos(θ)`.
//!
//! 所有坐标都保持为 `f64`, 只有在栅格化掩膜时才取整.

use std::fmt::Formatter;

use crate::{PhantomError, PhantomResult, Point};

/// 两点重合的判定阈值 (像素).
const DEGENERATE_EPS: f64 = 1e-9;

/// 由极坐标 `(radius, angle)` 得到以 `origin` 为原点的平面点.
#[inline]
pub fn to_cartesian(radius: f64, angle: f64, (ox, oy): Point) -> Point {
    (ox + radius * angle.sin(), oy - radius * angle.cos())
}

/// [`to_cartesian`] 的逆变换. 返回 `(radius, angle)`, 其中 `angle ∈ (-π, π]`.
#[inline]
pub fn to_polar((x, y): Point, (ox, oy): Point) -> (f64, f64) {
    let dx = x - ox;
    let dy = oy - y;
    (dx.hypot(dy), f64::atan2(dx, dy))
}

/// 线段 `a -> b` 上比例为 `t` 的点.
#[inline]
pub fn lerp((ax, ay): Point, (bx, by): Point, t: f64) -> Point {
    (ax + (bx - ax) * t, ay + (by - ay) * t)
}

/// 两点的欧氏距离.
#[inline]
pub fn distance((ax, ay): Point, (bx, by): Point) -> f64 {
    (bx - ax).hypot(by - ay)
}

/// 单个模块的体模几何: 中心, 半径与旋转角.
#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    center: Point,
    radius: f64,
    /// 弧度, 顺时针为正.
    rotation: f64,
}

/// 内部会将弧度转换为角度, 因为角度更加直观. 另外压缩到一行.
impl std::fmt::Debug for Geometry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "Geometry {{ center: ({:.2}, {:.2}), radius: {:.2}, rotation: {:.4}° }}",
            self.center.0,
            self.center.1,
            self.radius,
            self.rotation.to_degrees()
        ))
    }
}

/// 由上下两个定位标记计算中点, 半径与旋转角.
///
/// 半径为两点距离的一半; 旋转角为 `asin(dx / radius)`, 其中 `dx = top.x - mid.x`.
/// 交换两点只改变旋转角的符号.
///
/// # 返回值
///
/// 两点重合时返回 `Err(PhantomError::DegenerateGeometry)`.
pub fn midpoint_and_rotation(top: Point, bottom: Point) -> PhantomResult<Geometry> {
    let center = ((top.0 + bottom.0) / 2.0, (top.1 + bottom.1) / 2.0);
    let radius = distance(top, bottom) / 2.0;
    if !(radius > DEGENERATE_EPS) {
        return Err(PhantomError::DegenerateGeometry);
    }
    let dx = top.0 - center.0;
    let rotation = (dx / radius).clamp(-1.0, 1.0).asin();
    Ok(Geometry {
        center,
        radius,
        rotation,
    })
}

impl Geometry {
    /// 体模中心.
    #[inline]
    pub fn center(&self) -> Point {
        self.center
    }

    /// 体模半径 (像素).
    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// 旋转角 (弧度).
    #[inline]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// 相对体模的极坐标点: 半径为 `fraction * R`, 角度为 `rotation + offset`.
    #[inline]
    pub fn at(&self, fraction: f64, offset: f64) -> Point {
        self.at_radius(fraction * self.radius, offset)
    }

    /// 与 [`Self::at`] 相同, 但半径以像素给出.
    #[inline]
    pub fn at_radius(&self, radius: f64, offset: f64) -> Point {
        to_cartesian(radius, self.rotation + offset, self.center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_to_cartesian() {
        let (x, y) = to_cartesian(10.0, 0.0, (50.0, 50.0));
        assert!(f64_eq(x, 50.0) && f64_eq(y, 40.0));
        // 顺时针 90° 指向右方.
        let (x, y) = to_cartesian(10.0, FRAC_PI_2, (50.0, 50.0));
        assert!(f64_eq(x, 60.0) && f64_eq(y, 50.0));
        let (x, y) = to_cartesian(10.0, PI, (50.0, 50.0));
        assert!(f64_eq(x, 50.0) && f64_eq(y, 60.0));
    }

    #[test]
    fn test_polar_round_trip() {
        let origin = (128.0, 128.0);
        let mut angle = -FRAC_PI_2 + 0.01;
        while angle < FRAC_PI_2 {
            for radius in [1.0, 17.5, 100.0] {
                let p = to_cartesian(radius, angle, origin);
                let (r, a) = to_polar(p, origin);
                let q = to_cartesian(r, a, origin);
                assert!(distance(p, q) < 1.0);
                assert_relative_eq!(r, radius, epsilon = 1e-9);
                assert_relative_eq!(a, angle, epsilon = 1e-9);
            }
            angle += 0.05;
        }
    }

    #[test]
    fn test_midpoint_and_rotation() {
        let g = midpoint_and_rotation((100.0, 10.0), (100.0, 190.0)).unwrap();
        assert_eq!(g.center(), (100.0, 100.0));
        assert_relative_eq!(g.radius(), 90.0);
        assert_relative_eq!(g.rotation(), 0.0);

        // 顶部标记右移, 体模顺时针旋转.
        let g = midpoint_and_rotation((110.0, 10.0), (90.0, 190.0)).unwrap();
        assert!(g.rotation() > 0.0);
        let (x, y) = g.at(1.0, 0.0);
        assert_relative_eq!(x, 110.0, epsilon = 1e-9);
        assert_relative_eq!(y, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_swap_symmetry() {
        let (a, b) = ((103.0, 12.0), (98.0, 187.0));
        let g1 = midpoint_and_rotation(a, b).unwrap();
        let g2 = midpoint_and_rotation(b, a).unwrap();
        assert_eq!(g1.center(), g2.center());
        assert_relative_eq!(g1.radius(), g2.radius());
        assert_relative_eq!(g1.rotation(), -g2.rotation());
    }

    #[test]
    fn test_degenerate() {
        assert_eq!(
            midpoint_and_rotation((5.0, 5.0), (5.0, 5.0)),
            Err(PhantomError::DegenerateGeometry)
        );
    }
}
