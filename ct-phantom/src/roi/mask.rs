use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use binary_heap_plus::BinaryHeap;
use itertools::Itertools;
use num::ToPrimitive;

use crate::data::Slice;
use crate::{Idx2d, Point};

/// 将平面点四舍五入为 (可能越界的) 整数像素中心 `(行, 列)`.
/// 任何一个分量为非有限值或超出 `i64` 范围时返回 `None`.
#[inline]
fn rounded_center((x, y): Point) -> Option<(i64, i64)> {
    Some((y.round().to_i64()?, x.round().to_i64()?))
}

#[inline]
fn squared_distance((ch, cw): (i64, i64), (h, w): Idx2d) -> i64 {
    (h as i64 - ch).pow(2) + (w as i64 - cw).pow(2)
}

/// 实心圆盘. 圆心取整到最近的像素中心, 包含与圆心距离不大于半径的所有像素.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Disk {
    /// 圆心 `(x, y)`.
    pub center: Point,
    /// 半径 (像素).
    pub radius: f64,
}

impl Disk {
    /// 创建圆盘.
    #[inline]
    pub fn new(center: Point, radius: f64) -> Self {
        Self { center, radius }
    }

    /// 提取圆盘与图像相交部分的所有像素索引, 按到圆心的距离从近到远排列.
    ///
    /// 圆心在图像外时, 从图像内距圆心最近的像素出发扩展.
    /// 圆盘与图像不相交时返回空集合.
    pub fn positions(&self, slice: &Slice) -> Vec<Idx2d> {
        let (h, w) = slice.shape();
        if h == 0 || w == 0 || !(self.radius >= 0.0) {
            return vec![];
        }
        let Some(center) = rounded_center(self.center) else {
            return vec![];
        };
        let r2 = self.radius.powi(2);
        let inside = |p: &Idx2d| squared_distance(center, *p) as f64 <= r2;

        let start = (
            center.0.clamp(0, h as i64 - 1) as usize,
            center.1.clamp(0, w as i64 - 1) as usize,
        );
        if !inside(&start) {
            return vec![];
        }

        // 堆顶距圆心最近
        let mut heap: BinaryHeap<Idx2d, _> = BinaryHeap::new_by(|a: &Idx2d, b: &Idx2d| {
            squared_distance(center, *b).cmp(&squared_distance(center, *a))
        });
        heap.reserve(64);
        heap.push(start);
        let mut ans = Vec::with_capacity(64);
        let mut visited = HashSet::<Idx2d>::with_capacity(64);

        while let Some(pos) = heap.pop() {
            if !inside(&pos) {
                break;
            }
            if !visited.insert(pos) {
                continue;
            }
            ans.push(pos);
            for neigh in slice.n4_positions(pos) {
                if !visited.contains(&neigh) {
                    heap.push(neigh);
                }
            }
        }
        ans
    }
}

/// 圆环: 与圆心距离在 `(inner, outer]` 之间的像素.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Annulus {
    /// 圆心 `(x, y)`.
    pub center: Point,
    /// 内半径 (不含).
    pub inner: f64,
    /// 外半径 (含).
    pub outer: f64,
}

impl Annulus {
    /// 提取圆环与图像相交部分的所有像素索引.
    pub fn positions(&self, slice: &Slice) -> Vec<Idx2d> {
        let Some(center) = rounded_center(self.center) else {
            return vec![];
        };
        let inner2 = self.inner.powi(2);
        Disk::new(self.center, self.outer)
            .positions(slice)
            .into_iter()
            .filter(|p| squared_distance(center, *p) as f64 > inner2)
            .collect()
    }
}

/// 测量所用的掩膜.
#[derive(Debug, Clone, PartialEq)]
pub enum Roi {
    /// 单个圆盘.
    Disk(Disk),
    /// 圆环.
    Annulus(Annulus),
    /// 若干圆盘的并集.
    Union(Vec<Disk>),
}

impl From<Disk> for Roi {
    #[inline]
    fn from(d: Disk) -> Self {
        Self::Disk(d)
    }
}

impl From<Annulus> for Roi {
    #[inline]
    fn from(a: Annulus) -> Self {
        Self::Annulus(a)
    }
}

impl Roi {
    /// 掩膜覆盖的所有像素索引, 以行优先顺序排列, 无重复.
    pub fn positions(&self, slice: &Slice) -> Vec<Idx2d> {
        match self {
            Self::Disk(d) => d.positions(slice).into_iter().sorted_unstable().collect(),
            Self::Annulus(a) => a.positions(slice).into_iter().sorted_unstable().collect(),
            Self::Union(disks) => disks
                .iter()
                .flat_map(|d| d.positions(slice))
                .sorted_unstable()
                .dedup()
                .collect(),
        }
    }
}

impl Display for Roi {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disk(Disk { center, radius }) => write!(
                f,
                "disk at ({:.1}, {:.1}) r={radius:.1}",
                center.0, center.1
            ),
            Self::Annulus(Annulus {
                center,
                inner,
                outer,
            }) => write!(
                f,
                "annulus at ({:.1}, {:.1}) r=({inner:.1}, {outer:.1}]",
                center.0, center.1
            ),
            Self::Union(disks) => write!(f, "union of {} disks", disks.len()),
        }
    }
}
