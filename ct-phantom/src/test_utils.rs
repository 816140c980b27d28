//! 单元测试共用的合成体模图像.
//!
//! 所有图像都使用 `slope = 1`, `intercept = -1024`, 底色原始值为 1024 (即 0 HU),
//! 因此 "原始值为 0 的像素不参与统计" 不会误伤底色.

use ndarray::Array2;

use crate::data::{RawSlice, Rescale, Slice, SliceMeta, SliceStack};
use crate::locate::{LandmarkRecord, Module};
use crate::{Idx2d, Point};

/// 底色原始值.
pub const BASE: i32 = 1024;

/// 校准值为 `hu` 的原始值.
#[inline]
pub fn raw_hu(hu: i32) -> i32 {
    BASE + hu
}

pub fn meta(location: f64, thickness: f64, spacing: f64) -> SliceMeta {
    SliceMeta {
        location,
        thickness,
        spacing,
        rescale: Rescale::new(1.0, -1024.0),
    }
}

/// 全 0 HU 的切片.
pub fn blank_slice(shape: Idx2d, spacing: f64) -> Slice {
    Slice::new(Array2::from_elem(shape, BASE), meta(0.0, 1.0, spacing))
}

pub fn paint(slice: &mut Slice, pos: Idx2d, raw: i32) {
    slice.pixels_mut()[pos] = raw;
}

/// 将与 `center` 距离不超过 `radius` 的像素全部置为 `raw`.
pub fn paint_disk(slice: &mut Slice, (cx, cy): Point, radius: f64, raw: i32) {
    let mut pixels = slice.pixels_mut();
    for ((h, w), v) in pixels.indexed_iter_mut() {
        let (dx, dy) = (w as f64 - cx, h as f64 - cy);
        if dx * dx + dy * dy <= radius * radius {
            *v = raw;
        }
    }
}

/// 对每个像素应用 `f(pos, old) -> new`.
pub fn paint_with(slice: &mut Slice, f: impl Fn(Idx2d, i32) -> i32) {
    let mut pixels = slice.pixels_mut();
    for (pos, v) in pixels.indexed_iter_mut() {
        *v = f(pos, *v);
    }
}

pub fn record(module: Module, top: Point, bottom: Point) -> LandmarkRecord {
    LandmarkRecord {
        module,
        slice_index: 0,
        location: 0.0,
        top,
        bottom,
    }
}

/// 定位测试用的合成序列参数.
#[derive(Debug, Clone)]
pub struct StackOptions {
    /// 打乱输入顺序.
    pub shuffled: bool,
    /// 模块 1 位于扫描位置较大的一端.
    pub reversed: bool,
    /// 模块 4 的切片是否带线对.
    pub with_line_pairs: bool,
}

impl Default for StackOptions {
    fn default() -> Self {
        Self {
            shuffled: false,
            reversed: false,
            with_line_pairs: true,
        }
    }
}

/// 31 张 200 x 200 的切片, 层厚 5 mm, 另加一张无位置的定位片.
///
/// 按模块 1 起算的第 `i` 张切片距模块 1 所在端 `5 * i` mm:
///
/// - `i = 2`: 模块 1, 标记位于 `(100, 10)` 和 `(100, 190)`;
/// - `i = 1, 3`: 较弱的标记;
/// - `i = 16`: 模块 3 的对角标记; `i = 18`: 较弱的对角标记;
/// - `i = 26`: 模块 4, 标记位于 `(105, 12)` 和 `(106, 188)`, 线对区均值 400 HU.
pub fn landmark_stack(opts: &StackOptions) -> SliceStack {
    const N: usize = 31;
    let shape = (200, 200);

    let build = |i: usize| {
        let mut s = blank_slice(shape, 1.0);
        let marker = |s: &mut Slice, top: Idx2d, bottom: Idx2d, hu: i32| {
            paint(s, top, raw_hu(hu));
            paint(s, bottom, raw_hu(hu));
        };
        match i {
            2 => marker(&mut s, (10, 100), (190, 100), 1000),
            1 | 3 => marker(&mut s, (10, 100), (190, 100), 300),
            16 => paint(&mut s, (100, 100), raw_hu(800)),
            18 => paint(&mut s, (100, 100), raw_hu(400)),
            26 => {
                marker(&mut s, (12, 105), (188, 106), 1000);
                if opts.with_line_pairs {
                    // 线对带: 行 [18, 36), 列 [85, 114).
                    paint_with(&mut s, |(h, w), v| {
                        if (18..36).contains(&h) && (85..114).contains(&w) {
                            raw_hu(400)
                        } else {
                            v
                        }
                    });
                }
            }
            _ => {}
        }
        let offset = 5.0 * i as f64;
        let location = if opts.reversed { 150.0 - offset } else { offset };
        RawSlice {
            pixels: s.pixels().to_owned(),
            location: Some(location),
            thickness: Some(5.0),
            spacing: Some(1.0),
            rescale: Rescale::new(1.0, -1024.0),
            source: format!("synthetic-{i}"),
        }
    };

    let order: Vec<usize> = if opts.shuffled {
        // 7 与 31 互素, 得到一个排列.
        (0..N).map(|i| (i * 7) % N).collect()
    } else {
        (0..N).collect()
    };
    let mut raws: Vec<RawSlice> = order.into_iter().map(build).collect();
    raws.insert(
        N / 2,
        RawSlice {
            pixels: Array2::from_elem(shape, BASE),
            location: None,
            thickness: None,
            spacing: Some(1.0),
            rescale: Rescale::new(1.0, -1024.0),
            source: "localizer".into(),
        },
    );
    SliceStack::new(raws).unwrap()
}
