use ndarray::{Array2, ArrayView2};
use std::ops::Index;

use super::{Rect, RectIter};
use crate::{Idx2d, PhantomError, PhantomResult};

/// 原始值到校准值 (HU) 的线性变换: `slope * raw + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rescale {
    /// 斜率.
    pub slope: f64,
    /// 截距.
    pub intercept: f64,
}

impl Default for Rescale {
    fn default() -> Self {
        Self {
            slope: 1.0,
            intercept: 0.0,
        }
    }
}

impl Rescale {
    /// 创建线性变换.
    #[inline]
    pub const fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    /// 对原始值应用变换.
    #[inline]
    pub fn apply(&self, raw: i32) -> f64 {
        self.slope * raw as f64 + self.intercept
    }

    /// 对浮点值 (例如插值结果) 应用变换.
    #[inline]
    pub fn apply_f64(&self, raw: f64) -> f64 {
        self.slope * raw + self.intercept
    }
}

/// 切片元数据. 在 [`Slice`] 中保证全部有效.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceMeta {
    /// 沿扫描轴的位置 (mm).
    pub location: f64,
    /// 层厚 (mm), 大于 0.
    pub thickness: f64,
    /// 面内像素间距 (mm), 大于 0. 假定像素为正方形.
    pub spacing: f64,
    /// 校准变换.
    pub rescale: Rescale,
}

/// 尚未检查元数据的切片, 由解码器 (或 [`crate::dataset`]) 产生.
///
/// 定位片等缺少扫描位置的切片在这里以 `None` 表示.
#[derive(Debug, Clone)]
pub struct RawSlice {
    /// 像素矩阵, `(行, 列)`.
    pub pixels: Array2<i32>,
    /// 扫描位置.
    pub location: Option<f64>,
    /// 层厚.
    pub thickness: Option<f64>,
    /// 像素间距.
    pub spacing: Option<f64>,
    /// 校准变换.
    pub rescale: Rescale,
    /// 来源描述 (例如文件名), 只用于日志.
    pub source: String,
}

impl RawSlice {
    /// 检查元数据并转换为 [`Slice`].
    ///
    /// # 返回值
    ///
    /// - 像素矩阵为空时返回 `Err(PhantomError::MissingMetadata)`;
    /// - 位置缺失或不是有限值时返回 `Err(PhantomError::MissingMetadata)`;
    /// - 层厚或像素间距缺失, 或不是正的有限值时返回 `Err(PhantomError::MissingMetadata)`.
    pub fn into_slice(self) -> PhantomResult<Slice> {
        let missing = |what: &str| PhantomError::MissingMetadata(format!("{}: {what}", self.source));

        if self.pixels.is_empty() {
            return Err(missing("empty pixel matrix"));
        }
        let location = self
            .location
            .filter(|v| v.is_finite())
            .ok_or_else(|| missing("slice location"))?;
        let positive = |v: &f64| v.is_finite() && *v > 0.0;
        let thickness = self
            .thickness
            .filter(positive)
            .ok_or_else(|| missing("slice thickness"))?;
        let spacing = self
            .spacing
            .filter(positive)
            .ok_or_else(|| missing("pixel spacing"))?;

        let meta = SliceMeta {
            location,
            thickness,
            spacing,
            rescale: self.rescale,
        };
        Ok(Slice::new(self.pixels, meta))
    }
}

/// 一张元数据完整的横断面切片. 像素为原始 (未校准) 整数值.
#[derive(Debug, Clone)]
pub struct Slice {
    pixels: Array2<i32>,
    meta: SliceMeta,
}

impl Index<Idx2d> for Slice {
    type Output = i32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.pixels[index]
    }
}

impl Slice {
    /// 由像素矩阵和元数据直接创建切片. 调用者保证元数据有效.
    #[inline]
    pub fn new(pixels: Array2<i32>, meta: SliceMeta) -> Self {
        Self { pixels, meta }
    }

    /// 获得底层像素矩阵的视图.
    #[inline]
    pub fn pixels(&self) -> ArrayView2<'_, i32> {
        self.pixels.view()
    }

    /// 合成测试图像时就地修改像素.
    #[cfg(test)]
    pub(crate) fn pixels_mut(&mut self) -> ndarray::ArrayViewMut2<'_, i32> {
        self.pixels.view_mut()
    }

    /// 获取元数据.
    #[inline]
    pub fn meta(&self) -> &SliceMeta {
        &self.meta
    }

    /// 由 [`crate::SliceStack`] 统一像素间距和校准变换.
    pub(crate) fn meta_mut(&mut self) -> &mut SliceMeta {
        &mut self.meta
    }

    /// 扫描位置.
    #[inline]
    pub fn location(&self) -> f64 {
        self.meta.location
    }

    /// 层厚.
    #[inline]
    pub fn thickness(&self) -> f64 {
        self.meta.thickness
    }

    /// 像素间距.
    #[inline]
    pub fn spacing(&self) -> f64 {
        self.meta.spacing
    }

    /// 校准变换.
    #[inline]
    pub fn rescale(&self) -> Rescale {
        self.meta.rescale
    }

    /// 获取切片形状 `(高, 宽)`.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.pixels.dim()
    }

    /// 图像高度 (行数).
    #[inline]
    pub fn height(&self) -> usize {
        self.pixels.nrows()
    }

    /// 图像宽度 (列数).
    #[inline]
    pub fn width(&self) -> usize {
        self.pixels.ncols()
    }

    /// 检查 `(h, w)` 是否在图像内.
    #[inline]
    pub fn check(&self, (h, w): Idx2d) -> bool {
        h < self.height() && w < self.width()
    }

    /// 以行优先顺序迭代 `rect` 与图像相交部分的所有位置.
    #[inline]
    pub fn rect_positions(&self, rect: &Rect) -> RectIter {
        rect.clip(self.shape()).positions()
    }

    /// 获得 `pos` 的 4-邻域像素索引. 保证返回的索引都不越界.
    pub fn n4_positions(&self, (h, w): Idx2d) -> Vec<Idx2d> {
        let mut ans = Vec::with_capacity(4);
        if h > 0 {
            ans.push((h - 1, w));
        }
        if w > 0 {
            ans.push((h, w - 1));
        }
        ans.push((h + 1, w));
        ans.push((h, w + 1));
        ans.retain(|p| self.check(*p));
        ans
    }

    /// 双线性插值获取原始值. `(x, y)` 会被夹到图像范围内.
    pub fn bilinear(&self, (x, y): crate::Point) -> f64 {
        let max_x = (self.width() - 1) as f64;
        let max_y = (self.height() - 1) as f64;
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);

        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (c0, r0) = (x0 as usize, y0 as usize);
        let c1 = (c0 + 1).min(self.width() - 1);
        let r1 = (r0 + 1).min(self.height() - 1);

        // `a + (b - a) * t` 保证相等的相邻像素插值后精确不变.
        let p = |r: usize, c: usize| self.pixels[(r, c)] as f64;
        let lerp = |a: f64, b: f64, t: f64| a + (b - a) * t;
        let top = lerp(p(r0, c0), p(r0, c1), fx);
        let bottom = lerp(p(r1, c0), p(r1, c1), fx);
        lerp(top, bottom, fy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn raw(location: Option<f64>) -> RawSlice {
        RawSlice {
            pixels: Array2::zeros((4, 4)),
            location,
            thickness: Some(2.5),
            spacing: Some(0.5),
            rescale: Rescale::new(1.0, -1024.0),
            source: "test".into(),
        }
    }

    #[test]
    fn test_into_slice() {
        let s = raw(Some(-3.0)).into_slice().unwrap();
        assert_eq!(s.location(), -3.0);
        assert_eq!(s.shape(), (4, 4));
        assert_eq!(s.rescale().apply(s[(0, 0)]), -1024.0);
        assert!(!s.check((4, 0)));
    }

    #[test]
    fn test_missing_metadata() {
        assert!(matches!(
            raw(None).into_slice(),
            Err(PhantomError::MissingMetadata(_))
        ));
        let mut r = raw(Some(0.0));
        r.thickness = Some(0.0);
        assert!(matches!(
            r.into_slice(),
            Err(PhantomError::MissingMetadata(_))
        ));
        let mut r = raw(Some(0.0));
        r.spacing = None;
        assert!(matches!(
            r.into_slice(),
            Err(PhantomError::MissingMetadata(_))
        ));
    }

    #[test]
    fn test_n4_positions() {
        let s = raw(Some(0.0)).into_slice().unwrap();
        assert_eq!(s.n4_positions((0, 0)), vec![(1, 0), (0, 1)]);
        assert_eq!(s.n4_positions((3, 3)), vec![(2, 3), (3, 2)]);
        assert_eq!(s.n4_positions((1, 1)).len(), 4);
    }

    #[test]
    fn test_bilinear() {
        let meta = SliceMeta {
            location: 0.0,
            thickness: 1.0,
            spacing: 1.0,
            rescale: Rescale::default(),
        };
        let s = Slice::new(array![[0, 10], [20, 30]], meta);
        assert_relative_eq!(s.bilinear((0.0, 0.0)), 0.0);
        assert_relative_eq!(s.bilinear((1.0, 1.0)), 30.0);
        assert_relative_eq!(s.bilinear((0.5, 0.5)), 15.0);
        assert_relative_eq!(s.bilinear((0.5, 0.0)), 5.0);
        // 越界时夹到边缘.
        assert_relative_eq!(s.bilinear((-3.0, 5.0)), 20.0);
    }
}
