//! 切片模型: 单张切片与按扫描位置排序的切片序列.

use std::ops::Index;

use log::{debug, warn};
use ordered_float::OrderedFloat;

use crate::{PhantomError, PhantomResult};

pub mod slice;

pub use slice::{RawSlice, Rect, RectIter, Rescale, Slice, SliceMeta};

/// 序列的描述信息. 全部可选, 只随结果一起输出.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SeriesInfo {
    /// 序列 UID.
    pub uid: Option<String>,
    /// 序列描述.
    pub description: Option<String>,
    /// 机构名称.
    pub institution: Option<String>,
    /// 检查日期.
    pub study_date: Option<String>,
}

/// 同一序列的切片, 按扫描位置升序排列. 至少含一张切片.
///
/// 所有切片共享第一张切片的像素间距和校准变换.
#[derive(Debug, Clone)]
pub struct SliceStack {
    slices: Vec<Slice>,
    info: SeriesInfo,
}

impl Index<usize> for SliceStack {
    type Output = Slice;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.slices[index]
    }
}

impl SliceStack {
    /// 由未检查的切片构建序列.
    ///
    /// 元数据不全的切片 (例如定位片) 会被排除并记录 `warn` 日志.
    /// 如果没有剩余切片, 返回 `Err(PhantomError::InsufficientLandmarks)`.
    pub fn new<I>(raws: I) -> PhantomResult<Self>
    where
        I: IntoIterator<Item = RawSlice>,
    {
        let mut excluded = 0usize;
        let slices: Vec<Slice> = raws
            .into_iter()
            .filter_map(|raw| match raw.into_slice() {
                Ok(s) => Some(s),
                Err(e) => {
                    warn!("排除切片: {e}");
                    excluded += 1;
                    None
                }
            })
            .collect();
        if excluded > 0 {
            debug!("共排除 {excluded} 张切片, 剩余 {} 张", slices.len());
        }
        Self::from_slices(slices)
    }

    /// 由已检查的切片构建序列. 切片按位置稳定排序.
    ///
    /// `slices` 为空时返回 `Err(PhantomError::InsufficientLandmarks)`.
    pub fn from_slices(mut slices: Vec<Slice>) -> PhantomResult<Self> {
        let Some(first) = slices.first() else {
            return Err(PhantomError::InsufficientLandmarks(
                "no slice with scan position".into(),
            ));
        };
        let (spacing, rescale) = (first.spacing(), first.rescale());
        for s in slices.iter_mut() {
            let meta = s.meta_mut();
            if meta.spacing != spacing || meta.rescale != rescale {
                warn!(
                    "位置 {} 处切片的像素间距或校准变换与首张切片不同, 使用首张切片的值",
                    meta.location
                );
                meta.spacing = spacing;
                meta.rescale = rescale;
            }
        }
        slices.sort_by_key(|s| OrderedFloat(s.location()));
        Ok(Self {
            slices,
            info: SeriesInfo::default(),
        })
    }

    /// 附加序列描述信息.
    #[inline]
    pub fn with_info(mut self, info: SeriesInfo) -> Self {
        self.info = info;
        self
    }

    /// 序列描述信息.
    #[inline]
    pub fn info(&self) -> &SeriesInfo {
        &self.info
    }

    /// 切片数.
    #[inline]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// 序列总是非空, 恒返回 `false`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// 获取第 `index` 张切片.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Slice> {
        self.slices.get(index)
    }

    /// 迭代所有切片.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Slice> {
        self.slices.iter()
    }

    /// 所有切片.
    #[inline]
    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    /// 像素间距 (mm).
    #[inline]
    pub fn spacing(&self) -> f64 {
        self.slices[0].spacing()
    }

    /// 校准变换.
    #[inline]
    pub fn rescale(&self) -> Rescale {
        self.slices[0].rescale()
    }
}

impl<'a> IntoIterator for &'a SliceStack {
    type Item = &'a Slice;
    type IntoIter = std::slice::Iter<'a, Slice>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.slices.iter()
    }
}
