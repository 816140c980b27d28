//! 定位阈值与测量容差.
//!
//! 所有字段都有默认值 (见 [`crate::consts`]). 打开 `io` feature 后可以从 TOML 读取,
//! 缺省的字段取默认值:
//!
//! ```toml
//! [locator]
//! marker_threshold = 180.0
//!
//! [tolerances]
//! uniformity_hu = 4.0
//! ```

use crate::consts::{self, bands::Fractions};

/// 一个搜索矩形带, 以图像宽高的分数表示.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BandFractions {
    /// 列方向 `[x0, x1)`.
    pub x: (f64, f64),
    /// 行方向 `[y0, y1)`.
    pub y: (f64, f64),
}

impl From<Fractions> for BandFractions {
    #[inline]
    fn from((x, y): Fractions) -> Self {
        Self { x, y }
    }
}

/// 五个搜索矩形带.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SearchBands {
    /// 顶部定位标记.
    pub top: BandFractions,
    /// 底部定位标记.
    pub bottom: BandFractions,
    /// 线对区.
    pub line_pairs: BandFractions,
    /// 体模中心.
    pub center: BandFractions,
    /// 对角定位标记.
    pub diagonal: BandFractions,
}

impl Default for SearchBands {
    fn default() -> Self {
        use consts::bands::*;

        Self {
            top: TOP_MARKER.into(),
            bottom: BOTTOM_MARKER.into(),
            line_pairs: LINE_PAIRS.into(),
            center: CENTER.into(),
            diagonal: DIAGONAL.into(),
        }
    }
}

/// 模块定位参数.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LocatorConfig {
    /// 定位标记阈值 (HU).
    pub marker_threshold: f64,
    /// 线对区均值阈值 (HU).
    pub line_pair_threshold: f64,
    /// 相邻模块的名义间距 (mm).
    pub module_spacing_mm: f64,
    /// 搜索矩形带.
    pub bands: SearchBands,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            marker_threshold: consts::locator::MARKER_THRESHOLD,
            line_pair_threshold: consts::locator::LINE_PAIR_THRESHOLD,
            module_spacing_mm: consts::MODULE_SPACING_MM,
            bands: SearchBands::default(),
        }
    }
}

/// 判定通过与否所用的容差.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Tolerances {
    /// 层厚 (mm).
    pub thickness_mm: f64,
    /// 均匀性 (HU).
    pub uniformity_hu: f64,
    /// 距离标记间距 (mm).
    pub distance_mm: f64,
    /// 距离标记的名义间距 (mm).
    pub nominal_distance_mm: f64,
    /// 大对比棒 CNR 下限.
    pub min_cnr: f64,
    /// 斜坡线峰值高度比例.
    pub peak_height_ratio: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        use consts::tolerance::*;

        Self {
            thickness_mm: THICKNESS_MM,
            uniformity_hu: UNIFORMITY_HU,
            distance_mm: DISTANCE_MM,
            nominal_distance_mm: consts::module3::BB_DISTANCE_MM,
            min_cnr: MIN_CNR,
            peak_height_ratio: consts::module1::PEAK_HEIGHT_RATIO,
        }
    }
}

/// 全部配置.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PhantomConfig {
    /// 定位参数.
    pub locator: LocatorConfig,
    /// 测量容差.
    pub tolerances: Tolerances,
}

#[cfg(feature = "io")]
impl PhantomConfig {
    /// 从 TOML 文本解析配置.
    pub fn from_toml_str(text: &str) -> crate::PhantomResult<Self> {
        toml::from_str(text).map_err(|e| crate::PhantomError::Load(e.to_string()))
    }

    /// 从 TOML 文件读取配置.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> crate::PhantomResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| crate::PhantomError::Load(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = PhantomConfig::default();
        assert_eq!(cfg.locator.marker_threshold, 200.0);
        assert_eq!(cfg.locator.line_pair_threshold, 150.0);
        assert_eq!(cfg.locator.bands.top.y, (0.0, 1.0 / 11.0));
        assert_eq!(cfg.tolerances.uniformity_hu, 5.0);
        assert_eq!(cfg.tolerances.nominal_distance_mm, 100.0);
    }

    #[cfg(feature = "io")]
    #[test]
    fn test_partial_toml() {
        let text = r#"
            [locator]
            marker_threshold = 180.0

            [tolerances]
            uniformity_hu = 4.0
        "#;
        let cfg = PhantomConfig::from_toml_str(text).unwrap();
        assert_eq!(cfg.locator.marker_threshold, 180.0);
        assert_eq!(cfg.locator.line_pair_threshold, 150.0);
        assert_eq!(cfg.locator.bands, SearchBands::default());
        assert_eq!(cfg.tolerances.uniformity_hu, 4.0);
        assert_eq!(cfg.tolerances.distance_mm, 1.0);
    }

    #[cfg(feature = "io")]
    #[test]
    fn test_bad_toml() {
        let err = PhantomConfig::from_toml_str("[locator]\nmarker_threshold = \"x\"").unwrap_err();
        assert!(matches!(err, crate::PhantomError::Load(_)));
    }
}
