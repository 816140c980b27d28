use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::{Rescale, SeriesInfo};
use crate::{PhantomError, PhantomResult};

/// 序列目录中的清单文件名.
pub const MANIFEST_NAME: &str = "series.toml";

fn one() -> f64 {
    1.0
}

/// 清单中的一张切片.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SliceEntry {
    /// 像素文件, 相对于序列目录.
    pub file: PathBuf,
    /// 扫描位置. 缺失表示定位片.
    #[serde(default)]
    pub location: Option<f64>,
    /// 层厚.
    #[serde(default)]
    pub thickness: Option<f64>,
    /// 像素间距.
    #[serde(default)]
    pub spacing: Option<f64>,
    /// 校准斜率, 默认 1.
    #[serde(default = "one")]
    pub slope: f64,
    /// 校准截距, 默认 0.
    #[serde(default)]
    pub intercept: f64,
}

impl SliceEntry {
    /// 校准变换.
    #[inline]
    pub fn rescale(&self) -> Rescale {
        Rescale::new(self.slope, self.intercept)
    }
}

/// `series.toml` 的内容.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Manifest {
    /// 序列描述信息.
    #[serde(default)]
    pub series: SeriesInfo,
    /// 切片, 顺序任意.
    #[serde(default, rename = "slice")]
    pub slices: Vec<SliceEntry>,
}

impl Manifest {
    /// 解析 TOML 文本.
    pub fn from_toml_str(text: &str) -> PhantomResult<Self> {
        toml::from_str(text).map_err(|e| PhantomError::Load(format!("{MANIFEST_NAME}: {e}")))
    }

    /// 读取目录 `dir` 下的清单.
    pub fn open<P: AsRef<Path>>(dir: P) -> PhantomResult<Self> {
        let path = dir.as_ref().join(MANIFEST_NAME);
        let text = std::fs::read_to_string(&path)
            .map_err(|e| PhantomError::Load(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let text = r#"
            [series]
            uid = "1.2.3"
            institution = "General"

            [[slice]]
            file = "img000.npy"
            location = -12.5
            thickness = 2.5
            spacing = 0.48828125
            intercept = -1024.0

            [[slice]]
            file = "scout.npy"
        "#;
        let m = Manifest::from_toml_str(text).unwrap();
        assert_eq!(m.series.uid.as_deref(), Some("1.2.3"));
        assert_eq!(m.series.description, None);
        assert_eq!(m.slices.len(), 2);
        assert_eq!(m.slices[0].rescale(), Rescale::new(1.0, -1024.0));
        assert_eq!(m.slices[1].location, None);
        assert_eq!(m.slices[1].rescale(), Rescale::default());
    }

    #[test]
    fn test_bad_manifest() {
        assert!(matches!(
            Manifest::from_toml_str("[[slice]]\nlocation = 1.0"),
            Err(PhantomError::Load(_))
        ));
    }
}
