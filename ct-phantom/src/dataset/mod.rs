//! 从磁盘加载切片序列.
//!
//! 序列目录包含一个 `series.toml` 清单和若干 `.npy` 二维整数数组 (行, 列),
//! 清单逐张记录切片的扫描位置, 层厚, 像素间距与校准变换. 参见 [`Manifest`].
//!
//! 这里只是一个简单的替身格式, 真实的影像容器解码不在本 crate 范围内.

use std::path::{Path, PathBuf};

use log::{debug, info};
use ndarray::Array2;
use ndarray_npy::{read_npy, ReadNpyError};

use crate::data::{RawSlice, SliceStack};
use crate::{PhantomError, PhantomResult};

mod manifest;

pub use manifest::{Manifest, SliceEntry, MANIFEST_NAME};

/// 读取 `.npy` 像素矩阵. 依次尝试 `i32`, `i16`, `u16` 元素类型.
pub fn read_pixels<P: AsRef<Path>>(path: P) -> PhantomResult<Array2<i32>> {
    let path = path.as_ref();
    let load_err = |e: ReadNpyError| PhantomError::Load(format!("{}: {e}", path.display()));

    match read_npy::<_, Array2<i32>>(path) {
        Ok(a) => return Ok(a),
        Err(ReadNpyError::WrongDescriptor(_)) => {}
        Err(e) => return Err(load_err(e)),
    }
    match read_npy::<_, Array2<i16>>(path) {
        Ok(a) => return Ok(a.mapv(i32::from)),
        Err(ReadNpyError::WrongDescriptor(_)) => {}
        Err(e) => return Err(load_err(e)),
    }
    read_npy::<_, Array2<u16>>(path)
        .map(|a| a.mapv(i32::from))
        .map_err(load_err)
}

/// 按清单读取一张切片.
fn read_entry(dir: &Path, entry: &SliceEntry) -> PhantomResult<RawSlice> {
    let path: PathBuf = dir.join(&entry.file);
    Ok(RawSlice {
        pixels: read_pixels(&path)?,
        location: entry.location,
        thickness: entry.thickness,
        spacing: entry.spacing,
        rescale: entry.rescale(),
        source: entry.file.display().to_string(),
    })
}

/// 加载目录 `dir` 下的序列.
///
/// # 返回值
///
/// - 清单或像素文件读取失败时返回 `Err(PhantomError::Load)`;
/// - 没有带扫描位置的切片时返回 `Err(PhantomError::InsufficientLandmarks)`.
pub fn load_series<P: AsRef<Path>>(dir: P) -> PhantomResult<SliceStack> {
    let dir = dir.as_ref();
    let manifest = Manifest::open(dir)?;
    debug!("{}: 清单含 {} 张切片", dir.display(), manifest.slices.len());

    let raws = manifest
        .slices
        .iter()
        .map(|e| read_entry(dir, e))
        .collect::<PhantomResult<Vec<_>>>()?;
    let stack = SliceStack::new(raws)?.with_info(manifest.series);
    info!("{}: 加载 {} 张切片", dir.display(), stack.len());
    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_npy::write_npy;

    fn write_series(dir: &Path) {
        write_npy(dir.join("a.npy"), &array![[1i32, 2], [3, 4]]).unwrap();
        write_npy(dir.join("b.npy"), &array![[5i16, 6], [7, 8]]).unwrap();
        write_npy(dir.join("scout.npy"), &array![[0u16, 0], [0, 0]]).unwrap();
        let manifest = r#"
            [series]
            description = "ACR"

            [[slice]]
            file = "a.npy"
            location = 5.0
            thickness = 2.0
            spacing = 0.5

            [[slice]]
            file = "scout.npy"

            [[slice]]
            file = "b.npy"
            location = -5.0
            thickness = 2.0
            spacing = 0.5
            slope = 2.0
            intercept = -10.0
        "#;
        std::fs::write(dir.join(MANIFEST_NAME), manifest).unwrap();
    }

    #[test]
    fn test_load_series() {
        let tmp = tempfile::tempdir().unwrap();
        write_series(tmp.path());
        let stack = load_series(tmp.path()).unwrap();

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.info().description.as_deref(), Some("ACR"));
        // 按位置排序后 b 在前; 校准变换取首张 (a) 的值.
        assert_eq!(stack[0].location(), -5.0);
        assert_eq!(stack[0][(1, 0)], 7);
        assert_eq!(stack[1][(0, 1)], 2);
        assert_eq!(stack.rescale().slope, 1.0);
    }

    #[test]
    fn test_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        write_series(tmp.path());
        std::fs::remove_file(tmp.path().join("b.npy")).unwrap();
        assert!(matches!(
            load_series(tmp.path()),
            Err(PhantomError::Load(_))
        ));
    }

    #[test]
    fn test_missing_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_series(tmp.path()),
            Err(PhantomError::Load(_))
        ));
    }
}
