//! 对 `ct-phantom::dataset` 的更一层封装. 负责找到序列目录与配置文件.

use ct_phantom::dataset::MANIFEST_NAME;
use ct_phantom::{PhantomConfig, PhantomResult};
use std::env;
use std::path::{Path, PathBuf};

/// 序列根目录的环境变量.
pub const SERIES_DIR_VAR: &str = "PHANTOM_SERIES_DIR";

/// 配置文件的环境变量.
pub const CONFIG_VAR: &str = "PHANTOM_CONFIG";

/// 获取 `$HOME/dataset/phantom`. 找不到主目录时返回 `None`.
pub fn home_series_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join("dataset").join("phantom"))
}

/// 获取序列根目录.
///
/// 1. 若环境变量 `$PHANTOM_SERIES_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/phantom`.
pub fn series_root_from_env_or_home() -> Option<PathBuf> {
    match env::var(SERIES_DIR_VAR) {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => home_series_dir(),
    }
}

/// 在 `root` 下查找序列目录.
///
/// `root` 自身含有清单时只返回 `root`; 否则返回其直接子目录中含有清单的那些,
/// 按路径排序.
pub fn discover_series<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let root = root.as_ref();
    if root.join(MANIFEST_NAME).is_file() {
        return vec![root.to_path_buf()];
    }
    let Ok(rd) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut found: Vec<PathBuf> = rd
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.join(MANIFEST_NAME).is_file())
        .collect();
    found.sort_unstable();
    found
}

/// 获取配置文件路径: 显式参数优先, 其次是 `$PHANTOM_CONFIG`.
pub fn config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        env::var(CONFIG_VAR)
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    })
}

/// 加载配置. 没有配置文件时使用默认值.
pub fn load_config(explicit: Option<PathBuf>) -> PhantomResult<PhantomConfig> {
    match config_path(explicit) {
        Some(p) => PhantomConfig::load(p),
        None => Ok(PhantomConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_series() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        for name in ["b", "a", "empty"] {
            std::fs::create_dir(root.join(name)).unwrap();
        }
        std::fs::write(root.join("a").join(MANIFEST_NAME), "").unwrap();
        std::fs::write(root.join("b").join(MANIFEST_NAME), "").unwrap();

        assert_eq!(discover_series(root), vec![root.join("a"), root.join("b")]);
        assert_eq!(discover_series(root.join("a")), vec![root.join("a")]);
        assert!(discover_series(root.join("missing")).is_empty());
    }

    #[test]
    fn test_explicit_config() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("qa.toml");
        std::fs::write(&p, "[tolerances]\nmin_cnr = 2.0\n").unwrap();
        assert_eq!(config_path(Some(p.clone())), Some(p.clone()));
        let cfg = load_config(Some(p)).unwrap();
        assert_eq!(cfg.tolerances.min_cnr, 2.0);
    }
}
