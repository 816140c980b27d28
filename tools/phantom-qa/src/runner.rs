//! 程序运行函数.

use crate::result::QaResult;
use ct_phantom::pipeline::analyze_dir;
use ct_phantom::PhantomConfig;
use log::{error, info};
use rayon::prelude::*;
use std::path::PathBuf;

/// 实际运行. 每个序列独立分析, 单个序列失败不影响其它序列.
pub fn run(series: Vec<PathBuf>, cfg: &PhantomConfig) -> anyhow::Result<QaResult> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(utils::cpus())
        .build()?;

    info!("分析 {} 个序列...", series.len());
    let data = pool.install(|| {
        series
            .into_par_iter()
            .map(|dir| {
                let r = analyze_dir(&dir, cfg);
                if let Err(e) = &r {
                    error!("{}: {e}", dir.display());
                }
                (dir, r)
            })
            .collect::<Vec<_>>()
    });
    Ok(QaResult::from_iter(data))
}
