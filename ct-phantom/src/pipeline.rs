//! 顶层流程: 切片序列 -> 模块定位 -> 四个模块的测量 -> 结果汇总.

use log::info;

use crate::config::PhantomConfig;
use crate::data::SliceStack;
use crate::locate::locate_landmarks;
use crate::measure::measure_all;
use crate::report::PhantomReport;
use crate::PhantomResult;

/// 分析一个切片序列.
///
/// # 返回值
///
/// 只有定位失败时返回 `Err(PhantomError::InsufficientLandmarks)`;
/// 模块或单项测量的失败记录在报告中.
pub fn analyze_stack(stack: &SliceStack, cfg: &PhantomConfig) -> PhantomResult<PhantomReport> {
    let loc = locate_landmarks(stack, &cfg.locator)?;
    let modules = measure_all(stack, &loc.landmarks, &cfg.tolerances);
    let report = PhantomReport::new(stack.info().clone(), loc.landmarks, loc.profile, modules);
    info!(
        "分析完成: {} 项失败, 全部通过: {}",
        report.failures().count(),
        report.all_passed()
    );
    Ok(report)
}

/// 加载并分析目录 `dir` 下的序列. 目录格式见 [`crate::dataset`].
#[cfg(feature = "io")]
pub fn analyze_dir<P: AsRef<std::path::Path>>(
    dir: P,
    cfg: &PhantomConfig,
) -> PhantomResult<PhantomReport> {
    let stack = crate::dataset::load_series(dir)?;
    analyze_stack(&stack, cfg)
}
