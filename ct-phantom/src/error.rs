//! 运行时错误.

use thiserror::Error;

/// 定位或测量过程中的错误.
///
/// 每个变体的作用域不同:
///
/// - [`PhantomError::InsufficientLandmarks`] 使整个序列的分析失败;
/// - [`PhantomError::DegenerateGeometry`] 使单个模块失败;
/// - [`PhantomError::EmptyRoi`] 和 [`PhantomError::UndefinedStatistic`] 只使单项测量失败.
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PhantomError {
    /// 找不到足够的模块定位标记.
    #[error("insufficient landmarks: {0}")]
    InsufficientLandmarks(String),

    /// 上下两个定位标记重合, 无法确定中心和旋转.
    #[error("degenerate geometry: top and bottom markers coincide")]
    DegenerateGeometry,

    /// ROI 不覆盖任何有效 (原始值非 0) 像素.
    #[error("empty roi: {0}")]
    EmptyRoi(String),

    /// 切片缺少必需的元数据. 只在构建序列时出现.
    #[error("missing metadata: {0}")]
    MissingMetadata(String),

    /// 比值的分母为 0.
    #[error("undefined statistic: {0}")]
    UndefinedStatistic(String),

    /// 从磁盘加载序列或配置失败.
    #[error("load error: {0}")]
    Load(String),
}

/// 本 crate 通用的 `Result`.
pub type PhantomResult<T> = Result<T, PhantomError>;
