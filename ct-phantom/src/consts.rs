//! 通用常量. 体模几何参数均来自 ACR CT 体模 (Gammex 464) 的设计尺寸.

/// 模块 1 到模块 2/3/4 的名义轴向距离, 单位: mm.
pub const MODULE_SPACING_MM: f64 = 40.0;

/// 定位阶段的默认阈值.
pub mod locator {
    /// 上下定位标记带内的校准最大值需 **严格大于** 该值.
    pub const MARKER_THRESHOLD: f64 = 200.0;

    /// 线对带的校准均值 **严格大于** 该值时视为模块 4, 否则为模块 1.
    pub const LINE_PAIR_THRESHOLD: f64 = 150.0;
}

/// 搜索矩形带. 每一项为 `((x0, x1), (y0, y1))`, 是图像宽高的分数, 半开区间.
pub mod bands {
    /// 宽高分数对.
    pub type Fractions = ((f64, f64), (f64, f64));

    const MID_X: (f64, f64) = (3.0 / 7.0, 4.0 / 7.0);

    /// 顶部定位标记.
    pub const TOP_MARKER: Fractions = (MID_X, (0.0, 1.0 / 11.0));

    /// 底部定位标记.
    pub const BOTTOM_MARKER: Fractions = (MID_X, (10.0 / 11.0, 1.0));

    /// 模块 4 的线对区.
    pub const LINE_PAIRS: Fractions = (MID_X, (1.0 / 11.0, 2.0 / 11.0));

    /// 体模中心, 只用于诊断.
    pub const CENTER: Fractions = (MID_X, (5.0 / 11.0, 6.0 / 11.0));

    /// 模块 3 的对角定位标记.
    pub const DIAGONAL: Fractions = ((1.0 / 3.0, 2.0 / 3.0), (1.0 / 3.0, 2.0 / 3.0));
}

/// 模块 1: 层厚斜坡与 CT 值插件.
pub mod module1 {
    use std::f64::consts::FRAC_PI_4;

    /// 斜坡线内端点半径占体模半径的比例.
    pub const RAMP_INNER: f64 = 33.5 / 244.0;

    /// 斜坡线外端点半径占体模半径的比例.
    pub const RAMP_OUTER: f64 = 214.53 / 244.0;

    /// 斜坡线靠近中心一端的角度偏移 (弧度).
    pub const RAMP_NEAR_ARC: f64 = 0.464;

    /// 斜坡线远离中心一端的角度偏移 (弧度).
    pub const RAMP_FAR_ARC: f64 = 0.07;

    /// 峰值高度需超过 `min + RATIO * (max - min)`.
    pub const PEAK_HEIGHT_RATIO: f64 = 0.5;

    /// CT 值插件的 ROI 面积, 单位: mm².
    pub const INSERT_AREA_MM2: f64 = 200.0;

    /// CT 值插件中心半径占体模半径的比例.
    pub const INSERT_RADIUS: f64 = 0.63;

    /// 插件材料: (名称, 相对旋转角的弧度偏移, HU 下限, HU 上限).
    pub const MATERIALS: [(&str, f64, f64, f64); 5] = [
        ("Polyethylene", -FRAC_PI_4, -107.0, -84.0),
        ("Bone", FRAC_PI_4, 850.0, 970.0),
        ("Acrylic", -3.0 * FRAC_PI_4, 110.0, 135.0),
        ("Air", 3.0 * FRAC_PI_4, -1005.0, -970.0),
        ("Water", -2.0 * FRAC_PI_4, -7.0, 7.0),
    ];
}

/// 模块 2: 低对比度.
pub mod module2 {
    /// 背景 ROI 面积, 单位: mm².
    pub const ROI_AREA_MM2: f64 = 100.0;

    /// 单根对比棒 ROI 半径相对背景 ROI 半径的比例.
    pub const ROD_SCALE: f64 = 0.6;

    /// 25mm 大对比棒: (半径比例, 弧度偏移).
    pub const LARGE_ROD: (f64, f64) = (0.58, 0.0);

    /// 背景 ROI.
    pub const BACKGROUND: (f64, f64) = (0.54, -0.42);

    /// 6mm 组的两端 (A, D).
    pub const GROUP_6MM: [(f64, f64); 2] = [(0.56, -0.76), (0.545, -1.4)];

    /// 5mm 组的两端 (E, H), 已计入 72° 的组间偏移.
    pub const GROUP_5MM: [(f64, f64); 2] = [
        (0.56, -0.82 - 72.0 * std::f64::consts::PI / 180.0),
        (0.56, -1.37 - 72.0 * std::f64::consts::PI / 180.0),
    ];
}

/// 模块 3: 均匀性与距离.
pub mod module3 {
    /// 均匀性 ROI 面积, 单位: mm².
    pub const ROI_AREA_MM2: f64 = 400.0;

    /// 两个距离标记 (BB) 的名义间距, 单位: mm.
    pub const BB_DISTANCE_MM: f64 = 100.0;

    /// 外周 ROI: (名称, 弧度偏移).
    pub const PERIPHERALS: [(&str, f64); 4] = [
        ("3:00", std::f64::consts::FRAC_PI_2),
        ("6:00", std::f64::consts::PI),
        ("9:00", 3.0 * std::f64::consts::FRAC_PI_2),
        ("12:00", 0.0),
    ];
}

/// 模块 4: 空间分辨率.
pub mod module4 {
    /// ROI 半径 = `trunc(ROI_RADIUS_MM / spacing)`.
    pub const ROI_RADIUS_MM: f64 = 11.0 * 0.55;

    /// ROI 中心半径占体模半径的比例.
    pub const ROI_CENTER: f64 = 0.705;

    /// 线剖面半长占体模半径的比例.
    pub const LINE_HALF: f64 = 0.04;

    /// 各 ROI 对应的线对频率 (lp/cm), 顺序同角度 45°, 90°, ..., 360°.
    pub const FREQUENCIES: [u32; 8] = [4, 5, 6, 7, 8, 9, 10, 12];
}

/// 默认容差.
pub mod tolerance {
    /// 层厚测量值与名义层厚之差的绝对值上限, 单位: mm.
    pub const THICKNESS_MM: f64 = 1.5;

    /// 均匀性: 外周与中心均值差的绝对值上限, 单位: HU.
    pub const UNIFORMITY_HU: f64 = 5.0;

    /// 距离标记间距与名义值之差的绝对值上限, 单位: mm.
    pub const DISTANCE_MM: f64 = 1.0;

    /// 大对比棒 CNR 下限.
    pub const MIN_CNR: f64 = 1.0;
}
