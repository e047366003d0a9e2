//! 通用常量.

/// 真值相关常量.
pub mod gt {
    /// 前列腺整体.
    pub const PROSTATE: &str = "prostate";

    /// 外周带 (peripheral zone).
    pub const PZ: &str = "pz";

    /// 中央腺体 (central gland).
    pub const CG: &str = "cg";

    /// 癌变区域 (cancer).
    pub const CAP: &str = "cap";

    /// 旧版工具中真值 DICOM 的正类像素值.
    pub const POSITIVE_VALUE: f64 = 255.0;
}

/// 强度 landmarks 默认参数.
pub mod landmarks {
    /// 默认 landmarks 个数.
    pub const N_LANDMARKS: usize = 5;

    /// 默认最小百分位.
    pub const MIN_PERC: f64 = 2.0;

    /// 默认最大百分位.
    pub const MAX_PERC: f64 = 98.0;
}

/// 强度直方图参数.
pub mod histogram {
    /// 直方图区间数上限. 强度范围更宽时使用该值.
    pub const MAX_BINS: usize = 4096;
}

/// 数据集根目录环境变量.
pub const DATASET_DIR_ENV: &str = "PROSTATE_DATASET_DIR";

/// `$HOME/dataset` 下的默认数据集目录名.
pub const DATASET_DIR_NAME: &str = "prostate";

/// 自动估计参数的配置字面量.
pub const AUTO: &str = "auto";
