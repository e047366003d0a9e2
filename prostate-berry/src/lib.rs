#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供多序列前列腺 MRI (T2W, DCE, DWI) 体数据的读取、真值 (ground truth)
//! 一致性校验, 以及基于真值感兴趣区域 (ROI) 的强度归一化.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 所有前置条件违例都会以 [`ValidationError`] 的形式同步返回给调用者,
//!   不做任何重试; 校验总是先于状态修改进行.
//! 2. 非致命的提示 (覆盖已设置的路径, 无真值拟合) 通过 `log::warn!` 输出,
//!   操作本身继续进行.
//!
//! # 模块
//!
//! ### 体数据读取 ✅
//!
//! DICOM 序列目录, `.npy` / `.npz` 数组文件, NIfTI 文件以及 OCT 原始文件.
//! 统一输出 `(行, 列, 切片)` 轴序.
//!
//! 实现位于 `prostate-berry/src/volume`.
//!
//! ### 模态 ✅
//!
//! 单序列模态 (T2W, ADC), 多序列模态 (DCE, DWI) 以及真值模态.
//! 路径配置遵循 `未配置 -> 已设置路径 -> 已加载` 的两阶段模型.
//!
//! 实现位于 `prostate-berry/src/modality`.
//!
//! ### 归一化 ✅
//!
//! 高斯归一化: `fit -> normalize / denormalize`, 支持自动估计与固定参数,
//! 以及整体状态的持久化.
//!
//! 实现位于 `prostate-berry/src/normalization`.
//!
//! ### 数据集批处理工具 ✅
//!
//! 按病人目录并行计算强度极值和强度 landmarks, 以及分类结果容器.
//!
//! 实现位于 `prostate-berry/src/dataset`.

/// 三维索引 `(行, 列, 切片)`.
pub type Idx3d = (usize, usize, usize);

pub mod consts;

mod error;

pub use error::{Error, PersistError, Result, ValidationError, VolumeError};

pub mod volume;

pub mod modality;

pub use modality::{
    GtExtract, GtModality, Modality, ModalityKind, MultisequenceModality, OutputType, PathData,
    StandaloneModality,
};

pub mod normalization;

pub use normalization::{
    GaussianNormalization, GaussianParams, NormParams, Normalization, RoiSource,
};

pub mod dataset;

pub mod prelude;
