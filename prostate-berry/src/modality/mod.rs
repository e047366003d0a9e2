//! 模态: 一个成像序列的数据及其读取/校验状态.
//!
//! - [`StandaloneModality`]: 单序列 (T2W, ADC), 数据为 `(行, 列, 切片)`;
//! - [`MultisequenceModality`]: 多序列 (DCE, DWI), 数据为 `(序列, 行, 列, 切片)`;
//! - [`GtModality`]: 真值, 每个解剖类别一个布尔体数据.
//!
//! 所有模态共享 [`Modality`] 能力接口, 归一化等下游组件通过它在运行时检查类型.

use std::fmt;

use serde::{Deserialize, Serialize};

mod ground_truth;
mod histogram;
mod multisequence;
mod path;
pub(crate) mod source;
mod standalone;

pub use ground_truth::{GtExtract, GtModality, OutputType};
pub use histogram::Histogram;
pub use multisequence::MultisequenceModality;
pub use path::{PathData, PathState};
pub use standalone::StandaloneModality;

/// 模态类型.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ModalityKind {
    /// T2 加权成像, 单序列.
    T2w,

    /// 表观扩散系数图, 单序列.
    Adc,

    /// 动态对比增强成像, 多序列.
    Dce,

    /// 扩散加权成像, 多序列.
    Dwi,

    /// 真值标注.
    GroundTruth,
}

impl ModalityKind {
    /// 是否为单序列模态.
    #[inline]
    pub fn is_standalone(&self) -> bool {
        matches!(self, Self::T2w | Self::Adc)
    }

    /// 是否为多序列模态.
    #[inline]
    pub fn is_multisequence(&self) -> bool {
        matches!(self, Self::Dce | Self::Dwi)
    }

    /// 是否为真值.
    #[inline]
    pub fn is_ground_truth(&self) -> bool {
        matches!(self, Self::GroundTruth)
    }

    /// 惯用名称, 同时也是数据集中病人目录下的子目录名.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::T2w => "T2W",
            Self::Adc => "ADC",
            Self::Dce => "DCE",
            Self::Dwi => "DWI",
            Self::GroundTruth => "GT",
        }
    }
}

impl fmt::Display for ModalityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 模态能力接口.
///
/// 读取操作的签名因变体而异 (真值需要类别标签), 因此不在此处定义.
pub trait Modality {
    /// 模态类型.
    fn kind(&self) -> ModalityKind;

    /// 数据是否已读取. 为假时数据一定不存在.
    fn is_read(&self) -> bool;

    /// 当前存储的路径.
    fn path_data(&self) -> Option<&PathData>;

    /// 若为单序列模态, 返回其引用.
    #[inline]
    fn as_standalone(&self) -> Option<&StandaloneModality> {
        None
    }

    /// 若为单序列模态, 返回其可变引用.
    #[inline]
    fn as_standalone_mut(&mut self) -> Option<&mut StandaloneModality> {
        None
    }

    /// 若为真值, 返回其引用.
    #[inline]
    fn as_ground_truth(&self) -> Option<&GtModality> {
        None
    }
}
