//! 运行时错误.

use std::path::PathBuf;

use crate::modality::ModalityKind;

/// 体数据读取 (I/O) 错误.
#[derive(Debug, thiserror::Error)]
pub enum VolumeError {
    /// 底层 I/O 错误.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        /// 出错路径.
        path: PathBuf,
        /// 底层错误.
        source: std::io::Error,
    },

    /// 无法解析 DICOM 文件.
    #[error("cannot read DICOM object {path:?}: {message}")]
    Dicom {
        /// 出错文件.
        path: PathBuf,
        /// 错误描述.
        message: String,
    },

    /// 读取 npy 文件失败.
    #[error("cannot read npy array: {0}")]
    Npy(#[from] ndarray_npy::ReadNpyError),

    /// 读取 npz 归档失败.
    #[error("cannot read npz archive: {0}")]
    Npz(#[from] ndarray_npy::ReadNpzError),

    /// 写 npz 归档失败.
    #[error("cannot write npz archive: {0}")]
    WriteNpz(#[from] ndarray_npy::WriteNpzError),

    /// 读取 NIfTI 文件失败.
    #[error("cannot read NIfTI volume: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// 数组的维度不是期望值. 参数依次为期望维度、实际维度.
    #[error("expected a {0}-dimensional array, found {1} dimensions")]
    Dimension(usize, usize),

    /// npz 归档中不存在该条目.
    #[error("archive has no entry named `{0}`")]
    MissingEntry(String),

    /// npz 归档中找不到数据类型受支持的条目.
    #[error("entry `{0}` has no supported element type")]
    UnsupportedEntry(String),

    /// 目录中不存在 DICOM 序列.
    #[error("no DICOM series found in {0:?}")]
    NoSeries(PathBuf),

    /// 同一序列中切片的形状不一致.
    #[error("inconsistent slice geometry in series {0}")]
    InconsistentSlices(String),

    /// 数组形状运算失败.
    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// 原始数据长度与给定大小不符. 参数依次为期望长度、实际长度.
    #[error("raw data holds {1} bytes, expected {0}")]
    RawSize(usize, usize),
}

/// 前置条件违例. 所有此类错误都是同步、致命且不重试的.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// 既没有显式给出路径, 也没有事先存储路径.
    #[error("no path was provided and none was stored")]
    NoPath,

    /// 路径列表为空.
    #[error("the path list is empty")]
    EmptyPathList,

    /// 路径不存在.
    #[error("path {0:?} does not exist")]
    PathNotFound(PathBuf),

    /// 路径类型不符合要求 (例如期望目录).
    #[error("path {0:?} has the wrong type")]
    WrongPathType(PathBuf),

    /// 路径下的 DICOM 序列个数不是 1.
    #[error("{path:?} holds {found} series, exactly one is required")]
    NotSingleSeries {
        /// 出错路径.
        path: PathBuf,
        /// 实际发现的序列个数.
        found: usize,
    },

    /// 标签个数与读取的序列个数不一致.
    #[error("{labels} category labels given for {series} series")]
    LabelCountMismatch {
        /// 标签个数.
        labels: usize,
        /// 序列个数.
        series: usize,
    },

    /// 标签不存在.
    #[error("unknown ground-truth label `{0}`")]
    UnknownLabel(String),

    /// 未知的输出类型.
    #[error("unknown output type `{0}`, expected `index` or `data`")]
    UnknownOutputType(String),

    /// 数据尚未读取.
    #[error("the {0} data have not been read")]
    NotRead(ModalityKind),

    /// 归一化尚未拟合.
    #[error("the normalization has not been fitted")]
    NotFitted,

    /// 模态类型与归一化绑定的类型不符.
    #[error("expected a {expected} modality, found {found}")]
    IncompatibleModality {
        /// 期望类型.
        expected: ModalityKind,
        /// 实际类型.
        found: ModalityKind,
    },

    /// 模态类型不能用于此类归一化.
    #[error("a {0} modality cannot be normalized this way")]
    UnsupportedModality(ModalityKind),

    /// 给定了真值但没有给出类别.
    #[error("a ground-truth category is required along with the ground truth")]
    MissingCategory,

    /// 空间形状不一致.
    #[error("size mismatch: {expected:?} vs {found:?}")]
    ShapeMismatch {
        /// 期望形状.
        expected: Vec<usize>,
        /// 实际形状.
        found: Vec<usize>,
    },

    /// 参数格式错误.
    #[error("invalid normalization params: {0}")]
    InvalidParams(String),

    /// ROI 为空.
    #[error("the region of interest is empty")]
    EmptyRoi,

    /// ROI 内强度没有离散度, 无法归一化.
    #[error("the region of interest has zero spread")]
    ZeroSpread,

    /// npz 归档必须指定条目名.
    #[error("{0:?} is an npz archive, an entry name is required")]
    MissingEntryName(PathBuf),

    /// 数据集目录中没有病人.
    #[error("no patient directory found in {0:?}")]
    EmptyDataset(PathBuf),

    /// 文件不是期望的格式.
    #[error("{0:?} is not a `.{1}` file")]
    WrongFileFormat(PathBuf, &'static str),
}

/// 归一化对象持久化错误.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// 底层 I/O 错误.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 编码/解码错误.
    #[error("cannot encode or decode the blob: {0}")]
    Codec(#[from] bincode::Error),
}

/// crate 级错误.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 前置条件违例.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// 体数据读取错误.
    #[error(transparent)]
    Volume(#[from] VolumeError),

    /// 持久化错误.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl Error {
    /// 是否为前置条件违例.
    #[inline]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// 若为前置条件违例, 则返回其引用.
    #[inline]
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(v) => Some(v),
            _ => None,
        }
    }
}

/// crate 级运行结果.
pub type Result<T> = std::result::Result<T, Error>;
