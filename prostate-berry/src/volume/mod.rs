//! 3D 体数据读取 (VolumeIO).
//!
//! 无论数据源采用何种轴序, 读取结果统一为 `(行, 列, 切片)` 的 `f64` 三维数组.
//!
//! 支持的数据源:
//!
//! 1. 目录: 单个 DICOM 序列 (目录中必须恰好存在一个序列);
//! 2. `*.npy`: 普通数组文件, 不做轴变换;
//! 3. `*.npz`: 命名条目归档, 需要指定条目名;
//! 4. `*.nii` / `*.nii.gz`: NIfTI 体数据;
//! 5. OCT 原始 `u8` 文件 (需要事先知道大小), 见 [`read_raw_oct`].

use std::path::Path;

use ndarray::{Array3, Axis};

use crate::{Result, ValidationError};

mod array;
mod dicom_series;

pub(crate) use array::read_npz_entry;
pub use array::{read_nifti, read_npy, read_npz, read_raw_oct};
pub use dicom_series::{read_series, read_single_series, scan_series, SeriesInfo, SeriesMeta};

/// 三维体数据, 轴序为 `(行, 列, 切片)`.
pub type Volume = Array3<f64>;

/// 体数据文件格式.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VolumeFormat {
    /// DICOM 序列目录.
    DicomSeries,

    /// `.npy` 普通数组.
    Npy,

    /// `.npz` 命名条目归档.
    Npz,

    /// `.nii` 或 `.nii.gz`.
    Nifti,
}

impl VolumeFormat {
    /// 根据路径推断格式. 路径必须存在, 否则返回 `PathNotFound`;
    /// 无法识别的文件返回 `WrongPathType`.
    pub fn detect(path: &Path) -> std::result::Result<Self, ValidationError> {
        if !path.exists() {
            return Err(ValidationError::PathNotFound(path.to_owned()));
        }
        if path.is_dir() {
            return Ok(Self::DicomSeries);
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if name.ends_with(".npy") {
            Ok(Self::Npy)
        } else if name.ends_with(".npz") {
            Ok(Self::Npz)
        } else if name.ends_with(".nii") || name.ends_with(".nii.gz") {
            Ok(Self::Nifti)
        } else {
            Err(ValidationError::WrongPathType(path.to_owned()))
        }
    }
}

/// 读取一个体数据, 不附带元信息.
///
/// `path` 为目录时按单个 DICOM 序列读取; 为文件时按扩展名分派.
/// `.npz` 归档需要通过 [`read_npz`] 指定条目名, 在此处读取会返回
/// `MissingEntryName`.
///
/// `reverse` 为真时对切片轴执行 [`reverse_slices`].
pub fn read_volume<P: AsRef<Path>>(path: P, reverse: bool) -> Result<Volume> {
    let path = path.as_ref();
    match VolumeFormat::detect(path)? {
        VolumeFormat::DicomSeries => Ok(read_single_series(path, reverse)?.0),
        VolumeFormat::Npy => read_npy(path, reverse),
        VolumeFormat::Nifti => read_nifti(path, reverse),
        VolumeFormat::Npz => Err(ValidationError::MissingEntryName(path.to_owned()).into()),
    }
}

/// 翻转切片轴 (第 3 维), 用于纠正原始数据中已知的切片顺序问题.
///
/// 设切片个数为 `n`, 则结果满足 `out[(n - i) % n] = src[i]`. 因此第 0
/// 层保持不变, 其余层按 `1 <-> n - 1`, `2 <-> n - 2` ... 互换,
/// 这 **不是** 普通的逆序. 已有的 landmarks 统计结果依赖这一精确行为,
/// 不要改成 `slice![.., .., ..;-1]`.
pub fn reverse_slices<T: Clone>(volume: &mut Array3<T>) {
    let n = volume.len_of(Axis(2));
    let copy = volume.clone();
    for sl in 0..n {
        let dst = (n - sl) % n;
        volume
            .index_axis_mut(Axis(2), dst)
            .assign(&copy.index_axis(Axis(2), sl));
    }
}
