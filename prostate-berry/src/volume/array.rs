//! 数组文件格式: `.npy`, `.npz`, NIfTI 以及 OCT 原始文件.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use ndarray::{ArrayD, Ix3, IxDyn, OwnedRepr};
use ndarray_npy::{NpzReader, ReadNpyError, ReadNpyExt, ReadNpzError};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use num::ToPrimitive;

use super::{reverse_slices, Volume};
use crate::{Idx3d, Result, ValidationError, VolumeError};

/// 元素到 `f64` 的转换. 数值类型按值转换, `bool` 转换为 `0.0` / `1.0`.
trait IntoF64: Copy {
    fn into_f64(self) -> f64;
}

macro_rules! impl_into_f64 {
    ($($t: ty),+) => {
        $(
            impl IntoF64 for $t {
                #[inline]
                fn into_f64(self) -> f64 {
                    self.to_f64().unwrap_or(f64::NAN)
                }
            }
        )+
    };
}
impl_into_f64!(f64, f32, i64, i32, i16, u16, u8);

impl IntoF64 for bool {
    #[inline]
    fn into_f64(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }
}

fn read_bytes(path: &Path) -> std::result::Result<Vec<u8>, VolumeError> {
    fs::read(path).map_err(|source| VolumeError::Io {
        path: path.to_owned(),
        source,
    })
}

/// 依次尝试以各元素类型解析 npy 字节流. 只有类型描述不符时才尝试下一类型.
fn npy_as_f64(bytes: &[u8]) -> std::result::Result<ArrayD<f64>, ReadNpyError> {
    macro_rules! try_as {
        ($($t: ty),+) => {
            $(
                match ArrayD::<$t>::read_npy(bytes) {
                    Ok(a) => return Ok(a.mapv(IntoF64::into_f64)),
                    Err(ReadNpyError::WrongDescriptor(_)) => {}
                    Err(e) => return Err(e),
                }
            )+
        };
    }
    try_as!(f64, f32, i64, i32, i16, u16, u8);
    ArrayD::<bool>::read_npy(bytes).map(|a| a.mapv(IntoF64::into_f64))
}

/// 在 npz 归档中按条目名解析数组, 规则同 [`npy_as_f64`].
fn npz_entry_as_f64(
    npz: &mut NpzReader<Cursor<Vec<u8>>>,
    name: &str,
) -> std::result::Result<ArrayD<f64>, VolumeError> {
    macro_rules! try_as {
        ($($t: ty),+) => {
            $(
                match npz.by_name::<OwnedRepr<$t>, IxDyn>(name) {
                    Ok(a) => return Ok(a.mapv(IntoF64::into_f64)),
                    Err(ReadNpzError::Npy(ReadNpyError::WrongDescriptor(_))) => {}
                    Err(e) => return Err(e.into()),
                }
            )+
        };
    }
    try_as!(f64, f32, i64, i32, i16, u16, u8, bool);
    Err(VolumeError::UnsupportedEntry(name.to_string()))
}

fn into_volume(data: ArrayD<f64>, reverse: bool) -> std::result::Result<Volume, VolumeError> {
    let ndim = data.ndim();
    let mut volume = data
        .into_dimensionality::<Ix3>()
        .map_err(|_| VolumeError::Dimension(3, ndim))?;
    if reverse {
        reverse_slices(&mut volume);
    }
    Ok(volume)
}

/// 读取 `.npy` 文件. 数据按原样保存, 不做轴变换.
pub fn read_npy<P: AsRef<Path>>(path: P, reverse: bool) -> Result<Volume> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ValidationError::PathNotFound(path.to_owned()).into());
    }
    let bytes = read_bytes(path)?;
    let data = npy_as_f64(bytes.as_slice()).map_err(VolumeError::from)?;
    Ok(into_volume(data, reverse)?)
}

/// 读取 `.npz` 归档中名为 `name` 的数组. `name` 可以带或不带 `.npy` 后缀.
pub fn read_npz<P: AsRef<Path>>(path: P, name: &str, reverse: bool) -> Result<Volume> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ValidationError::PathNotFound(path.to_owned()).into());
    }
    let data = read_npz_entry(path, name)?;
    Ok(into_volume(data, reverse)?)
}

/// 读取 `.npz` 归档中名为 `name` 的任意维数组, 并转换为 `f64`.
pub(crate) fn read_npz_entry(
    path: &Path,
    name: &str,
) -> std::result::Result<ArrayD<f64>, VolumeError> {
    let bytes = read_bytes(path)?;
    let mut npz = NpzReader::new(Cursor::new(bytes))?;
    let names = npz.names()?;
    let with_ext = format!("{name}.npy");
    let entry = [name, with_ext.as_str()]
        .into_iter()
        .find(|n| names.iter().any(|m| m == n))
        .ok_or_else(|| VolumeError::MissingEntry(name.to_string()))?
        .to_string();
    npz_entry_as_f64(&mut npz, &entry)
}

/// 读取 NIfTI 文件 (`.nii` 或 `.nii.gz`).
///
/// NIfTI 原始轴序为 `[W, H, z]`, 此处转换为 `(H, W, z)`, 即 `(行, 列, 切片)`.
pub fn read_nifti<P: AsRef<Path>>(path: P, reverse: bool) -> Result<Volume> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ValidationError::PathNotFound(path.to_owned()).into());
    }
    let obj = ReaderOptions::new()
        .read_file(path)
        .map_err(VolumeError::from)?;

    // [W, H, z] -> [H, W, z].
    let data = obj
        .into_volume()
        .into_ndarray::<f64>()
        .map_err(VolumeError::from)?;
    let ndim = data.ndim();
    if ndim != 3 {
        return Err(VolumeError::Dimension(3, ndim).into());
    }
    let data = data.permuted_axes([1, 0, 2].as_slice());
    let data = data.as_standard_layout().into_owned();
    Ok(into_volume(data, reverse)?)
}

/// 读取 OCT 原始 `u8` 文件.
///
/// `size` 为 `(X, Y, Z)`. 文件按 `(Y, Z, X)` 存储, 读取后轮转为 `(X, Y, Z)`;
/// `reverse` 为真时翻转切片轴. 像素值缩放到 `[0, 1]`.
pub fn read_raw_oct<P: AsRef<Path>>(path: P, size: Idx3d, reverse: bool) -> Result<Volume> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ValidationError::PathNotFound(path.to_owned()).into());
    }
    let bytes = read_bytes(path)?;
    let (x, y, z) = size;
    // 大小溢出时按 `usize::MAX` 报告.
    let expected = x
        .checked_mul(y)
        .and_then(|n| n.checked_mul(z))
        .unwrap_or(usize::MAX);
    if bytes.len() != expected {
        return Err(VolumeError::RawSize(expected, bytes.len()).into());
    }

    let stored = ndarray::Array3::from_shape_vec((y, z, x), bytes).map_err(VolumeError::from)?;
    // (Y, Z, X) -> (X, Y, Z).
    let mut volume = stored.permuted_axes([2, 0, 1]).as_standard_layout().into_owned();
    if reverse {
        reverse_slices(&mut volume);
    }
    Ok(volume.mapv(|p| p as f64 / u8::MAX as f64))
}
