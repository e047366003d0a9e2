//! DICOM 序列的发现与读取.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use dicom::dictionary_std::tags;
use dicom::object::{open_file, DefaultDicomObject, OpenFileOptions, Tag};
use dicom::pixeldata::PixelDecoder;
use itertools::Itertools;
use ndarray::Array3;
use ordered_float::OrderedFloat;

use super::{reverse_slices, Volume};
use crate::{Result, ValidationError, VolumeError};

/// 目录中发现的一个 DICOM 序列.
#[derive(Clone, Debug)]
pub struct SeriesInfo {
    /// `SeriesInstanceUID`.
    pub uid: String,

    /// `SeriesNumber`, 可能缺失.
    pub number: Option<i32>,

    /// 属于该序列的所有文件, 按文件名排序.
    pub files: Vec<PathBuf>,
}

/// 单个序列的采集参数.
#[derive(Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct SeriesMeta {
    /// `SeriesInstanceUID`. 非 DICOM 来源时为空串.
    pub uid: String,

    /// `SeriesNumber`.
    pub number: Option<i32>,

    /// 像素间距 `[行间距, 列间距]`, 以毫米为单位.
    pub pixel_spacing: [f64; 2],

    /// 相邻切片间距, 以毫米为单位.
    pub slice_spacing: f64,

    /// 体数据形状 `(行, 列, 切片)`.
    pub shape: (usize, usize, usize),
}

impl SeriesMeta {
    /// 为没有采集信息的数据 (如 `.npy`) 构造默认元信息, 间距均为 1 mm.
    pub fn unit(shape: (usize, usize, usize)) -> Self {
        Self {
            uid: String::new(),
            number: None,
            pixel_spacing: [1.0, 1.0],
            slice_spacing: 1.0,
            shape,
        }
    }
}

#[inline]
fn dicom_err(path: &Path, e: impl ToString) -> VolumeError {
    VolumeError::Dicom {
        path: path.to_owned(),
        message: e.to_string(),
    }
}

fn get_string(obj: &DefaultDicomObject, tag: Tag) -> Option<String> {
    let s = obj.element(tag).ok()?.to_str().ok()?;
    let s = s.trim_end_matches(['\0', ' ']).to_string();
    (!s.is_empty()).then_some(s)
}

fn get_i32(obj: &DefaultDicomObject, tag: Tag) -> Option<i32> {
    obj.element(tag).ok()?.to_int::<i32>().ok()
}

fn get_f64(obj: &DefaultDicomObject, tag: Tag) -> Option<f64> {
    obj.element(tag).ok()?.to_float64().ok()
}

fn get_f64_vec(obj: &DefaultDicomObject, tag: Tag) -> Option<Vec<f64>> {
    obj.element(tag).ok()?.to_multi_float64().ok()
}

/// 仅读取文件头 (到像素数据为止), 返回 `(UID, SeriesNumber)`.
/// 非 DICOM 文件或缺少 `SeriesInstanceUID` 的文件返回 `None`.
fn peek_series(path: &Path) -> Option<(String, Option<i32>)> {
    let obj = OpenFileOptions::new()
        .read_until(tags::PIXEL_DATA)
        .open_file(path)
        .ok()?;
    let uid = get_string(&obj, tags::SERIES_INSTANCE_UID)?;
    Some((uid, get_i32(&obj, tags::SERIES_NUMBER)))
}

/// 文件头: `((UID, SeriesNumber), 文件路径)`.
type Header = ((String, Option<i32>), PathBuf);

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::prelude::*;

        fn peek_all(files: Vec<PathBuf>) -> Vec<Header> {
            files
                .into_par_iter()
                .filter_map(|p| peek_series(&p).map(|h| (h, p)))
                .collect()
        }

        fn decode_all(
            files: &[PathBuf],
        ) -> std::result::Result<Vec<(Slice, DefaultDicomObject)>, VolumeError> {
            files.par_iter().map(|p| decode_slice(p)).collect()
        }
    } else {
        fn peek_all(files: Vec<PathBuf>) -> Vec<Header> {
            files
                .into_iter()
                .filter_map(|p| peek_series(&p).map(|h| (h, p)))
                .collect()
        }

        fn decode_all(
            files: &[PathBuf],
        ) -> std::result::Result<Vec<(Slice, DefaultDicomObject)>, VolumeError> {
            files.iter().map(|p| decode_slice(p)).collect()
        }
    }
}

/// 扫描目录 `dir` 下的所有文件 (不递归), 按 `SeriesInstanceUID` 分组.
///
/// 返回的序列按 `(SeriesNumber, UID)` 排序; 无法解析的文件会被忽略.
pub fn scan_series<P: AsRef<Path>>(dir: P) -> std::result::Result<Vec<SeriesInfo>, VolumeError> {
    let dir = dir.as_ref();
    let io_err = |source| VolumeError::Io {
        path: dir.to_owned(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let p = entry.map_err(io_err)?.path();
        if p.is_file() {
            files.push(p);
        }
    }
    files.sort();

    let headers = peek_all(files);
    let mut groups: BTreeMap<String, SeriesInfo> = BTreeMap::new();
    for ((uid, number), path) in headers {
        groups
            .entry(uid.clone())
            .or_insert_with(|| SeriesInfo {
                uid,
                number,
                files: Vec::new(),
            })
            .files
            .push(path);
    }

    let series: Vec<SeriesInfo> = groups
        .into_values()
        .sorted_by(|a, b| (a.number, &a.uid).cmp(&(b.number, &b.uid)))
        .collect();
    log::debug!("found {} series in {:?}", series.len(), dir);
    Ok(series)
}

/// 一张已解码的切片.
struct Slice {
    path: PathBuf,
    rows: usize,
    cols: usize,
    position: Option<[f64; 3]>,
    instance: Option<i32>,
    pixels: Vec<f64>,
}

fn decode_slice(path: &Path) -> std::result::Result<(Slice, DefaultDicomObject), VolumeError> {
    let obj = open_file(path).map_err(|e| dicom_err(path, e))?;
    let dim = |tag| -> std::result::Result<usize, VolumeError> {
        let e = obj.element(tag).map_err(|e| dicom_err(path, e))?;
        let v = e.to_int::<u32>().map_err(|e| dicom_err(path, e))?;
        Ok(v as usize)
    };
    let (rows, cols) = (dim(tags::ROWS)?, dim(tags::COLUMNS)?);
    let position = get_f64_vec(&obj, tags::IMAGE_POSITION_PATIENT)
        .and_then(|v| <[f64; 3]>::try_from(v.as_slice()).ok());
    let decoded = obj.decode_pixel_data().map_err(|e| dicom_err(path, e))?;
    let pixels = decoded
        .to_vec::<f64>()
        .map_err(|e| dicom_err(path, e))?;
    let slice = Slice {
        path: path.to_owned(),
        rows,
        cols,
        position,
        instance: get_i32(&obj, tags::INSTANCE_NUMBER),
        pixels,
    };
    Ok((slice, obj))
}

/// 切片法向量: 由 `ImageOrientationPatient` 的行、列方向余弦叉乘得到.
fn slice_normal(obj: &DefaultDicomObject) -> Option<[f64; 3]> {
    let o = get_f64_vec(obj, tags::IMAGE_ORIENTATION_PATIENT)?;
    if o.len() != 6 {
        return None;
    }
    Some([
        o[1] * o[5] - o[2] * o[4],
        o[2] * o[3] - o[0] * o[5],
        o[0] * o[4] - o[1] * o[3],
    ])
}

#[inline]
fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// 读取一个已发现的序列.
///
/// 切片顺序: 若所有切片都有 `ImagePositionPatient`, 则按其在切片法向上的投影排序;
/// 否则若都有 `InstanceNumber`, 按其排序; 否则保持文件名顺序.
///
/// 返回的数组轴序为 `(行, 列, 切片)`.
pub fn read_series(
    series: &SeriesInfo,
    reverse: bool,
) -> std::result::Result<(Volume, SeriesMeta), VolumeError> {
    let first = series
        .files
        .first()
        .ok_or_else(|| VolumeError::InconsistentSlices(series.uid.clone()))?;

    let decoded = decode_all(&series.files)?;

    let head = &decoded[0].1;
    let normal = slice_normal(head).unwrap_or([0.0, 0.0, 1.0]);
    let pixel_spacing = match get_f64_vec(head, tags::PIXEL_SPACING).as_deref() {
        Some([r, c, ..]) => [*r, *c],
        _ => [1.0, 1.0],
    };
    let thickness = get_f64(head, tags::SLICE_THICKNESS);

    let mut slices: Vec<Slice> = decoded.into_iter().map(|(s, _)| s).collect();
    if slices.iter().all(|s| s.position.is_some()) {
        slices.sort_by_key(|s| OrderedFloat(s.position.map_or(0.0, |p| dot(&p, &normal))));
    } else if slices.iter().all(|s| s.instance.is_some()) {
        slices.sort_by_key(|s| s.instance);
    }

    let (rows, cols) = (slices[0].rows, slices[0].cols);
    if let Some(bad) = slices
        .iter()
        .find(|s| s.rows != rows || s.cols != cols || s.pixels.len() != rows * cols)
    {
        log::debug!("slice {:?} does not match {rows}x{cols}", bad.path);
        return Err(VolumeError::InconsistentSlices(series.uid.clone()));
    }

    let slice_spacing = match (slices.first(), slices.get(1)) {
        (Some(Slice { position: Some(a), .. }), Some(Slice { position: Some(b), .. })) => {
            (dot(b, &normal) - dot(a, &normal)).abs()
        }
        _ => thickness.unwrap_or(1.0),
    };

    let n = slices.len();
    let mut raw = Vec::with_capacity(n * rows * cols);
    slices.into_iter().for_each(|s| raw.extend(s.pixels));

    // [z, 行, 列] -> [行, 列, z].
    let stacked = Array3::from_shape_vec((n, rows, cols), raw)
        .map_err(|e| dicom_err(first, e))?
        .permuted_axes([1, 2, 0]);
    let mut volume = stacked.as_standard_layout().into_owned();
    if reverse {
        reverse_slices(&mut volume);
    }

    let meta = SeriesMeta {
        uid: series.uid.clone(),
        number: series.number,
        pixel_spacing,
        slice_spacing,
        shape: volume.dim(),
    };
    log::debug!("read series {} with shape {:?}", meta.uid, meta.shape);
    Ok((volume, meta))
}

/// 读取目录 `dir` 中唯一的 DICOM 序列.
///
/// `dir` 不存在时返回 `PathNotFound`, 不是目录时返回 `WrongPathType`,
/// 序列个数不为 1 时返回 `NotSingleSeries`.
pub fn read_single_series<P: AsRef<Path>>(dir: P, reverse: bool) -> Result<(Volume, SeriesMeta)> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Err(ValidationError::PathNotFound(dir.to_owned()).into());
    }
    if !dir.is_dir() {
        return Err(ValidationError::WrongPathType(dir.to_owned()).into());
    }
    let mut series = scan_series(dir)?;
    if series.len() != 1 {
        return Err(ValidationError::NotSingleSeries {
            path: dir.to_owned(),
            found: series.len(),
        }
        .into());
    }
    let series = series.remove(0);
    Ok(read_series(&series, reverse)?)
}
