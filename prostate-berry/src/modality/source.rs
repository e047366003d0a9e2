//! 数据源解析: 把 [`PathData`] 展开为一组可读取的体数据源.
//!
//! 解析阶段只读取文件头, 完成全部存在性、类型与序列个数的校验;
//! 之后才解码像素数据.

use std::fs;
use std::path::{Path, PathBuf};

use super::PathData;
use crate::volume::{self, read_series, scan_series, SeriesInfo, SeriesMeta, Volume, VolumeFormat};
use crate::{Result, ValidationError, VolumeError};

/// 一个可读取的体数据源.
#[derive(Clone, Debug)]
pub(crate) enum Source {
    /// 已发现的 DICOM 序列.
    Series(SeriesInfo),

    /// `.npy` 或 NIfTI 数组文件.
    File(PathBuf),
}

impl Source {
    /// 读取数据源.
    pub(crate) fn read(&self, reverse: bool) -> Result<(Volume, SeriesMeta)> {
        match self {
            Self::Series(info) => Ok(read_series(info, reverse)?),
            Self::File(p) => {
                let v = match VolumeFormat::detect(p)? {
                    VolumeFormat::Npy => volume::read_npy(p, reverse)?,
                    VolumeFormat::Nifti => volume::read_nifti(p, reverse)?,
                    VolumeFormat::Npz => {
                        return Err(ValidationError::MissingEntryName(p.clone()).into())
                    }
                    VolumeFormat::DicomSeries => {
                        return Err(ValidationError::WrongPathType(p.clone()).into())
                    }
                };
                let meta = SeriesMeta::unit(v.dim());
                Ok((v, meta))
            }
        }
    }
}

/// 单个路径: 目录中必须恰好有一个序列, 文件必须是可识别的数组格式.
pub(crate) fn single_source(path: &Path) -> Result<Source> {
    match VolumeFormat::detect(path)? {
        VolumeFormat::DicomSeries => {
            let mut series = scan_series(path)?;
            if series.len() != 1 {
                return Err(ValidationError::NotSingleSeries {
                    path: path.to_owned(),
                    found: series.len(),
                }
                .into());
            }
            Ok(Source::Series(series.remove(0)))
        }
        VolumeFormat::Npz => Err(ValidationError::MissingEntryName(path.to_owned()).into()),
        VolumeFormat::Npy | VolumeFormat::Nifti => Ok(Source::File(path.to_owned())),
    }
}

/// 路径列表: 每一项都按 [`single_source`] 解析. 先检查全部路径存在.
pub(crate) fn list_sources(paths: &[PathBuf]) -> Result<Vec<Source>> {
    PathData::List(paths.to_vec()).check_exists()?;
    paths.iter().map(|p| single_source(p)).collect()
}

/// 目录中的所有序列, 按 `(SeriesNumber, UID)` 排序. 目录中没有序列时返回错误.
pub(crate) fn dir_series(dir: &Path) -> Result<Vec<Source>> {
    if !dir.exists() {
        return Err(ValidationError::PathNotFound(dir.to_owned()).into());
    }
    if !dir.is_dir() {
        return Err(ValidationError::WrongPathType(dir.to_owned()).into());
    }
    let series = scan_series(dir)?;
    if series.is_empty() {
        return Err(VolumeError::NoSeries(dir.to_owned()).into());
    }
    Ok(series.into_iter().map(Source::Series).collect())
}

/// 按名称排序的直接子目录.
pub(crate) fn sub_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let io_err = |source| VolumeError::Io {
        path: dir.to_owned(),
        source,
    };
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let p = entry.map_err(io_err)?.path();
        if p.is_dir() {
            dirs.push(p);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// 依次读取数据源, 要求所有体数据的形状一致.
pub(crate) fn read_all(sources: &[Source], reverse: bool) -> Result<Vec<(Volume, SeriesMeta)>> {
    let mut out: Vec<(Volume, SeriesMeta)> = Vec::with_capacity(sources.len());
    for s in sources {
        let (v, meta) = s.read(reverse)?;
        if let Some((first, _)) = out.first() {
            if first.shape() != v.shape() {
                return Err(ValidationError::ShapeMismatch {
                    expected: first.shape().to_vec(),
                    found: v.shape().to_vec(),
                }
                .into());
            }
        }
        out.push((v, meta));
    }
    Ok(out)
}
