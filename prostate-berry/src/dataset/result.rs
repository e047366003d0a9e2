//! 分类数据与结果容器.

use std::fs::File;
use std::path::Path;

use ndarray::{Array1, ArrayD, Ix1};
use ndarray_npy::NpzWriter;

use crate::volume::read_npz_entry;
use crate::{Result, ValidationError, VolumeError};

/// ROC 曲线.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Roc {
    /// 假阳性率.
    pub fpr: Array1<f64>,

    /// 真阳性率.
    pub tpr: Array1<f64>,

    /// 阈值.
    pub thresh: Array1<f64>,

    /// 曲线下面积.
    pub auc: f64,
}

/// 一次分类实验的结果: 预测标签与 ROC 曲线.
///
/// 存储为 `.npz` 归档, 条目为 `pred_label`, `fpr`, `tpr`, `thresh` 与 `auc`
/// (`auc` 存为单元素数组).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassificationResult {
    /// 预测标签.
    pub pred_label: Array1<f64>,

    /// ROC 曲线.
    pub roc: Roc,
}

const ENTRIES: [&str; 5] = ["pred_label", "fpr", "tpr", "thresh", "auc"];

fn check_npz(path: &Path) -> std::result::Result<(), ValidationError> {
    if !path.exists() {
        return Err(ValidationError::PathNotFound(path.to_owned()));
    }
    let is_npz = path.extension().map_or(false, |e| e.eq_ignore_ascii_case("npz"));
    if !path.is_file() || !is_npz {
        return Err(ValidationError::WrongFileFormat(path.to_owned(), "npz"));
    }
    Ok(())
}

fn into_1d(data: ArrayD<f64>) -> std::result::Result<Array1<f64>, VolumeError> {
    let ndim = data.ndim();
    data.into_dimensionality::<Ix1>()
        .map_err(|_| VolumeError::Dimension(1, ndim))
}

/// 读取 `.npz` 归档中的特征数据 (`data`) 与对应标签 (`label`).
///
/// 路径不存在或不是 `.npz` 文件时返回校验错误. 两个条目的维数不做限制.
pub fn open_data_label<P: AsRef<Path>>(path: P) -> Result<(ArrayD<f64>, ArrayD<f64>)> {
    let path = path.as_ref();
    check_npz(path)?;
    let data = read_npz_entry(path, "data")?;
    let label = read_npz_entry(path, "label")?;
    Ok((data, label))
}

impl ClassificationResult {
    /// 从 `.npz` 归档读取.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        check_npz(path)?;

        let [pred_label, fpr, tpr, thresh] =
            [ENTRIES[0], ENTRIES[1], ENTRIES[2], ENTRIES[3]].map(|name| read_npz_entry(path, name));
        let auc = read_npz_entry(path, ENTRIES[4])?
            .iter()
            .next()
            .copied()
            .ok_or_else(|| VolumeError::MissingEntry(ENTRIES[4].to_string()))?;

        Ok(Self {
            pred_label: into_1d(pred_label?)?,
            roc: Roc {
                fpr: into_1d(fpr?)?,
                tpr: into_1d(tpr?)?,
                thresh: into_1d(thresh?)?,
                auc,
            },
        })
    }

    /// 写入 `.npz` 归档. 路径必须以 `.npz` 结尾.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.extension().map_or(false, |e| e.eq_ignore_ascii_case("npz")) {
            return Err(ValidationError::WrongFileFormat(path.to_owned(), "npz").into());
        }
        let file = File::create(path).map_err(|source| VolumeError::Io {
            path: path.to_owned(),
            source,
        })?;
        let mut npz = NpzWriter::new(file);
        let auc = Array1::from_elem(1, self.roc.auc);
        for (name, arr) in ENTRIES.iter().zip([
            &self.pred_label,
            &self.roc.fpr,
            &self.roc.tpr,
            &self.roc.thresh,
            &auc,
        ]) {
            npz.add_array(*name, arr).map_err(VolumeError::from)?;
        }
        npz.finish().map_err(VolumeError::from)?;
        Ok(())
    }
}
