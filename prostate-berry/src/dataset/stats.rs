//! 数据集级别的强度统计.

use std::path::{Path, PathBuf};

use ndarray::{Array, Array1, ArrayView, ArrayView3, Dimension};
use ordered_float::OrderedFloat;

use super::patient_dirs;
use crate::volume::{read_volume, Volume};
use crate::{Result, ValidationError};

/// 已排序数据的第 `p` 百分位, 采用线性插值 (与 numpy 默认方式一致).
///
/// `sorted` 必须非空且升序, `p` 在 `[0, 100]` 之间.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// 在 `[min_perc, max_perc]` 上等距取 `n_landmarks` 个百分位, 返回对应强度.
///
/// `NaN` 不参与计算. 没有有效数据时返回 `EmptyRoi`.
pub fn volume_percentiles<'a, I: IntoIterator<Item = &'a f64>>(
    values: I,
    n_landmarks: usize,
    min_perc: f64,
    max_perc: f64,
) -> std::result::Result<Array1<f64>, ValidationError> {
    if !(0.0..=100.0).contains(&min_perc) || !(min_perc..=100.0).contains(&max_perc) {
        return Err(ValidationError::InvalidParams(format!(
            "percentile range [{min_perc}, {max_perc}] is not within [0, 100]"
        )));
    }
    let mut sorted: Vec<OrderedFloat<f64>> = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .map(|v| OrderedFloat(*v))
        .collect();
    if sorted.is_empty() {
        return Err(ValidationError::EmptyRoi);
    }
    sorted.sort_unstable();
    let sorted: Vec<f64> = sorted.into_iter().map(|v| v.0).collect();

    let levels = Array1::linspace(min_perc, max_perc, n_landmarks);
    Ok(levels.mapv(|p| percentile(&sorted, p)))
}

/// 掩膜外的体素置为 `NaN`.
pub fn masked_volume(
    data: ArrayView3<'_, f64>,
    mask: ArrayView3<'_, bool>,
) -> std::result::Result<Volume, ValidationError> {
    if data.shape() != mask.shape() {
        return Err(ValidationError::ShapeMismatch {
            expected: data.shape().to_vec(),
            found: mask.shape().to_vec(),
        });
    }
    let mut out = data.to_owned();
    out.zip_mut_with(&mask, |v, &m| {
        if !m {
            *v = f64::NAN;
        }
    });
    Ok(out)
}

/// 把标签二值化: 先把大于 0 的值置为 `1`, 再统一映射为 `2x - 1`.
///
/// 取值为 `0` 或正数的标签因此变为 `-1` 或 `1`; 负数 `v` 变为 `2v - 1`.
pub fn binarise_label<D: Dimension>(label: ArrayView<'_, f64, D>) -> Array<f64, D> {
    label.mapv(|v| if v > 0.0 { 1.0 } else { v * 2.0 - 1.0 })
}

/// 真值中取值等于 `pos_value` 的体素坐标, 每个轴一个数组 (C 顺序).
///
/// 真值按 `reverse` 决定是否翻转切片轴.
pub fn gt_samples<P: AsRef<Path>>(
    gt_path: P,
    reverse: bool,
    pos_value: f64,
) -> Result<[Vec<usize>; 3]> {
    let gt = read_volume(gt_path, reverse)?;
    let mut idx: [Vec<usize>; 3] = Default::default();
    for ((r, c, z), _) in gt.indexed_iter().filter(|(_, v)| **v == pos_value) {
        idx[0].push(r);
        idx[1].push(c);
        idx[2].push(z);
    }
    Ok(idx)
}

/// 取出 `volume` 在真值正类体素处的值, 并按 [`binarise_label`] 二值化.
///
/// 正类取值通常为 [`POSITIVE_VALUE`](crate::consts::gt::POSITIVE_VALUE).
/// `volume` 与真值形状不一致时返回 `ShapeMismatch`.
pub fn volume_to_label_using_gt<P: AsRef<Path>>(
    volume: ArrayView3<'_, f64>,
    gt_path: P,
    reverse: bool,
    pos_value: f64,
) -> Result<Array1<f64>> {
    let gt = read_volume(gt_path, reverse)?;
    if gt.shape() != volume.shape() {
        return Err(ValidationError::ShapeMismatch {
            expected: volume.shape().to_vec(),
            found: gt.shape().to_vec(),
        }
        .into());
    }
    let samples: Array1<f64> = volume
        .iter()
        .zip(gt.iter())
        .filter_map(|(v, g)| (*g == pos_value).then_some(*v))
        .collect();
    Ok(binarise_label(samples.view()))
}

/// 单个体数据的最小、最大强度. `NaN` 被忽略.
pub fn patient_extremum<P: AsRef<Path>>(path: P) -> Result<(f64, f64)> {
    let volume = read_volume(path, false)?;
    volume
        .iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .ok_or_else(|| ValidationError::EmptyRoi.into())
}

/// 单个病人在真值区域内的强度 landmarks.
///
/// 真值按 [`reverse_slices`](crate::volume::reverse_slices) 翻转后读取, 数据不翻转.
pub fn patient_landmarks<P: AsRef<Path>, Q: AsRef<Path>>(
    data_path: P,
    gt_path: Q,
    n_landmarks: usize,
    min_perc: f64,
    max_perc: f64,
) -> Result<Array1<f64>> {
    let data = read_volume(data_path, false)?;
    let gt = read_volume(gt_path, true)?.mapv(|v| v != 0.0);
    let masked = masked_volume(data.view(), gt.view())?;
    Ok(volume_percentiles(masked.iter(), n_landmarks, min_perc, max_perc)?)
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::prelude::*;

        /// 对每个病人并行执行 `op`, 结果按输入顺序排列.
        /// 任一病人失败时返回按输入顺序的第一个错误.
        fn par_map<T, F>(items: &[PathBuf], op: F) -> Result<Vec<T>>
        where
            T: Send,
            F: Fn(&PathBuf) -> Result<T> + Sync + Send,
        {
            items.par_iter().map(op).collect()
        }
    } else {
        /// 对每个病人依次执行 `op`.
        fn par_map<T, F>(items: &[PathBuf], op: F) -> Result<Vec<T>>
        where
            F: Fn(&PathBuf) -> Result<T>,
        {
            items.iter().map(op).collect()
        }
    }
}

fn dataset_patients(root: &Path) -> Result<Vec<PathBuf>> {
    let patients = patient_dirs(root)?;
    if patients.is_empty() {
        return Err(ValidationError::EmptyDataset(root.to_owned()).into());
    }
    Ok(patients)
}

/// 整个数据集的最小、最大强度. 每个病人读取 `{病人}/{modality}`.
pub fn find_extremum_dataset<P: AsRef<Path>, S: AsRef<Path>>(
    root: P,
    modality: S,
) -> Result<(f64, f64)> {
    let patients = dataset_patients(root.as_ref())?;
    let modality = modality.as_ref();
    let extrema = par_map(&patients, |p| patient_extremum(p.join(modality)))?;
    let ans = extrema
        .into_iter()
        .reduce(|(a, b), (c, d)| (a.min(c), b.max(d)))
        .unwrap_or((f64::NAN, f64::NAN));
    log::info!("dataset extremum over {} patients: {ans:?}", patients.len());
    Ok(ans)
}

/// 整个数据集的平均强度 landmarks.
///
/// 每个病人读取 `{病人}/{modality}` 与 `{病人}/{gt}`, 计算真值区域内的
/// landmarks; 结果按病人顺序收集后逐项求平均.
pub fn find_landmarks_dataset<P: AsRef<Path>, S: AsRef<Path>, G: AsRef<Path>>(
    root: P,
    modality: S,
    gt: G,
    n_landmarks: usize,
    min_perc: f64,
    max_perc: f64,
) -> Result<Array1<f64>> {
    let patients = dataset_patients(root.as_ref())?;
    let (modality, gt) = (modality.as_ref(), gt.as_ref());
    let landmarks = par_map(&patients, |p| {
        patient_landmarks(p.join(modality), p.join(gt), n_landmarks, min_perc, max_perc)
    })?;

    let mut sum = Array1::<f64>::zeros(n_landmarks);
    for l in landmarks.iter() {
        sum += l;
    }
    let mean = sum / landmarks.len() as f64;
    log::info!("dataset landmarks over {} patients: {mean}", landmarks.len());
    Ok(mean)
}
