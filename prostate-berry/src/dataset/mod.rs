//! 数据集操作.
//!
//! 数据集目录的布局为 `{根目录}/{病人}/{模态子目录}`, 例如
//! `~/dataset/prostate/Patient 383/T2W`.

use std::path::{Path, PathBuf};

use crate::consts::{DATASET_DIR_ENV, DATASET_DIR_NAME};
use crate::modality::{ModalityKind, PathData, StandaloneModality};
use crate::{Result, ValidationError};

mod result;
mod stats;

pub use result::{open_data_label, ClassificationResult, Roc};
pub use stats::{
    binarise_label, find_extremum_dataset, find_landmarks_dataset, gt_samples, masked_volume,
    patient_extremum, patient_landmarks, percentile, volume_percentiles, volume_to_label_using_gt,
};

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}

/// 前列腺数据集根目录: 环境变量 `PROSTATE_DATASET_DIR`, 否则为
/// `{用户主目录}/dataset/prostate`.
pub fn prostate_dataset_dir() -> Option<PathBuf> {
    match std::env::var_os(DATASET_DIR_ENV) {
        Some(dir) => Some(PathBuf::from(dir)),
        None => home_dataset_dir_with([DATASET_DIR_NAME]),
    }
}

/// `root` 下所有病人目录, 按名称排序.
pub fn patient_dirs<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.exists() {
        return Err(ValidationError::PathNotFound(root.to_owned()).into());
    }
    if !root.is_dir() {
        return Err(ValidationError::WrongPathType(root.to_owned()).into());
    }
    crate::modality::source::sub_dirs(root)
}

/// 从数据集根目录创建单序列模态加载器. 每个病人读取 `{病人}/{subdir}`.
///
/// # 注意
///
/// 1. `root` 必须是目录, 否则返回错误.
/// 2. 单个病人读取失败不会中止迭代, 错误随该病人一同返回.
pub fn modality_loader<P: AsRef<Path>, S: AsRef<Path>>(
    root: P,
    kind: ModalityKind,
    subdir: S,
) -> Result<ModalityLoader> {
    if !kind.is_standalone() {
        return Err(ValidationError::UnsupportedModality(kind).into());
    }
    let mut patients = patient_dirs(root)?;
    patients.reverse();
    Ok(ModalityLoader {
        kind,
        subdir: subdir.as_ref().to_owned(),
        data_rev: patients,
        reverse: false,
    })
}

/// 单序列模态数据加载器, 按病人名称顺序迭代.
#[derive(Debug)]
pub struct ModalityLoader {
    kind: ModalityKind,
    subdir: PathBuf,
    data_rev: Vec<PathBuf>,
    reverse: bool,
}

impl ModalityLoader {
    /// 读取时是否翻转切片轴.
    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    fn load(&self, patient: &Path) -> Result<StandaloneModality> {
        let mut m = StandaloneModality::new(self.kind)?.with_reverse(self.reverse);
        m.read_data_from_path(Some(PathData::Single(patient.join(&self.subdir))))?;
        Ok(m)
    }
}

impl Iterator for ModalityLoader {
    type Item = (String, Result<StandaloneModality>);

    fn next(&mut self) -> Option<Self::Item> {
        let patient = self.data_rev.pop()?;
        let name = patient
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let data = self.load(&patient);
        Some((name, data))
    }
}

impl ExactSizeIterator for ModalityLoader {
    #[inline]
    fn len(&self) -> usize {
        self.data_rev.len()
    }
}
