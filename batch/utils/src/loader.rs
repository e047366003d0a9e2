//! 对 `prostate-berry::dataset` 的更一层封装. 提供环境变量配置的数据集路径.

use prostate_berry::dataset::{self, ModalityLoader};
use prostate_berry::ModalityKind;
use std::env;
use std::path::{Path, PathBuf};

/// 模态子目录环境变量.
pub const MODALITY_ENV: &str = "PROSTATE_MODALITY";

/// 真值子路径环境变量.
pub const GT_ENV: &str = "PROSTATE_GT";

/// 默认模态子目录.
pub const DEFAULT_MODALITY: &str = "T2W";

/// 默认真值子路径.
pub const DEFAULT_GT: &str = "GT_inv/prostate";

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// 获取数据集根目录.
///
/// 1. 若环境变量 `$PROSTATE_DATASET_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/prostate`.
pub fn dataset_dir_from_env_or_home() -> Option<PathBuf> {
    dataset::prostate_dataset_dir()
}

/// 每个病人下的模态子目录. 由 `$PROSTATE_MODALITY` 给出, 默认为 `T2W`.
pub fn modality_subdir() -> String {
    var_or(MODALITY_ENV, DEFAULT_MODALITY)
}

/// 每个病人下的真值子路径. 由 `$PROSTATE_GT` 给出, 默认为 `GT_inv/prostate`.
pub fn gt_subdir() -> String {
    var_or(GT_ENV, DEFAULT_GT)
}

/// 获取 T2W 数据加载器.
pub fn t2w_loader<P: AsRef<Path>>(root: P) -> prostate_berry::Result<ModalityLoader> {
    dataset::modality_loader(root, ModalityKind::T2w, modality_subdir())
}

#[cfg(test)]
mod tests {
    use super::{var_or, DEFAULT_GT};

    #[test]
    fn test_var_or_default() {
        assert_eq!(
            var_or("PROSTATE_BATCH_SURELY_UNSET_VARIABLE", DEFAULT_GT),
            "GT_inv/prostate"
        );
    }
}
