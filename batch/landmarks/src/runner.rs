//! 程序运行函数.

use std::path::PathBuf;

use prostate_berry::consts::landmarks::{MAX_PERC, MIN_PERC, N_LANDMARKS};
use prostate_berry::dataset;
use utils::loader;

use crate::result::LandmarkResult;

/// 运行配置.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub root: PathBuf,
    pub modality: String,
    pub gt: String,
    pub n_landmarks: usize,
    pub min_perc: f64,
    pub max_perc: f64,
}

fn parse_arg<T: std::str::FromStr>(
    name: &str,
    arg: Option<String>,
    default: T,
) -> Result<T, String> {
    match arg {
        None => Ok(default),
        Some(s) => s
            .parse()
            .map_err(|_| format!("cannot parse `{s}` as {name}")),
    }
}

impl Config {
    /// 由命令行参数 (不含程序名) 与环境变量构造.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self, String> {
        let mut args = args.into_iter();
        let n_landmarks = parse_arg("the number of landmarks", args.next(), N_LANDMARKS)?;
        let min_perc = parse_arg("the minimum percentile", args.next(), MIN_PERC)?;
        let max_perc = parse_arg("the maximum percentile", args.next(), MAX_PERC)?;
        let root = loader::dataset_dir_from_env_or_home()
            .ok_or_else(|| "cannot locate the dataset directory".to_string())?;
        Ok(Self {
            root,
            modality: loader::modality_subdir(),
            gt: loader::gt_subdir(),
            n_landmarks,
            min_perc,
            max_perc,
        })
    }
}

/// 实际运行.
pub fn run(config: &Config) -> prostate_berry::Result<LandmarkResult> {
    log::info!("computing landmarks in {:?}", config.root);
    let extremum = dataset::find_extremum_dataset(&config.root, &config.modality)?;
    let landmarks = dataset::find_landmarks_dataset(
        &config.root,
        &config.modality,
        &config.gt,
        config.n_landmarks,
        config.min_perc,
        config.max_perc,
    )?;
    Ok(LandmarkResult {
        extremum,
        percentiles: percentile_levels(config),
        landmarks: landmarks.to_vec(),
    })
}

/// 每个 landmark 对应的百分位, 在 `[min_perc, max_perc]` 上等距.
fn percentile_levels(config: &Config) -> Vec<f64> {
    let n = config.n_landmarks;
    match n {
        0 => Vec::new(),
        1 => vec![config.min_perc],
        _ => {
            let step = (config.max_perc - config.min_perc) / (n - 1) as f64;
            (0..n).map(|i| config.min_perc + step * i as f64).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_arg, Config};

    #[test]
    fn test_parse_arg() {
        assert_eq!(parse_arg("n", None, 5usize), Ok(5));
        assert_eq!(parse_arg("n", Some("7".to_string()), 5usize), Ok(7));
        assert!(parse_arg("n", Some("x".to_string()), 5usize).is_err());
    }

    #[test]
    fn test_config_defaults() {
        if let Ok(c) = Config::from_args(Vec::<String>::new()) {
            assert_eq!((c.n_landmarks, c.min_perc, c.max_perc), (5, 2.0, 98.0));
        }
        assert!(Config::from_args(["five".to_string()]).is_err());
    }
}
