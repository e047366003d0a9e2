//! 计算整个数据集在真值区域内的平均强度 landmarks.
//!
//! 用法: `landmarks [N_LANDMARKS] [MIN_PERC] [MAX_PERC]`, 默认为 `5 2.0 98.0`.
//!
//! 数据集根目录、模态子目录与真值子路径分别由 `$PROSTATE_DATASET_DIR`,
//! `$PROSTATE_MODALITY` 与 `$PROSTATE_GT` 指定.

mod result;
mod runner;

use std::process::ExitCode;

fn main() -> ExitCode {
    utils::init_logger();

    let config = match runner::Config::from_args(std::env::args().skip(1)) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    log::info!("running on {} cores with {config:?}", utils::cpus());

    match runner::run(&config) {
        Ok(res) => {
            res.analyze();
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
