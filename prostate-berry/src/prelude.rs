//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx3d;
pub use crate::{Error, Result, ValidationError};

pub use crate::volume::{read_npz, read_volume, reverse_slices, SeriesMeta, Volume};

pub use crate::modality::{
    GtExtract, GtModality, Modality, ModalityKind, MultisequenceModality, OutputType, PathData,
    StandaloneModality,
};

pub use crate::normalization::{GaussianNormalization, NormParams, Normalization, RoiSource};

pub use crate::consts::gt::{CAP, CG, PROSTATE, PZ};
pub use crate::consts::landmarks::{MAX_PERC, MIN_PERC, N_LANDMARKS};

pub use crate::dataset::{self, home_dataset_dir_with, prostate_dataset_dir};
