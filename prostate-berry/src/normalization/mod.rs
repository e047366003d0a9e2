//! 强度归一化.
//!
//! 归一化对象绑定一种模态类型, 生命周期为 `构造 -> fit -> normalize / denormalize`.
//! 拟合时可以给出真值及其类别, 使统计量只在感兴趣区域 (ROI) 内计算.

use ndarray::{Array1, ArrayView3};
use serde::{Deserialize, Serialize};

use crate::consts::AUTO;
use crate::modality::{Modality, ModalityKind};
use crate::{Result, ValidationError};

mod gaussian;

pub use gaussian::GaussianNormalization;

/// 归一化的公共接口.
pub trait Normalization {
    /// 绑定的模态类型, 构造后不再改变.
    fn base_modality(&self) -> ModalityKind;

    /// 是否已拟合.
    fn is_fitted(&self) -> bool;

    /// 拟合参数.
    ///
    /// 给出 `ground_truth` 时必须同时给出 `category`; 不给出真值时使用整个体数据,
    /// 并发出警告. 任何校验失败都不会修改对象状态.
    fn fit(
        &mut self,
        modality: &dyn Modality,
        ground_truth: Option<&dyn Modality>,
        category: Option<&str>,
    ) -> Result<()>;

    /// 原地归一化模态数据. 要求已拟合.
    fn normalize(&self, modality: &mut dyn Modality) -> Result<()>;

    /// 原地反归一化模态数据, 是 [`normalize`](Self::normalize) 的逆运算. 要求已拟合.
    fn denormalize(&self, modality: &mut dyn Modality) -> Result<()>;
}

/// 高斯归一化的参数.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GaussianParams {
    /// 均值.
    pub mu: f64,

    /// 标准差.
    pub sigma: f64,
}

impl GaussianParams {
    /// 检查参数有限, 且 `sigma > 0`.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if !self.mu.is_finite() || !self.sigma.is_finite() {
            return Err(ValidationError::InvalidParams(format!(
                "mu and sigma must be finite, found {self:?}"
            )));
        }
        if self.sigma <= 0.0 {
            return Err(ValidationError::InvalidParams(format!(
                "sigma must be positive, found {}",
                self.sigma
            )));
        }
        Ok(())
    }
}

/// 归一化参数的配置: 从数据自动估计, 或由用户固定.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum NormParams {
    /// 从 ROI 数据估计.
    #[default]
    Auto,

    /// 用户固定的参数.
    Fixed(GaussianParams),
}

impl NormParams {
    /// 固定参数. 参数非法时返回 `InvalidParams`.
    pub fn fixed(mu: f64, sigma: f64) -> std::result::Result<Self, ValidationError> {
        let p = GaussianParams { mu, sigma };
        p.validate()?;
        Ok(Self::Fixed(p))
    }

    /// 从 JSON 文本解析.
    ///
    /// 只接受字符串 `"auto"`, 或恰好包含 `mu` 与 `sigma` 两个数值键的对象.
    pub fn from_json(s: &str) -> std::result::Result<Self, ValidationError> {
        let value: serde_json::Value =
            serde_json::from_str(s).map_err(|e| ValidationError::InvalidParams(e.to_string()))?;
        match value {
            serde_json::Value::String(ref s) if s == AUTO => Ok(Self::Auto),
            serde_json::Value::Object(_) => {
                let p: GaussianParams = serde_json::from_value(value)
                    .map_err(|e| ValidationError::InvalidParams(e.to_string()))?;
                p.validate()?;
                Ok(Self::Fixed(p))
            }
            other => Err(ValidationError::InvalidParams(format!(
                "expected \"{AUTO}\" or {{\"mu\", \"sigma\"}}, found {other}"
            ))),
        }
    }

    /// 检查参数.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        match self {
            Self::Auto => Ok(()),
            Self::Fixed(p) => p.validate(),
        }
    }
}

/// 拟合时使用的区域.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoiSource {
    /// 真值中某个类别的掩膜.
    Mask(String),

    /// 未给出真值, 使用整个体数据.
    WholeVolume,
}

/// 取出 ROI 内的数据 (C 顺序).
///
/// 校验顺序: 类别 -> 真值类型 -> 真值已读取 -> 类别存在 -> 形状一致.
pub(crate) fn extract_roi(
    data: ArrayView3<'_, f64>,
    ground_truth: Option<&dyn Modality>,
    category: Option<&str>,
) -> std::result::Result<(Array1<f64>, RoiSource), ValidationError> {
    let Some(gt) = ground_truth else {
        log::warn!("no ground truth given, the statistics are computed on the whole volume");
        return Ok((data.iter().copied().collect(), RoiSource::WholeVolume));
    };
    let category = category.ok_or(ValidationError::MissingCategory)?;
    let gt = gt
        .as_ground_truth()
        .ok_or_else(|| ValidationError::IncompatibleModality {
            expected: ModalityKind::GroundTruth,
            found: gt.kind(),
        })?;
    let mask = gt.mask(category)?;
    if mask.shape() != data.shape() {
        return Err(ValidationError::ShapeMismatch {
            expected: data.shape().to_vec(),
            found: mask.shape().to_vec(),
        });
    }
    let roi = data
        .iter()
        .zip(mask.iter())
        .filter_map(|(v, m)| m.then_some(*v))
        .collect();
    Ok((roi, RoiSource::Mask(category.to_string())))
}
