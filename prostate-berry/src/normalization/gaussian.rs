use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::{extract_roi, GaussianParams, NormParams, Normalization, RoiSource};
use crate::modality::{Modality, ModalityKind, StandaloneModality};
use crate::{PersistError, Result, ValidationError};

/// 高斯归一化: `(x - mu) / sigma`.
///
/// 只适用于单序列模态 (T2W, ADC), 绑定构造时给出的模板模态的类型.
///
/// # 注意
///
/// 1. 参数为 [`NormParams::Auto`] 时, `fit` 以 ROI 的均值和总体标准差作为参数;
/// 2. 参数固定时, 构造后 `fit_params` 立即可用, `fit` 仍会收集 ROI 数据,
///   但不会重新计算参数.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaussianNormalization {
    base_modality: ModalityKind,
    params: NormParams,
    fit_params: Option<GaussianParams>,
    is_fitted: bool,
    roi_data: Option<Array1<f64>>,
    roi_source: Option<RoiSource>,
}

impl GaussianNormalization {
    /// 以 `template` 的类型构造. `template` 只用于确定类型, 无需已读取.
    pub fn new(
        template: &dyn Modality,
        params: NormParams,
    ) -> std::result::Result<Self, ValidationError> {
        let base_modality = template.kind();
        if !base_modality.is_standalone() {
            return Err(ValidationError::UnsupportedModality(base_modality));
        }
        params.validate()?;
        let fit_params = match params {
            NormParams::Auto => None,
            NormParams::Fixed(p) => Some(p),
        };
        Ok(Self {
            base_modality,
            params,
            fit_params,
            is_fitted: false,
            roi_data: None,
            roi_source: None,
        })
    }

    /// 参数配置.
    #[inline]
    pub fn params(&self) -> &NormParams {
        &self.params
    }

    /// 拟合得到的参数. 自动估计且尚未拟合时为 `None`.
    #[inline]
    pub fn fit_params(&self) -> Option<&GaussianParams> {
        self.fit_params.as_ref()
    }

    /// 拟合时使用的 ROI 数据.
    #[inline]
    pub fn roi_data(&self) -> Option<&Array1<f64>> {
        self.roi_data.as_ref()
    }

    /// 拟合时使用的区域.
    #[inline]
    pub fn roi_source(&self) -> Option<&RoiSource> {
        self.roi_source.as_ref()
    }

    fn check_modality<'a>(
        &self,
        modality: &'a mut dyn Modality,
    ) -> std::result::Result<&'a mut StandaloneModality, ValidationError> {
        let found = modality.kind();
        if found != self.base_modality {
            return Err(ValidationError::IncompatibleModality {
                expected: self.base_modality,
                found,
            });
        }
        let m = modality
            .as_standalone_mut()
            .ok_or(ValidationError::UnsupportedModality(found))?;
        if !m.is_read() {
            return Err(ValidationError::NotRead(found));
        }
        Ok(m)
    }

    fn fitted_params(&self) -> std::result::Result<GaussianParams, ValidationError> {
        match (self.is_fitted, self.fit_params) {
            (true, Some(p)) => Ok(p),
            _ => Err(ValidationError::NotFitted),
        }
    }

    fn apply(
        &self,
        modality: &mut dyn Modality,
        f: impl Fn(f64, &GaussianParams) -> f64,
    ) -> Result<()> {
        let p = self.fitted_params()?;
        let m = self.check_modality(modality)?;
        if let Some(mut data) = m.data_mut() {
            data.mapv_inplace(|x| f(x, &p));
        }
        m.update_histogram();
        Ok(())
    }

    /// 保存整个对象. 编码后以 zlib 压缩.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::result::Result<(), PersistError> {
        let file = File::create(path)?;
        let mut e = ZlibEncoder::new(BufWriter::new(file), Compression::default());
        bincode::serialize_into(&mut e, self)?;
        e.finish()?.flush()?;
        Ok(())
    }

    /// 读取由 [`save`](Self::save) 保存的对象.
    pub fn load<P: AsRef<Path>>(path: P) -> std::result::Result<Self, PersistError> {
        let file = File::open(path)?;
        let d = ZlibDecoder::new(BufReader::new(file));
        Ok(bincode::deserialize_from(d)?)
    }
}

/// 均值与总体标准差.
fn mean_std(roi: &Array1<f64>) -> std::result::Result<GaussianParams, ValidationError> {
    let mu = roi.mean().ok_or(ValidationError::EmptyRoi)?;
    let sigma = roi.std(0.0);
    let p = GaussianParams { mu, sigma };
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ValidationError::ZeroSpread);
    }
    Ok(p)
}

impl Normalization for GaussianNormalization {
    #[inline]
    fn base_modality(&self) -> ModalityKind {
        self.base_modality
    }

    #[inline]
    fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn fit(
        &mut self,
        modality: &dyn Modality,
        ground_truth: Option<&dyn Modality>,
        category: Option<&str>,
    ) -> Result<()> {
        let found = modality.kind();
        if found != self.base_modality {
            return Err(ValidationError::IncompatibleModality {
                expected: self.base_modality,
                found,
            }
            .into());
        }
        let data = modality
            .as_standalone()
            .and_then(|m| m.data())
            .ok_or(ValidationError::NotRead(found))?;

        let (roi, source) = extract_roi(data, ground_truth, category)?;
        let fit_params = match self.params {
            NormParams::Auto => mean_std(&roi)?,
            NormParams::Fixed(p) => p,
        };
        log::debug!("fitted {} gaussian normalization: {fit_params:?}", self.base_modality);

        self.fit_params = Some(fit_params);
        self.roi_data = Some(roi);
        self.roi_source = Some(source);
        self.is_fitted = true;
        Ok(())
    }

    fn normalize(&self, modality: &mut dyn Modality) -> Result<()> {
        self.apply(modality, |x, p| (x - p.mu) / p.sigma)
    }

    fn denormalize(&self, modality: &mut dyn Modality) -> Result<()> {
        self.apply(modality, |x, p| x * p.sigma + p.mu)
    }
}

#[cfg(test)]
mod tests {
    use super::GaussianNormalization;
    use crate::consts::gt;
    use crate::modality::{GtModality, ModalityKind, MultisequenceModality, StandaloneModality};
    use crate::normalization::{GaussianParams, NormParams, Normalization, RoiSource};
    use crate::ValidationError;
    use ndarray::{Array3, Array4};

    const MU: f64 = 245.90;
    const SIGMA: f64 = 74.31;

    fn f64_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    /// 前列腺区域内一半体素为 `MU - SIGMA`, 一半为 `MU + SIGMA`; 区域外为 0.
    fn t2w_and_gt() -> (StandaloneModality, GtModality) {
        let shape = (6, 6, 4);
        let inside = |r: usize, c: usize| (1..5).contains(&r) && (1..5).contains(&c);
        let data = Array3::from_shape_fn(shape, |(r, c, z)| {
            if inside(r, c) {
                if (r + c + z) % 2 == 0 {
                    MU - SIGMA
                } else {
                    MU + SIGMA
                }
            } else {
                0.0
            }
        });
        let masks = Array4::from_shape_fn((2, 6, 6, 4), |(k, r, c, _)| k == 0 && inside(r, c));
        let t2w = StandaloneModality::from_array(ModalityKind::T2w, data).unwrap();
        let gt_mod = GtModality::from_masks(&[gt::PROSTATE, gt::CAP], masks).unwrap();
        (t2w, gt_mod)
    }

    #[test]
    fn test_new_wrong_base_modality() {
        let dce = MultisequenceModality::new(ModalityKind::Dce).unwrap();
        assert_eq!(
            GaussianNormalization::new(&dce, NormParams::Auto),
            Err(ValidationError::UnsupportedModality(ModalityKind::Dce))
        );
        assert!(GaussianNormalization::new(&GtModality::new(), NormParams::Auto).is_err());
    }

    #[test]
    fn test_new_auto_and_fixed() {
        let g = GaussianNormalization::new(&StandaloneModality::t2w(), NormParams::Auto).unwrap();
        assert!(!g.is_fitted());
        assert_eq!(g.params(), &NormParams::Auto);
        assert!(g.fit_params().is_none());

        let p = NormParams::fixed(1.0, 3.0).unwrap();
        let g = GaussianNormalization::new(&StandaloneModality::t2w(), p).unwrap();
        assert!(!g.is_fitted());
        assert_eq!(g.fit_params(), Some(&GaussianParams { mu: 1.0, sigma: 3.0 }));

        let bad = NormParams::Fixed(GaussianParams { mu: 1.0, sigma: 0.0 });
        assert!(GaussianNormalization::new(&StandaloneModality::t2w(), bad).is_err());
    }

    #[test]
    fn test_fit_with_ground_truth() {
        let (mut t2w, gt_mod) = t2w_and_gt();
        let mut g =
            GaussianNormalization::new(&StandaloneModality::t2w(), NormParams::Auto).unwrap();
        g.fit(&t2w, Some(&gt_mod), Some(gt::PROSTATE)).unwrap();
        assert!(g.is_fitted());
        let p = *g.fit_params().unwrap();
        assert!(f64_eq(p.mu, MU, 0.05));
        assert!(f64_eq(p.sigma, SIGMA, 0.05));
        assert_eq!(g.roi_data().unwrap().len(), 4 * 4 * 4);
        assert_eq!(g.roi_source(), Some(&RoiSource::Mask(gt::PROSTATE.into())));

        let orig = t2w.data().unwrap().to_owned();
        g.normalize(&mut t2w).unwrap();
        let norm = t2w.data().unwrap();
        assert!(f64_eq(norm[(1, 1, 0)], -1.0, 1e-9));
        assert!(f64_eq(norm[(1, 2, 0)], 1.0, 1e-9));
        assert!(f64_eq(norm[(0, 0, 0)], -MU / SIGMA, 1e-9));
        assert!(f64_eq(t2w.max().unwrap(), 1.0, 1e-9));

        g.denormalize(&mut t2w).unwrap();
        let back = t2w.data().unwrap();
        assert!(back.iter().zip(orig.iter()).all(|(a, b)| f64_eq(*a, *b, 1e-9)));
    }

    #[test]
    fn test_fit_without_ground_truth_uses_whole_volume() {
        let (t2w, _) = t2w_and_gt();
        let mut g =
            GaussianNormalization::new(&StandaloneModality::t2w(), NormParams::Auto).unwrap();
        g.fit(&t2w, None, Some(gt::PROSTATE)).unwrap();
        assert_eq!(g.roi_source(), Some(&RoiSource::WholeVolume));
        assert_eq!(g.roi_data().unwrap().len(), 6 * 6 * 4);
        assert!(g.fit_params().unwrap().mu < MU);
    }

    #[test]
    fn test_fixed_params_are_echoed() {
        let (t2w, gt_mod) = t2w_and_gt();
        let p = NormParams::fixed(1.0, 3.0).unwrap();
        let mut g = GaussianNormalization::new(&StandaloneModality::t2w(), p).unwrap();
        g.fit(&t2w, Some(&gt_mod), Some(gt::PROSTATE)).unwrap();
        assert_eq!(g.fit_params(), Some(&GaussianParams { mu: 1.0, sigma: 3.0 }));
        assert_eq!(g.roi_data().unwrap().len(), 64);
    }

    #[test]
    fn test_fit_errors_leave_state_untouched() {
        let (t2w, gt_mod) = t2w_and_gt();
        let mut g =
            GaussianNormalization::new(&StandaloneModality::t2w(), NormParams::Auto).unwrap();
        let before = g.clone();

        // 未读取.
        let e = g.fit(&StandaloneModality::t2w(), None, None).unwrap_err();
        assert_eq!(e.as_validation(), Some(&ValidationError::NotRead(ModalityKind::T2w)));

        // 类型不符.
        let adc =
            StandaloneModality::from_array(ModalityKind::Adc, Array3::ones((2, 2, 2))).unwrap();
        assert!(g.fit(&adc, None, None).is_err());

        // 有真值但没有类别.
        let e = g.fit(&t2w, Some(&gt_mod), None).unwrap_err();
        assert_eq!(e.as_validation(), Some(&ValidationError::MissingCategory));

        // 真值类型错误.
        let e = g.fit(&t2w, Some(&t2w), Some(gt::PROSTATE)).unwrap_err();
        assert!(matches!(
            e.as_validation(),
            Some(ValidationError::IncompatibleModality { .. })
        ));

        // 真值未读取.
        let e = g.fit(&t2w, Some(&GtModality::new()), Some(gt::PROSTATE)).unwrap_err();
        assert_eq!(
            e.as_validation(),
            Some(&ValidationError::NotRead(ModalityKind::GroundTruth))
        );

        // 类别不存在.
        let e = g.fit(&t2w, Some(&gt_mod), Some(gt::PZ)).unwrap_err();
        assert_eq!(e.as_validation(), Some(&ValidationError::UnknownLabel(gt::PZ.into())));

        // 形状不一致.
        let small =
            GtModality::from_masks(&[gt::PROSTATE], Array4::from_elem((1, 6, 6, 3), true)).unwrap();
        let e = g.fit(&t2w, Some(&small), Some(gt::PROSTATE)).unwrap_err();
        assert!(matches!(e.as_validation(), Some(ValidationError::ShapeMismatch { .. })));

        // 空 ROI.
        let e = g.fit(&t2w, Some(&gt_mod), Some(gt::CAP)).unwrap_err();
        assert_eq!(e.as_validation(), Some(&ValidationError::EmptyRoi));

        assert_eq!(g, before);
    }

    #[test]
    fn test_zero_spread() {
        let flat =
            StandaloneModality::from_array(ModalityKind::T2w, Array3::from_elem((2, 2, 2), 5.0))
                .unwrap();
        let mut g = GaussianNormalization::new(&flat, NormParams::Auto).unwrap();
        let e = g.fit(&flat, None, None).unwrap_err();
        assert_eq!(e.as_validation(), Some(&ValidationError::ZeroSpread));
        assert!(!g.is_fitted());
    }

    #[test]
    fn test_normalize_requires_fit() {
        let (mut t2w, _) = t2w_and_gt();
        let g = GaussianNormalization::new(
            &StandaloneModality::t2w(),
            NormParams::fixed(0.0, 1.0).unwrap(),
        )
        .unwrap();
        for r in [g.normalize(&mut t2w), g.denormalize(&mut t2w)] {
            assert_eq!(r.unwrap_err().as_validation(), Some(&ValidationError::NotFitted));
        }
    }

    #[test]
    fn test_normalize_wrong_modality() {
        let (t2w, gt_mod) = t2w_and_gt();
        let mut g = GaussianNormalization::new(&t2w, NormParams::Auto).unwrap();
        g.fit(&t2w, Some(&gt_mod), Some(gt::PROSTATE)).unwrap();

        let mut adc =
            StandaloneModality::from_array(ModalityKind::Adc, Array3::ones((6, 6, 4))).unwrap();
        let e = g.normalize(&mut adc).unwrap_err();
        assert_eq!(
            e.as_validation(),
            Some(&ValidationError::IncompatibleModality {
                expected: ModalityKind::T2w,
                found: ModalityKind::Adc
            })
        );

        let mut unread = StandaloneModality::t2w();
        let e = g.normalize(&mut unread).unwrap_err();
        assert_eq!(e.as_validation(), Some(&ValidationError::NotRead(ModalityKind::T2w)));
    }

    #[test]
    fn test_save_load() {
        let (t2w, gt_mod) = t2w_and_gt();
        let mut g = GaussianNormalization::new(&t2w, NormParams::Auto).unwrap();
        g.fit(&t2w, Some(&gt_mod), Some(gt::PROSTATE)).unwrap();

        let temp = tempfile::tempdir().unwrap();
        let p = temp.path().join("gn.bin");
        g.save(&p).unwrap();
        let loaded = GaussianNormalization::load(&p).unwrap();
        assert_eq!(loaded, g);
        assert_eq!(loaded.base_modality(), ModalityKind::T2w);
        assert!(loaded.is_fitted());
    }
}
