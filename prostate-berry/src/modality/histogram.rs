use ndarray::Array1;

use crate::consts::histogram::MAX_BINS;

/// 强度统计: 最小值、最大值与概率密度直方图.
///
/// 直方图的区间数为 `round(max - min)` (至少为 1, 至多为 [`MAX_BINS`]),
/// 即大约每个强度单位一个区间.
/// 非有限值 (`NaN`, `±inf`) 不参与统计.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    /// 最小强度.
    pub min: f64,

    /// 最大强度.
    pub max: f64,

    /// 概率密度, 长度为区间数. 满足 `sum(pdf * 区间宽度) == 1`.
    pub pdf: Array1<f64>,

    /// 区间边界, 长度为区间数加一.
    pub bin_edges: Array1<f64>,
}

impl Histogram {
    /// 计算 `values` 的统计量. 没有任何有限值时返回 `None`.
    pub fn compute<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> Option<Self> {
        let finite: Vec<f64> = values.into_iter().copied().filter(|v| v.is_finite()).collect();
        let (min, max) = finite
            .iter()
            .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;

        let range = (max - min).round();
        if range > MAX_BINS as f64 {
            log::debug!("intensity range {range} exceeds {MAX_BINS} bins, the bins are widened");
        }
        let bins = (range.min(MAX_BINS as f64) as usize).max(1);
        // 退化区间按 `[min - 0.5, max + 0.5]` 处理.
        let (lo, hi) = if max > min {
            (min, max)
        } else {
            (min - 0.5, max + 0.5)
        };
        let width = (hi - lo) / bins as f64;

        let mut counts = vec![0usize; bins];
        for v in finite.iter() {
            let b = (((v - lo) / width) as usize).min(bins - 1);
            counts[b] += 1;
        }
        let total = finite.len() as f64;
        let pdf = Array1::from_iter(counts.into_iter().map(|c| c as f64 / (total * width)));
        let bin_edges = Array1::from_iter((0..=bins).map(|i| lo + width * i as f64));

        Some(Self {
            min,
            max,
            pdf,
            bin_edges,
        })
    }

    /// 区间个数.
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.pdf.len()
    }
}
