use ndarray::{Array4, ArrayView3, ArrayView4, Axis};

use super::source;
use super::{Histogram, Modality, ModalityKind, PathData, PathState};
use crate::volume::SeriesMeta;
use crate::{Result, ValidationError, VolumeError};

/// 多序列模态 (DCE, DWI). 数据为 `(序列, 行, 列, 切片)` 的四维数组.
///
/// 路径可以是:
///
/// 1. 单个目录, 其中每个 DICOM 序列对应一个时间点或 b 值;
/// 2. 路径列表, 每一项是恰好包含一个序列的目录或一个数组文件.
///
/// 所有序列的空间形状必须一致. 每个序列保留各自的采集参数与强度统计.
#[derive(Clone, Debug)]
pub struct MultisequenceModality {
    kind: ModalityKind,
    path: PathState,
    reverse: bool,
    data: Option<Array4<f64>>,
    meta: Vec<SeriesMeta>,
    histograms: Vec<Option<Histogram>>,
}

impl MultisequenceModality {
    /// 创建一个尚未配置路径的模态. `kind` 必须是多序列类型.
    pub fn new(kind: ModalityKind) -> std::result::Result<Self, ValidationError> {
        if !kind.is_multisequence() {
            return Err(ValidationError::UnsupportedModality(kind));
        }
        Ok(Self {
            kind,
            path: PathState::Unconfigured,
            reverse: false,
            data: None,
            meta: Vec::new(),
            histograms: Vec::new(),
        })
    }

    /// 设置路径, 不读取数据.
    pub fn with_path<P: Into<PathData>>(mut self, path: P) -> Self {
        self.set_path(path);
        self
    }

    /// 设置路径, 不读取数据. 若此前已有路径, 发出警告并返回被替换的旧路径.
    pub fn set_path<P: Into<PathData>>(&mut self, path: P) -> Option<PathData> {
        self.path.set(path.into())
    }

    /// 读取时是否翻转切片轴.
    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// 直接由内存中的数组构造, 视为已读取.
    pub fn from_array(
        kind: ModalityKind,
        data: Array4<f64>,
    ) -> std::result::Result<Self, ValidationError> {
        let mut m = Self::new(kind)?;
        let (_, r, c, z) = data.dim();
        m.meta = vec![SeriesMeta::unit((r, c, z)); data.len_of(Axis(0))];
        m.data = Some(data);
        m.update_histogram();
        Ok(m)
    }

    /// 读取数据. 路径解析规则同 [`StandaloneModality`](super::StandaloneModality).
    pub fn read_data_from_path(&mut self, path: Option<PathData>) -> Result<Option<PathData>> {
        let (path, replaced) = self.path.resolve(path)?;
        let sources = match &path {
            PathData::Single(dir) => source::dir_series(dir)?,
            PathData::List(v) if v.is_empty() => return Err(ValidationError::EmptyPathList.into()),
            PathData::List(v) => source::list_sources(v)?,
        };
        let volumes = source::read_all(&sources, self.reverse)?;

        let views: Vec<_> = volumes.iter().map(|(v, _)| v.view()).collect();
        let data = ndarray::stack(Axis(0), &views).map_err(VolumeError::from)?;
        log::debug!("read {} series of {} from {:?}", views.len(), self.kind, path);

        self.meta = volumes.into_iter().map(|(_, m)| m).collect();
        self.data = Some(data);
        self.path.commit(path);
        self.update_histogram();
        Ok(replaced)
    }

    /// 序列个数. 未读取时为 0.
    #[inline]
    pub fn n_series(&self) -> usize {
        self.data.as_ref().map_or(0, |d| d.len_of(Axis(0)))
    }

    /// 全部数据.
    #[inline]
    pub fn data(&self) -> Option<ArrayView4<'_, f64>> {
        self.data.as_ref().map(|d| d.view())
    }

    /// 第 `i` 个序列.
    pub fn series(&self, i: usize) -> Option<ArrayView3<'_, f64>> {
        let d = self.data.as_ref()?;
        (i < d.len_of(Axis(0))).then(|| d.index_axis(Axis(0), i))
    }

    /// 每个序列的采集参数.
    #[inline]
    pub fn meta(&self) -> &[SeriesMeta] {
        &self.meta
    }

    /// 每个序列的强度统计.
    #[inline]
    pub fn histograms(&self) -> &[Option<Histogram>] {
        &self.histograms
    }

    /// 全部序列的最小、最大强度.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.histograms
            .iter()
            .flatten()
            .map(|h| (h.min, h.max))
            .reduce(|(a, b), (c, d)| (a.min(c), b.max(d)))
    }

    /// 路径配置状态.
    #[inline]
    pub fn path_state(&self) -> &PathState {
        &self.path
    }

    /// 重新计算每个序列的强度统计.
    pub fn update_histogram(&mut self) {
        self.histograms = match &self.data {
            Some(d) => d
                .axis_iter(Axis(0))
                .map(|s| Histogram::compute(s.iter()))
                .collect(),
            None => Vec::new(),
        };
    }
}

impl Modality for MultisequenceModality {
    #[inline]
    fn kind(&self) -> ModalityKind {
        self.kind
    }

    #[inline]
    fn is_read(&self) -> bool {
        self.data.is_some()
    }

    #[inline]
    fn path_data(&self) -> Option<&PathData> {
        self.path.path()
    }
}
