use ndarray::{ArrayView3, ArrayViewMut3};

use super::source;
use super::{Histogram, Modality, ModalityKind, PathData, PathState};
use crate::volume::{SeriesMeta, Volume};
use crate::{Result, ValidationError};

/// 单序列模态 (T2W, ADC). 数据为 `(行, 列, 切片)` 的三维数组.
///
/// # 注意
///
/// 1. 路径必须是单个目录 (恰好一个 DICOM 序列) 或单个数组文件;
/// 2. 每次读取、归一化或反归一化之后都会刷新 [`Histogram`].
#[derive(Clone, Debug)]
pub struct StandaloneModality {
    kind: ModalityKind,
    path: PathState,
    reverse: bool,
    data: Option<Volume>,
    meta: Option<SeriesMeta>,
    histogram: Option<Histogram>,
}

impl StandaloneModality {
    /// 创建一个尚未配置路径的模态. `kind` 必须是单序列类型.
    pub fn new(kind: ModalityKind) -> std::result::Result<Self, ValidationError> {
        if !kind.is_standalone() {
            return Err(ValidationError::UnsupportedModality(kind));
        }
        Ok(Self {
            kind,
            path: PathState::Unconfigured,
            reverse: false,
            data: None,
            meta: None,
            histogram: None,
        })
    }

    /// T2W 模态.
    #[inline]
    pub fn t2w() -> Self {
        Self {
            kind: ModalityKind::T2w,
            path: PathState::Unconfigured,
            reverse: false,
            data: None,
            meta: None,
            histogram: None,
        }
    }

    /// ADC 模态.
    #[inline]
    pub fn adc() -> Self {
        Self {
            kind: ModalityKind::Adc,
            ..Self::t2w()
        }
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

    /// 读取时是否翻转切片轴, 见 [`reverse_slices`](crate::volume::reverse_slices).
    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// 直接由内存中的数组构造, 视为已读取.
    pub fn from_array(
        kind: ModalityKind,
        data: Volume,
    ) -> std::result::Result<Self, ValidationError> {
        let mut m = Self::new(kind)?;
        m.meta = Some(SeriesMeta::unit(data.dim()));
        m.data = Some(data);
        m.update_histogram();
        Ok(m)
    }

    /// 读取数据.
    ///
    /// `path` 优先于已存储的路径 (此时发出警告); 二者都不存在时返回 `NoPath`.
    /// 失败时模态状态保持不变.
    ///
    /// 成功时返回被 `path` 替换的旧路径; 没有发生替换时返回 `None`.
    pub fn read_data_from_path(&mut self, path: Option<PathData>) -> Result<Option<PathData>> {
        let (path, replaced) = self.path.resolve(path)?;
        let src = match &path {
            PathData::Single(p) => source::single_source(p)?,
            PathData::List(v) => {
                // 列表只允许恰好一项.
                match v.as_slice() {
                    [p] => source::single_source(p)?,
                    [] => return Err(ValidationError::EmptyPathList.into()),
                    _ => {
                        let p = v.first().cloned().unwrap_or_default();
                        return Err(ValidationError::WrongPathType(p).into());
                    }
                }
            }
        };
        let (volume, meta) = src.read(self.reverse)?;
        log::debug!("read {} from {:?}", self.kind, path);

        self.data = Some(volume);
        self.meta = Some(meta);
        self.path.commit(path);
        self.update_histogram();
        Ok(replaced)
    }

    /// 体数据. 未读取时返回 `None`.
    #[inline]
    pub fn data(&self) -> Option<ArrayView3<'_, f64>> {
        self.data.as_ref().map(|d| d.view())
    }

    /// 可变体数据. 修改后需要调用 [`update_histogram`](Self::update_histogram).
    #[inline]
    pub fn data_mut(&mut self) -> Option<ArrayViewMut3<'_, f64>> {
        self.data.as_mut().map(|d| d.view_mut())
    }

    /// 采集参数.
    #[inline]
    pub fn meta(&self) -> Option<&SeriesMeta> {
        self.meta.as_ref()
    }

    /// 强度统计.
    #[inline]
    pub fn histogram(&self) -> Option<&Histogram> {
        self.histogram.as_ref()
    }

    /// 最小强度.
    #[inline]
    pub fn min(&self) -> Option<f64> {
        self.histogram.as_ref().map(|h| h.min)
    }

    /// 最大强度.
    #[inline]
    pub fn max(&self) -> Option<f64> {
        self.histogram.as_ref().map(|h| h.max)
    }

    /// 路径配置状态.
    #[inline]
    pub fn path_state(&self) -> &PathState {
        &self.path
    }

    /// 重新计算强度统计.
    pub fn update_histogram(&mut self) {
        self.histogram = self.data.as_ref().and_then(|d| Histogram::compute(d.iter()));
    }
}

impl Modality for StandaloneModality {
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

    #[inline]
    fn as_standalone(&self) -> Option<&StandaloneModality> {
        Some(self)
    }

    #[inline]
    fn as_standalone_mut(&mut self) -> Option<&mut StandaloneModality> {
        Some(self)
    }
}
