use std::str::FromStr;

use ndarray::{Array3, Array4, ArrayView3, Axis};

use super::source::{self, Source};
use super::{Modality, ModalityKind, PathData, PathState};
use crate::{Result, ValidationError, VolumeError};

/// [`GtModality::extract_gt_data`] 的输出类型.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputType {
    /// 真值体素在每个轴上的坐标.
    Index,

    /// 该类别的体数据.
    Data,
}

impl FromStr for OutputType {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "index" => Ok(Self::Index),
            "data" => Ok(Self::Data),
            _ => Err(ValidationError::UnknownOutputType(s.to_string())),
        }
    }
}

/// [`GtModality::extract_gt_data`] 的结果.
#[derive(Clone, Debug, PartialEq)]
pub enum GtExtract {
    /// `[行坐标, 列坐标, 切片坐标]`, 按 C 顺序排列, 三者等长.
    Index([Vec<usize>; 3]),

    /// `(行, 列, 切片)` 布尔体数据.
    Data(Array3<bool>),
}

impl GtExtract {
    /// 坐标. 输出类型为 `Data` 时返回 `None`.
    pub fn into_index(self) -> Option<[Vec<usize>; 3]> {
        match self {
            Self::Index(idx) => Some(idx),
            Self::Data(_) => None,
        }
    }

    /// 体数据. 输出类型为 `Index` 时返回 `None`.
    pub fn into_data(self) -> Option<Array3<bool>> {
        match self {
            Self::Data(d) => Some(d),
            Self::Index(_) => None,
        }
    }
}

/// 真值模态: 每个解剖类别一个布尔体数据.
///
/// 数据形状为 `(类别, 行, 列, 切片)`. 非零体素为真.
///
/// 路径可以是:
///
/// 1. 单个目录, 其中每个子目录 (按名称排序) 对应一个类别; 没有子目录时,
///   目录中的每个 DICOM 序列对应一个类别;
/// 2. 路径列表, 每个类别一项, 每一项是恰好包含一个序列的目录或一个数组文件.
#[derive(Clone, Debug, Default)]
pub struct GtModality {
    path: PathState,
    reverse: bool,
    labels: Vec<String>,
    data: Option<Array4<bool>>,
}

impl GtModality {
    /// 创建一个尚未配置路径的真值模态.
    #[inline]
    pub fn new() -> Self {
        Self::default()
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

    /// 直接由内存中的布尔数组构造, 视为已读取.
    pub fn from_masks<S: AsRef<str>>(
        labels: &[S],
        masks: Array4<bool>,
    ) -> std::result::Result<Self, ValidationError> {
        let series = masks.len_of(Axis(0));
        if labels.len() != series {
            return Err(ValidationError::LabelCountMismatch {
                labels: labels.len(),
                series,
            });
        }
        Ok(Self {
            labels: labels.iter().map(|s| s.as_ref().to_string()).collect(),
            data: Some(masks),
            ..Self::default()
        })
    }

    /// 读取真值.
    ///
    /// `labels` 与解析得到的序列一一对应; 个数不一致时返回 `LabelCountMismatch`.
    /// 全部校验在解码像素数据之前完成, 失败时状态保持不变.
    /// 成功时返回被 `path` 替换的旧路径.
    pub fn read_data_from_path<S: AsRef<str>>(
        &mut self,
        labels: &[S],
        path: Option<PathData>,
    ) -> Result<Option<PathData>> {
        let (path, replaced) = self.path.resolve(path)?;
        let sources = Self::resolve_sources(&path)?;
        if labels.len() != sources.len() {
            return Err(ValidationError::LabelCountMismatch {
                labels: labels.len(),
                series: sources.len(),
            }
            .into());
        }

        let volumes = source::read_all(&sources, self.reverse)?;
        let masks: Vec<Array3<bool>> = volumes
            .into_iter()
            .map(|(v, _)| v.mapv(|p| p != 0.0))
            .collect();
        let views: Vec<_> = masks.iter().map(|m| m.view()).collect();
        let data = ndarray::stack(Axis(0), &views).map_err(VolumeError::from)?;
        log::debug!("read {} ground-truth categories from {:?}", masks.len(), path);

        self.labels = labels.iter().map(|s| s.as_ref().to_string()).collect();
        self.data = Some(data);
        self.path.commit(path);
        Ok(replaced)
    }

    fn resolve_sources(path: &PathData) -> Result<Vec<Source>> {
        match path {
            PathData::List(v) if v.is_empty() => Err(ValidationError::EmptyPathList.into()),
            PathData::List(v) => source::list_sources(v),
            PathData::Single(dir) => {
                if !dir.exists() {
                    return Err(ValidationError::PathNotFound(dir.clone()).into());
                }
                if !dir.is_dir() {
                    return Err(ValidationError::WrongPathType(dir.clone()).into());
                }
                let subs = source::sub_dirs(dir)?;
                if subs.is_empty() {
                    source::dir_series(dir)
                } else {
                    subs.iter().map(|p| source::single_source(p)).collect()
                }
            }
        }
    }

    /// 类别个数. 读取后与 [`category_labels`](Self::category_labels) 等长.
    #[inline]
    pub fn n_series(&self) -> usize {
        self.data.as_ref().map_or(0, |d| d.len_of(Axis(0)))
    }

    /// 类别标签.
    #[inline]
    pub fn category_labels(&self) -> &[String] {
        &self.labels
    }

    /// 全部真值.
    #[inline]
    pub fn data(&self) -> Option<&Array4<bool>> {
        self.data.as_ref()
    }

    /// 类别 `label` 的掩膜.
    ///
    /// 未读取时返回 `NotRead`, 标签不存在时返回 `UnknownLabel`.
    pub fn mask(&self, label: &str) -> std::result::Result<ArrayView3<'_, bool>, ValidationError> {
        let data = self
            .data
            .as_ref()
            .ok_or(ValidationError::NotRead(ModalityKind::GroundTruth))?;
        let idx = self
            .labels
            .iter()
            .position(|l| l == label)
            .ok_or_else(|| ValidationError::UnknownLabel(label.to_string()))?;
        Ok(data.index_axis(Axis(0), idx))
    }

    /// 提取类别 `label` 的真值.
    pub fn extract_gt_data(
        &self,
        label: &str,
        output: OutputType,
    ) -> std::result::Result<GtExtract, ValidationError> {
        let mask = self.mask(label)?;
        Ok(match output {
            OutputType::Data => GtExtract::Data(mask.to_owned()),
            OutputType::Index => {
                let mut idx: [Vec<usize>; 3] = Default::default();
                for ((r, c, z), _) in mask.indexed_iter().filter(|(_, v)| **v) {
                    idx[0].push(r);
                    idx[1].push(c);
                    idx[2].push(z);
                }
                GtExtract::Index(idx)
            }
        })
    }

    /// 路径配置状态.
    #[inline]
    pub fn path_state(&self) -> &PathState {
        &self.path
    }
}

impl Modality for GtModality {
    #[inline]
    fn kind(&self) -> ModalityKind {
        ModalityKind::GroundTruth
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
    fn as_ground_truth(&self) -> Option<&GtModality> {
        Some(self)
    }
}
