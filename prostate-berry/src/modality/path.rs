//! 路径配置的两阶段模型: `未配置 -> 已设置路径 -> 已加载`.

use std::path::{Path, PathBuf};

use crate::ValidationError;

/// 模态的数据路径: 单个路径或按顺序排列的多个路径.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PathData {
    /// 单个目录或文件.
    Single(PathBuf),

    /// 多个目录或文件, 顺序有意义.
    List(Vec<PathBuf>),
}

impl PathData {
    /// 从多个路径创建 `PathData::List`.
    pub fn list<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Self {
        Self::List(it.into_iter().map(|p| p.as_ref().to_owned()).collect())
    }

    /// 单个路径. 为列表时返回 `None`.
    #[inline]
    pub fn as_single(&self) -> Option<&Path> {
        match self {
            Self::Single(p) => Some(p.as_path()),
            Self::List(_) => None,
        }
    }

    /// 检查所有路径都存在. 返回第一个不存在的路径对应的错误.
    pub fn check_exists(&self) -> Result<(), ValidationError> {
        let missing = match self {
            Self::Single(p) => (!p.exists()).then_some(p),
            Self::List(v) => v.iter().find(|p| !p.exists()),
        };
        match missing {
            Some(p) => Err(ValidationError::PathNotFound(p.clone())),
            None => Ok(()),
        }
    }
}

impl From<PathBuf> for PathData {
    #[inline]
    fn from(p: PathBuf) -> Self {
        Self::Single(p)
    }
}

impl From<&Path> for PathData {
    #[inline]
    fn from(p: &Path) -> Self {
        Self::Single(p.to_owned())
    }
}

impl From<&str> for PathData {
    #[inline]
    fn from(p: &str) -> Self {
        Self::Single(PathBuf::from(p))
    }
}

impl From<Vec<PathBuf>> for PathData {
    #[inline]
    fn from(v: Vec<PathBuf>) -> Self {
        Self::List(v)
    }
}

/// 路径配置状态.
///
/// 再次提供路径时会发出警告并使用新路径; 只有在读取成功后才提交新路径,
/// 失败的读取不会改变状态.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum PathState {
    /// 尚未设置路径.
    #[default]
    Unconfigured,

    /// 已设置路径, 尚未加载.
    PathSet(PathData),

    /// 已从该路径加载数据.
    Loaded(PathData),
}

impl PathState {
    /// 当前存储的路径.
    #[inline]
    pub fn path(&self) -> Option<&PathData> {
        match self {
            Self::Unconfigured => None,
            Self::PathSet(p) | Self::Loaded(p) => Some(p),
        }
    }

    /// 是否已加载.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// 设置路径, 回到 `PathSet` 状态. 若此前已有路径, 发出警告并返回旧路径.
    pub fn set(&mut self, path: PathData) -> Option<PathData> {
        let old = std::mem::replace(self, Self::PathSet(path));
        let old = match old {
            Self::Unconfigured => None,
            Self::PathSet(p) | Self::Loaded(p) => Some(p),
        };
        if let Some(p) = &old {
            log::warn!("the path {p:?} is replaced by the newly supplied path");
        }
        old
    }

    /// 求本次读取实际使用的路径, 不修改状态.
    ///
    /// 显式给出的 `explicit` 优先; 若此前已存储路径, 则发出警告, 并在返回值的
    /// 第二项中给出将被替换的旧路径. 二者都不存在时返回 `NoPath`.
    pub fn resolve(
        &self,
        explicit: Option<PathData>,
    ) -> Result<(PathData, Option<PathData>), ValidationError> {
        match (explicit, self.path()) {
            (Some(new), Some(old)) => {
                log::warn!("the path {old:?} is replaced by the newly supplied path {new:?}");
                Ok((new, Some(old.clone())))
            }
            (Some(new), None) => Ok((new, None)),
            (None, Some(old)) => Ok((old.clone(), None)),
            (None, None) => Err(ValidationError::NoPath),
        }
    }

    /// 读取成功后提交路径.
    #[inline]
    pub fn commit(&mut self, path: PathData) {
        *self = Self::Loaded(path);
    }
}

#[cfg(test)]
mod tests {
    use super::{PathData, PathState};
    use crate::ValidationError;

    #[test]
    fn test_resolve_without_any_path() {
        let s = PathState::default();
        assert_eq!(s.resolve(None), Err(ValidationError::NoPath));
    }

    #[test]
    fn test_explicit_path_overrides_stored() {
        let mut s = PathState::default();
        assert_eq!(s.set("a".into()), None);
        assert_eq!(s.resolve(None), Ok((PathData::from("a"), None)));
        assert_eq!(
            s.resolve(Some("b".into())),
            Ok((PathData::from("b"), Some(PathData::from("a"))))
        );
        // `resolve` 不修改状态.
        assert_eq!(s.path(), Some(&PathData::from("a")));

        s.commit("b".into());
        assert!(s.is_loaded());
        assert_eq!(s.set("c".into()), Some(PathData::from("b")));
        assert!(!s.is_loaded());
    }

    #[test]
    fn test_check_exists() {
        let temp = tempfile::tempdir().unwrap();
        let ok = PathData::from(temp.path());
        assert!(ok.check_exists().is_ok());

        let missing = temp.path().join("None");
        let list = PathData::list([temp.path(), missing.as_path()]);
        assert_eq!(
            list.check_exists(),
            Err(ValidationError::PathNotFound(missing))
        );
    }
}
