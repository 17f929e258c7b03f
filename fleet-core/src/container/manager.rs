use tokio::sync::OnceCell;

/// compose 命令的调用方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeFlavor {
    /// `docker compose`（插件形式，新语法）
    Plugin,
    /// 独立的 `docker-compose`（旧语法）
    Standalone,
}

/// 基于 docker 命令行的容器运行时
///
/// 所有 compose 命令都在项目目录中执行，由 compose 自己查找 manifest 文件。
#[derive(Debug, Default)]
pub struct DockerManager {
    pub(crate) flavor: OnceCell<ComposeFlavor>,
}

impl DockerManager {
    /// 创建新的 Docker 管理器
    ///
    /// compose 的调用方式在第一次执行命令时探测并缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用固定的 compose 调用方式，跳过探测
    pub fn with_flavor(flavor: ComposeFlavor) -> Self {
        Self {
            flavor: OnceCell::new_with(Some(flavor)),
        }
    }
}
