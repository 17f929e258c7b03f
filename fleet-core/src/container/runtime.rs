use super::types::{CommandOutput, LogSink};
use crate::error::Result;
use std::future::Future;
use std::path::Path;

/// 容器运行时的抽象
///
/// 生命周期执行器和状态探测只通过这个接口访问运行时，
/// 测试中用内存实现替换真实的 docker。
pub trait ContainerRuntime: Send + Sync {
    /// 在项目目录中执行 compose 子命令，输出逐行写入 `sink`
    ///
    /// 返回进程是否以 0 退出；无法启动进程时返回 `Err`。
    fn compose(
        &self,
        dir: &Path,
        args: &[&str],
        sink: &mut LogSink,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// 查询项目目录下的容器状态（`compose ps --format json`）
    fn compose_ps(&self, dir: &Path) -> impl Future<Output = Result<CommandOutput>> + Send;

    /// 删除一个镜像，输出逐行写入 `sink`
    fn remove_image(
        &self,
        image: &str,
        sink: &mut LogSink,
    ) -> impl Future<Output = Result<bool>> + Send;
}
