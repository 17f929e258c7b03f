// 模块声明
mod command;
mod manager;
mod probe;
mod runtime;
mod types;

#[cfg(test)]
pub(crate) mod fake;

// 重新导出公共API
pub use manager::{ComposeFlavor, DockerManager};
pub use probe::{ProbeResult, parse_ps_output, probe, summarize};
pub use runtime::ContainerRuntime;
pub use types::{CommandOutput, LogLine, LogSink, LogStream, ProjectStatus};
