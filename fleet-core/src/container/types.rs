use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// 项目的运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Running,
    Stopped,
    Unknown,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Running => "running",
            ProjectStatus::Stopped => "stopped",
            ProjectStatus::Unknown => "unknown",
        }
    }

    /// 状态对应的终端显示图标
    pub fn icon(&self) -> &'static str {
        match self {
            ProjectStatus::Running => "🟢",
            ProjectStatus::Stopped => "⚪",
            ProjectStatus::Unknown => "❓",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// 一次性收集的命令输出
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// 日志行的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
    /// 执行器自己写入的步骤说明
    Status,
}

/// 推送给调用方的一行日志
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub project: String,
    pub stream: LogStream,
    pub line: String,
}

/// 流式日志接收器
///
/// 每一行先转发给调用方的通道（如果有），再累积到内部缓冲区，
/// 操作结束后缓冲区就是该项目的完整日志。通道关闭不影响累积。
#[derive(Debug)]
pub struct LogSink {
    project: String,
    sender: Option<UnboundedSender<LogLine>>,
    lines: Vec<String>,
}

impl LogSink {
    pub fn new(project: impl Into<String>, sender: Option<UnboundedSender<LogLine>>) -> Self {
        Self {
            project: project.into(),
            sender,
            lines: Vec::new(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn push(&mut self, stream: LogStream, line: impl Into<String>) {
        let line = line.into();
        debug!("[{}] {:?}: {}", self.project, stream, line);

        if let Some(sender) = &self.sender {
            let _ = sender.send(LogLine {
                project: self.project.clone(),
                stream,
                line: line.clone(),
            });
        }
        self.lines.push(line);
    }

    /// 写入一条步骤说明
    pub fn note(&mut self, line: impl Into<String>) {
        self.push(LogStream::Status, line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}
