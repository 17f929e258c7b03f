use super::manager::{ComposeFlavor, DockerManager};
use super::runtime::ContainerRuntime;
use super::types::{CommandOutput, LogSink, LogStream};
use crate::error::{FleetError, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

impl DockerManager {
    /// 检查 Docker 状态
    pub async fn check_docker_status(&self) -> Result<()> {
        // 检查 docker 命令
        if which::which("docker").is_err() {
            return Err(FleetError::docker("docker is not installed or not in PATH"));
        }

        // 检查 Docker 服务是否运行
        let output = Command::new("docker")
            .arg("info")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FleetError::docker(format!(
                "docker daemon is not running: {}",
                stderr.trim()
            )));
        }

        Ok(())
    }

    /// 探测 compose 的调用方式，结果缓存在管理器中
    async fn compose_flavor(&self) -> ComposeFlavor {
        *self
            .flavor
            .get_or_init(|| async {
                let plugin = Command::new("docker")
                    .args(["compose", "version"])
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .await
                    .map(|status| status.success())
                    .unwrap_or(false);

                // 回退到 docker-compose（旧语法）
                if !plugin && which::which("docker-compose").is_ok() {
                    debug!("docker compose plugin unavailable, using docker-compose");
                    ComposeFlavor::Standalone
                } else {
                    ComposeFlavor::Plugin
                }
            })
            .await
    }

    async fn compose_command(&self, dir: &Path, args: &[&str]) -> Command {
        let mut command = match self.compose_flavor().await {
            ComposeFlavor::Plugin => {
                let mut command = Command::new("docker");
                command.arg("compose");
                command
            }
            ComposeFlavor::Standalone => Command::new("docker-compose"),
        };
        command.args(args).current_dir(dir);
        command
    }

    /// 执行命令并逐行转发输出
    ///
    /// stdout/stderr 两路同时读取，进程退出后再统一读空管道中剩余的内容。
    /// 输出按字节读取，非 UTF-8 内容有损转换；某一路读取出错只关闭该路，不影响等待进程退出。
    async fn run_streamed(&self, mut command: Command, sink: &mut LogSink) -> Result<bool> {
        let program = command
            .as_std()
            .get_program()
            .to_string_lossy()
            .into_owned();
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| FleetError::docker(format!("failed to start {program}: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FleetError::docker("stdout pipe is not available"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| FleetError::docker("stderr pipe is not available"))?;
        let mut out_lines = BufReader::new(stdout).split(b'\n');
        let mut err_lines = BufReader::new(stderr).split(b'\n');
        let mut out_open = true;
        let mut err_open = true;

        let status = loop {
            tokio::select! {
                segment = out_lines.next_segment(), if out_open => {
                    out_open = forward_segment(segment, LogStream::Stdout, sink);
                }
                segment = err_lines.next_segment(), if err_open => {
                    err_open = forward_segment(segment, LogStream::Stderr, sink);
                }
                status = child.wait() => break status?,
            }
        };

        // 进程已退出，读空管道
        while out_open {
            let segment = out_lines.next_segment().await;
            out_open = forward_segment(segment, LogStream::Stdout, sink);
        }
        while err_open {
            let segment = err_lines.next_segment().await;
            err_open = forward_segment(segment, LogStream::Stderr, sink);
        }

        if !status.success() {
            warn!("[{}] {} exited with {}", sink.project(), program, status);
        }
        Ok(status.success())
    }
}

/// 转发读到的一行，返回该管道是否仍然打开
fn forward_segment(
    segment: std::io::Result<Option<Vec<u8>>>,
    stream: LogStream,
    sink: &mut LogSink,
) -> bool {
    match segment {
        Ok(Some(bytes)) => {
            let mut line = String::from_utf8_lossy(&bytes).into_owned();
            if line.ends_with('\r') {
                line.pop();
            }
            sink.push(stream, line);
            true
        }
        Ok(None) => false,
        Err(e) => {
            warn!("[{}] failed to read {:?}: {}", sink.project(), stream, e);
            sink.note(format!("output stream closed: {e}"));
            false
        }
    }
}

impl ContainerRuntime for DockerManager {
    async fn compose(&self, dir: &Path, args: &[&str], sink: &mut LogSink) -> Result<bool> {
        let command = self.compose_command(dir, args).await;
        self.run_streamed(command, sink).await
    }

    async fn compose_ps(&self, dir: &Path) -> Result<CommandOutput> {
        let output = self
            .compose_command(dir, &["ps", "--format", "json"])
            .await
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| FleetError::docker(format!("failed to query containers: {e}")))?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn remove_image(&self, image: &str, sink: &mut LogSink) -> Result<bool> {
        let mut command = Command::new("docker");
        command.args(["rmi", image]);
        self.run_streamed(command, sink).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::sync::mpsc;

    fn shell(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.args(["-c", script]);
        command
    }

    #[tokio::test]
    async fn test_run_streamed_collects_both_streams_until_exit() {
        let manager = DockerManager::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sink = LogSink::new("web", Some(tx));

        let ok = manager
            .run_streamed(
                shell("echo pulling; echo warning >&2; sleep 0.1; printf 'last line no newline'"),
                &mut sink,
            )
            .await
            .unwrap();

        assert!(ok);
        let lines = sink.into_lines();
        assert!(lines.contains(&"pulling".to_string()));
        assert!(lines.contains(&"warning".to_string()));
        assert_eq!(lines.last().unwrap(), "last line no newline");

        let mut streamed = Vec::new();
        while let Ok(line) = rx.try_recv() {
            streamed.push(line);
        }
        assert_eq!(streamed.len(), 3);
        assert!(
            streamed
                .iter()
                .any(|line| line.stream == LogStream::Stderr && line.line == "warning")
        );
    }

    #[tokio::test]
    async fn test_run_streamed_survives_invalid_utf8() {
        let dir = tempdir().unwrap();
        let marker = dir.path().join("marker");
        let script = format!(
            "echo before; printf '\\377\\376\\n'; sleep 0.2; echo after; touch '{}'",
            marker.display()
        );

        let manager = DockerManager::new();
        let mut sink = LogSink::new("web", None);
        let ok = manager.run_streamed(shell(&script), &mut sink).await.unwrap();

        assert!(ok);
        assert!(marker.exists());
        let lines = sink.into_lines();
        assert_eq!(lines.first().unwrap(), "before");
        assert_eq!(lines.last().unwrap(), "after");
        assert_eq!(lines.len(), 3);
    }

    #[tokio::test]
    async fn test_run_streamed_reports_failed_exit() {
        let manager = DockerManager::new();
        let mut sink = LogSink::new("web", None);
        let ok = manager
            .run_streamed(shell("echo 'no such service' >&2; exit 3"), &mut sink)
            .await
            .unwrap();

        assert!(!ok);
        assert_eq!(sink.lines(), ["no such service"]);
    }
}
