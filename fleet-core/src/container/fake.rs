//! 测试用的内存运行时

use super::runtime::ContainerRuntime;
use super::types::{CommandOutput, LogSink, LogStream};
use crate::error::{FleetError, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

/// 记录所有调用，并按预设结果返回
#[derive(Debug, Default)]
pub(crate) struct FakeRuntime {
    calls: Mutex<Vec<String>>,
    failing_compose: HashSet<(String, String)>,
    failing_images: HashSet<String>,
    ps_outputs: HashMap<String, CommandOutput>,
    panic_project: Option<String>,
}

fn project_of(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl FakeRuntime {
    /// 指定项目的某个 compose 子命令以非 0 退出
    pub fn fail_compose(mut self, project: &str, action: &str) -> Self {
        self.failing_compose
            .insert((project.to_string(), action.to_string()));
        self
    }

    pub fn fail_image(mut self, image: &str) -> Self {
        self.failing_images.insert(image.to_string());
        self
    }

    pub fn with_ps(mut self, project: &str, output: CommandOutput) -> Self {
        self.ps_outputs.insert(project.to_string(), output);
        self
    }

    /// 对指定项目执行 compose 时直接 panic
    pub fn panic_on(mut self, project: &str) -> Self {
        self.panic_project = Some(project.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl ContainerRuntime for FakeRuntime {
    async fn compose(&self, dir: &Path, args: &[&str], sink: &mut LogSink) -> Result<bool> {
        let project = project_of(dir);
        self.record(format!("compose {} {}", project, args.join(" ")));

        if self.panic_project.as_deref() == Some(project.as_str()) {
            panic!("runtime exploded for {project}");
        }

        let action = args.first().copied().unwrap_or_default();
        if self
            .failing_compose
            .contains(&(project.clone(), action.to_string()))
        {
            sink.push(LogStream::Stderr, format!("{action} failed for {project}"));
            return Ok(false);
        }

        sink.push(LogStream::Stdout, format!("{action} {project} done"));
        Ok(true)
    }

    async fn compose_ps(&self, dir: &Path) -> Result<CommandOutput> {
        let project = project_of(dir);
        self.record(format!("ps {project}"));
        self.ps_outputs
            .get(&project)
            .cloned()
            .ok_or_else(|| FleetError::docker("docker not found"))
    }

    async fn remove_image(&self, image: &str, sink: &mut LogSink) -> Result<bool> {
        self.record(format!("rmi {image}"));
        if self.failing_images.contains(image) {
            sink.push(
                LogStream::Stderr,
                format!("Error response from daemon: conflict: unable to remove {image}"),
            );
            return Ok(false);
        }
        sink.push(LogStream::Stdout, format!("Untagged: {image}"));
        Ok(true)
    }
}
