use crate::config::{ComposeRoot, DownFailurePolicy};
use crate::constants::compose;
use crate::container::{ContainerRuntime, LogLine, LogSink};
use crate::error::{FleetError, Result};
use crate::journal::{OperationJournal, OperationKind, OperationStatus};
use crate::manifest;
use crate::registry::find_manifest;
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

const PROJECT_NOT_FOUND: &str = "project does not exist";

/// deploy 的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployAction {
    Up,
    Down,
}

impl DeployAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployAction::Up => "up",
            DeployAction::Down => "down",
        }
    }

    fn compose_args(&self) -> &'static [&'static str] {
        match self {
            DeployAction::Up => &["up", "-d"],
            DeployAction::Down => &["down"],
        }
    }

    fn operation(&self) -> OperationKind {
        match self {
            DeployAction::Up => OperationKind::DeployUp,
            DeployAction::Down => OperationKind::DeployDown,
        }
    }
}

impl fmt::Display for DeployAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// 可以单独保存的项目文件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Compose,
    Env,
}

impl FileKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            FileKind::Compose => compose::DEFAULT_MANIFEST_FILE_NAME,
            FileKind::Env => compose::ENV_FILE_NAME,
        }
    }

    fn operation(&self) -> OperationKind {
        match self {
            FileKind::Compose => OperationKind::SaveCompose,
            FileKind::Env => OperationKind::SaveEnv,
        }
    }
}

/// 新建项目的请求
#[derive(Debug, Clone, Default)]
pub struct CreateProject {
    pub name: String,
    pub manifest: String,
    pub env: Option<String>,
    /// 创建后立即执行 `up -d`
    pub start: bool,
}

/// 单个项目的操作结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectOutcome {
    pub project: String,
    pub status: OperationStatus,
    pub message: String,
    /// 按顺序累积的完整日志
    pub logs: Vec<String>,
    /// 未导致整体失败的子步骤错误，例如无法删除的镜像
    pub failures: Vec<String>,
}

impl ProjectOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// 操作过程中得出的结论，日志由 `LogSink` 单独收集
#[derive(Debug)]
struct Verdict {
    status: OperationStatus,
    message: String,
    failures: Vec<String>,
}

impl Verdict {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status: OperationStatus::Success,
            message: message.into(),
            failures: Vec::new(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: OperationStatus::Error,
            message: message.into(),
            failures: Vec::new(),
        }
    }

    fn with_failures(mut self, failures: Vec<String>) -> Self {
        self.failures = failures;
        self
    }
}

fn panic_reason(panic: &(dyn Any + Send)) -> String {
    if let Some(reason) = panic.downcast_ref::<&str>() {
        (*reason).to_string()
    } else if let Some(reason) = panic.downcast_ref::<String>() {
        reason.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// 生命周期执行器
///
/// 批量操作中每个项目独立处理，一个项目失败（包括 panic）不会中断其余项目；
/// 每次调用为每个项目写入且只写入一条操作记录。
pub struct LifecycleExecutor<R> {
    root: ComposeRoot,
    runtime: Arc<R>,
    journal: Arc<OperationJournal>,
    down_failure: DownFailurePolicy,
}

impl<R: ContainerRuntime> LifecycleExecutor<R> {
    pub fn new(root: ComposeRoot, runtime: Arc<R>, journal: Arc<OperationJournal>) -> Self {
        Self {
            root,
            runtime,
            journal,
            down_failure: DownFailurePolicy::default(),
        }
    }

    /// 设置 cleanup 中 "down" 失败时的策略
    pub fn with_down_failure(mut self, policy: DownFailurePolicy) -> Self {
        self.down_failure = policy;
        self
    }

    pub fn root(&self) -> &ComposeRoot {
        &self.root
    }

    pub fn journal(&self) -> &OperationJournal {
        &self.journal
    }

    /// 项目目录；名称非法或目录不存在时返回 None
    fn project_dir(&self, name: &str) -> Option<PathBuf> {
        if !manifest::is_valid_name(name) {
            return None;
        }
        Some(self.root.project_dir(name)).filter(|dir| dir.is_dir())
    }

    /// 把一次操作的结论、日志合并为结果并写入操作日志
    fn finish(
        &self,
        operation: OperationKind,
        project: &str,
        result: std::thread::Result<Verdict>,
        sink: LogSink,
    ) -> ProjectOutcome {
        let verdict = result.unwrap_or_else(|panic| {
            let reason = panic_reason(panic.as_ref());
            error!("{} on {} aborted unexpectedly: {}", operation, project, reason);
            Verdict::error(format!("unexpected error: {reason}"))
        });

        self.journal
            .record(operation, project, verdict.status, verdict.message.as_str());
        ProjectOutcome {
            project: project.to_string(),
            status: verdict.status,
            message: verdict.message,
            logs: sink.into_lines(),
            failures: verdict.failures,
        }
    }

    /// 批量启动或停止项目
    pub async fn deploy(
        &self,
        names: &[String],
        action: DeployAction,
        stream: Option<UnboundedSender<LogLine>>,
    ) -> Vec<ProjectOutcome> {
        let mut outcomes = Vec::with_capacity(names.len());
        for name in names {
            let mut sink = LogSink::new(name.as_str(), stream.clone());
            let result = AssertUnwindSafe(self.deploy_one(name, action, &mut sink))
                .catch_unwind()
                .await;
            outcomes.push(self.finish(action.operation(), name, result, sink));
        }
        outcomes
    }

    async fn deploy_one(&self, name: &str, action: DeployAction, sink: &mut LogSink) -> Verdict {
        let Some(dir) = self.project_dir(name) else {
            return Verdict::error(PROJECT_NOT_FOUND);
        };

        let args = action.compose_args();
        info!("Executing compose {} for {}", args.join(" "), name);
        match self.runtime.compose(&dir, args, sink).await {
            Ok(true) => Verdict::success(format!("project {action} succeeded")),
            Ok(false) => Verdict::error(format!("project {action} failed")),
            Err(e) => Verdict::error(e.to_string()),
        }
    }

    /// 停止项目并清理其镜像
    ///
    /// 三个步骤依次执行：down、读取镜像列表、逐个删除镜像。
    /// down 失败后仍继续清理镜像，最终结果由 [`DownFailurePolicy`] 决定；
    /// 单个镜像删除失败只记入 `failures`。
    pub async fn cleanup(
        &self,
        name: &str,
        stream: Option<UnboundedSender<LogLine>>,
    ) -> ProjectOutcome {
        let mut sink = LogSink::new(name, stream);
        let result = AssertUnwindSafe(self.cleanup_one(name, &mut sink))
            .catch_unwind()
            .await;
        self.finish(OperationKind::Cleanup, name, result, sink)
    }

    async fn cleanup_one(&self, name: &str, sink: &mut LogSink) -> Verdict {
        let Some(dir) = self.project_dir(name) else {
            return Verdict::error(PROJECT_NOT_FOUND);
        };
        let mut failures = Vec::new();

        sink.note(format!("Stopping project {name}..."));
        let stopped = self.stop(&dir, sink).await;
        if !stopped {
            warn!("Failed to stop project {} before cleanup", name);
            failures.push("compose down failed".to_string());
        }

        sink.note("Collecting project images...");
        let images = match read_images(&dir) {
            Ok(images) => images,
            Err(e) => {
                sink.note(format!("Operation failed: {e}"));
                return Verdict::error(e.to_string()).with_failures(failures);
            }
        };

        sink.note("Removing images...");
        failures.extend(self.remove_images(&images, sink).await);
        sink.note("Cleanup finished");

        if !stopped && self.down_failure == DownFailurePolicy::Fatal {
            return Verdict::error("failed to stop project").with_failures(failures);
        }
        if failures.is_empty() {
            Verdict::success("project cleaned up")
        } else {
            Verdict::success(format!(
                "project cleaned up with {} failed step(s)",
                failures.len()
            ))
            .with_failures(failures)
        }
    }

    /// 批量删除项目：尽力停止、尽力删除镜像，最后删除项目目录
    ///
    /// 只有删除目录失败会让结果为 error
    pub async fn delete(
        &self,
        names: &[String],
        stream: Option<UnboundedSender<LogLine>>,
    ) -> Vec<ProjectOutcome> {
        let mut outcomes = Vec::with_capacity(names.len());
        for name in names {
            let mut sink = LogSink::new(name.as_str(), stream.clone());
            let result = AssertUnwindSafe(self.delete_one(name, &mut sink))
                .catch_unwind()
                .await;
            outcomes.push(self.finish(OperationKind::Delete, name, result, sink));
        }
        outcomes
    }

    async fn delete_one(&self, name: &str, sink: &mut LogSink) -> Verdict {
        let Some(dir) = self.project_dir(name) else {
            return Verdict::error(PROJECT_NOT_FOUND);
        };
        let mut failures = Vec::new();

        sink.note(format!("Stopping project {name}..."));
        if !self.stop(&dir, sink).await {
            // 项目可能本来就没有运行
            error!("Error stopping project {}", name);
            failures.push("compose down failed".to_string());
        }

        match read_images(&dir) {
            Ok(images) => failures.extend(self.remove_images(&images, sink).await),
            Err(e) => {
                error!("Error cleaning up images for project {}: {}", name, e);
                sink.note(format!("Skipping image cleanup: {e}"));
                failures.push(format!("image cleanup skipped: {e}"));
            }
        }

        sink.note(format!("Removing {}", dir.display()));
        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            return Verdict::error(format!("failed to remove project directory: {e}"))
                .with_failures(failures);
        }
        Verdict::success("project deleted").with_failures(failures)
    }

    /// 执行 down，返回是否成功；启动失败也视为失败并写入日志
    async fn stop(&self, dir: &Path, sink: &mut LogSink) -> bool {
        match self.runtime.compose(dir, &["down"], sink).await {
            Ok(stopped) => stopped,
            Err(e) => {
                sink.note(format!("compose down failed: {e}"));
                false
            }
        }
    }

    /// 逐个删除镜像，返回删除失败的条目
    async fn remove_images(&self, images: &[String], sink: &mut LogSink) -> Vec<String> {
        let mut failures = Vec::new();
        for image in images {
            match self.runtime.remove_image(image, sink).await {
                Ok(true) => {}
                Ok(false) => {
                    // 镜像可能被其他项目使用
                    warn!("Image {} could not be removed", image);
                    failures.push(format!("image {image}: removal failed"));
                }
                Err(e) => {
                    sink.note(format!("Error removing image {image}: {e}"));
                    failures.push(format!("image {image}: {e}"));
                }
            }
        }
        failures
    }

    /// 新建项目
    ///
    /// 名称和 manifest 校验全部通过后才写入文件；校验失败返回 `Err`，不写任何文件。
    /// `start` 为 true 时随后执行 `up -d`，启动失败不会撤销已创建的项目。
    pub async fn create(
        &self,
        request: CreateProject,
        stream: Option<UnboundedSender<LogLine>>,
    ) -> Result<ProjectOutcome> {
        let name = request.name.trim().to_string();
        let dir = match self.prepare_create(&name, &request.manifest) {
            Ok(dir) => dir,
            Err(e) => {
                self.journal.record(
                    OperationKind::Create,
                    &name,
                    OperationStatus::Error,
                    e.to_string(),
                );
                return Err(e);
            }
        };

        if let Err(e) = write_project_files(&name, &dir, &request).await {
            let message = if e.is_rejected_input() {
                e.to_string()
            } else {
                format!("failed to write project files: {e}")
            };
            self.journal
                .record(OperationKind::Create, &name, OperationStatus::Error, message);
            return Err(e);
        }
        info!("Created project {} in {}", name, dir.display());

        let mut sink = LogSink::new(name.as_str(), stream);
        let mut message = "project created".to_string();
        if request.start {
            sink.note(format!("Starting project {name}..."));
            let started = match self
                .runtime
                .compose(&dir, DeployAction::Up.compose_args(), &mut sink)
                .await
            {
                Ok(started) => started,
                Err(e) => {
                    sink.note(format!("Start failed: {e}"));
                    false
                }
            };
            if started {
                sink.note("Project started");
            } else {
                sink.note("Project failed to start");
                message = "project created, but failed to start".to_string();
            }
        }

        Ok(self.finish(
            OperationKind::Create,
            &name,
            Ok(Verdict::success(message)),
            sink,
        ))
    }

    fn prepare_create(&self, name: &str, manifest_text: &str) -> Result<PathBuf> {
        if name.is_empty() {
            return Err(FleetError::validation("project name must not be empty"));
        }
        if !manifest::is_valid_name(name) {
            return Err(FleetError::validation(format!("invalid project name: {name}")));
        }
        let dir = self.root.project_dir(name);
        if dir.exists() {
            return Err(FleetError::validation(format!("project already exists: {name}")));
        }
        if manifest_text.trim().is_empty() {
            return Err(FleetError::validation("manifest content must not be empty"));
        }
        manifest::parse_for_create(manifest_text)?;
        Ok(dir)
    }

    /// 覆盖保存项目的 manifest 或 .env
    ///
    /// manifest 必须能解析，否则不写入
    pub async fn save_file(&self, name: &str, kind: FileKind, content: &str) -> Result<PathBuf> {
        let operation = kind.operation();
        match self.write_file(name, kind, content).await {
            Ok(path) => {
                self.journal.record(
                    operation,
                    name,
                    OperationStatus::Success,
                    format!("saved {}", kind.file_name()),
                );
                Ok(path)
            }
            Err(e) => {
                self.journal
                    .record(operation, name, OperationStatus::Error, e.to_string());
                Err(e)
            }
        }
    }

    async fn write_file(&self, name: &str, kind: FileKind, content: &str) -> Result<PathBuf> {
        if name.trim().is_empty() || content.trim().is_empty() {
            return Err(FleetError::validation("missing required parameters"));
        }
        let dir = self
            .project_dir(name)
            .ok_or_else(|| FleetError::ProjectNotFound(name.to_string()))?;
        // 已有 docker-compose.yaml 时覆盖原文件，不另写一份 .yml
        let path = match kind {
            FileKind::Compose => {
                manifest::parse(content)?;
                find_manifest(&dir).unwrap_or_else(|| dir.join(kind.file_name()))
            }
            FileKind::Env => dir.join(kind.file_name()),
        };
        tokio::fs::write(&path, content).await?;
        Ok(path)
    }
}

/// 读取项目 manifest 中引用的镜像
fn read_images(dir: &Path) -> Result<Vec<String>> {
    let path = find_manifest(dir)
        .ok_or_else(|| FleetError::custom(format!("no manifest found in {}", dir.display())))?;
    let text = std::fs::read_to_string(&path)?;
    Ok(manifest::parse(&text)?.images())
}

/// 创建项目目录并写入文件
///
/// 目录以非递归方式创建，已存在即失败，并发创建同名项目时只有一个能成功；
/// 写入文件失败时删除刚创建的目录。
async fn write_project_files(name: &str, dir: &Path, request: &CreateProject) -> Result<()> {
    if let Err(e) = tokio::fs::create_dir(dir).await {
        if e.kind() == std::io::ErrorKind::AlreadyExists {
            return Err(FleetError::validation(format!("project already exists: {name}")));
        }
        return Err(e.into());
    }

    if let Err(e) = fill_project_dir(dir, request).await {
        if let Err(cleanup) = tokio::fs::remove_dir_all(dir).await {
            warn!(
                "Failed to remove partially created project {}: {}",
                dir.display(),
                cleanup
            );
        }
        return Err(e);
    }
    Ok(())
}

async fn fill_project_dir(dir: &Path, request: &CreateProject) -> Result<()> {
    tokio::fs::write(
        dir.join(compose::DEFAULT_MANIFEST_FILE_NAME),
        &request.manifest,
    )
    .await?;
    if let Some(env) = request.env.as_deref().filter(|env| !env.trim().is_empty()) {
        tokio::fs::write(dir.join(compose::ENV_FILE_NAME), env).await?;
    }
    Ok(())
}
