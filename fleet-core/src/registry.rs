use crate::config::ComposeRoot;
use crate::constants::compose;
use crate::container::{ContainerRuntime, ProbeResult, ProjectStatus, probe};
use crate::error::{FleetError, Result};
use crate::journal::{OperationJournal, OperationKind, OperationStatus};
use crate::manifest;
use chrono::{DateTime, Local};
use futures::future::join_all;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// 一个 compose 项目
///
/// 每次扫描都重新生成，不在请求之间缓存
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub name: String,
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub manifest_file: PathBuf,
    /// manifest 原文；读取或解析失败时为 `Error: ...`
    pub manifest_content: String,
    pub env_file: Option<PathBuf>,
    pub env_content: Option<String>,
    pub status: ProjectStatus,
    /// manifest 中声明的服务数，解析失败时为 0
    pub service_count: usize,
    pub running_containers: usize,
    pub created_time: Option<DateTime<Local>>,
}

/// 状态汇总中的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub name: String,
    pub status: ProjectStatus,
    pub running_containers: usize,
    pub service_count: usize,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            status: project.status,
            running_containers: project.running_containers,
            service_count: project.service_count,
        }
    }
}

/// 一个项目的文件内容
#[derive(Debug, Clone, Serialize)]
pub struct ProjectFiles {
    pub name: String,
    pub manifest_file: PathBuf,
    pub manifest_content: String,
    pub env_content: Option<String>,
}

/// 按优先级查找项目目录中的 manifest 文件
pub fn find_manifest(dir: &Path) -> Option<PathBuf> {
    compose::MANIFEST_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

fn find_env_file(dir: &Path) -> Option<PathBuf> {
    Some(dir.join(compose::ENV_FILE_NAME)).filter(|path| path.is_file())
}

fn embedded_error(e: impl std::fmt::Display) -> String {
    format!("Error: {e}")
}

/// 读取 manifest 并统计服务数，失败时把错误嵌入内容字段
fn read_manifest(path: &Path) -> (String, usize) {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!("Error reading compose file {}: {}", path.display(), e);
            return (embedded_error(e), 0);
        }
    };
    match manifest::parse(&content) {
        Ok(manifest) => (content, manifest.service_count()),
        Err(e) => {
            error!("Error parsing compose file {}: {}", path.display(), e);
            (embedded_error(e), 0)
        }
    }
}

fn read_env(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| {
        error!("Error reading .env file {}: {}", path.display(), e);
        embedded_error(e)
    })
}

/// 项目注册表：扫描根目录下的项目并查询运行状态
pub struct ProjectRegistry<R> {
    root: ComposeRoot,
    runtime: Arc<R>,
    journal: Arc<OperationJournal>,
}

impl<R: ContainerRuntime> ProjectRegistry<R> {
    pub fn new(root: ComposeRoot, runtime: Arc<R>, journal: Arc<OperationJournal>) -> Self {
        Self {
            root,
            runtime,
            journal,
        }
    }

    pub fn root(&self) -> &ComposeRoot {
        &self.root
    }

    /// 扫描根目录，返回按名称排序的项目列表
    ///
    /// 单个项目的读取/解析错误嵌入到对应字段中，不影响其他项目；
    /// 根目录不可读时整体失败一次。
    pub async fn scan(&self) -> Result<Vec<Project>> {
        let root = self.root.get();
        info!("Scanning compose projects in {}", root.display());

        let dirs = match list_project_dirs(&root) {
            Ok(dirs) => dirs,
            Err(e) => {
                self.journal.record(
                    OperationKind::ScanProjects,
                    "all",
                    OperationStatus::Error,
                    format!("Error scanning compose projects: {e}"),
                );
                return Err(e);
            }
        };

        let mut projects: Vec<Project> = dirs
            .into_iter()
            .filter_map(|dir| self.load_project(&root, dir))
            .collect();

        let probes = join_all(
            projects
                .iter()
                .map(|project| probe(self.runtime.as_ref(), &project.path)),
        )
        .await;
        for (project, result) in projects.iter_mut().zip(probes) {
            project.status = result.status;
            project.running_containers = result.running;
        }

        projects.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("Found {} compose projects", projects.len());
        Ok(projects)
    }

    /// 读取一个项目目录；没有 manifest 的目录不是项目
    fn load_project(&self, root: &Path, dir: PathBuf) -> Option<Project> {
        let manifest_file = find_manifest(&dir)?;
        let name = dir.file_name()?.to_string_lossy().into_owned();
        let (manifest_content, service_count) = read_manifest(&manifest_file);
        let env_file = find_env_file(&dir);
        let env_content = env_file.as_deref().map(read_env);

        let created_time = std::fs::metadata(&dir)
            .and_then(|meta| meta.created().or_else(|_| meta.modified()))
            .ok()
            .map(DateTime::<Local>::from);
        let relative_path = dir
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(&name));

        Some(Project {
            name,
            path: dir,
            relative_path,
            manifest_file,
            manifest_content,
            env_file,
            env_content,
            status: ProjectStatus::Unknown,
            service_count,
            running_containers: 0,
            created_time,
        })
    }

    /// 所有项目的状态汇总
    pub async fn status(&self) -> Result<Vec<ProjectSummary>> {
        let projects = self.scan().await?;
        Ok(projects.iter().map(ProjectSummary::from).collect())
    }

    /// 探测单个项目的运行状态
    pub async fn probe(&self, name: &str) -> Result<ProbeResult> {
        let dir = self.existing_project_dir(name)?;
        Ok(probe(self.runtime.as_ref(), &dir).await)
    }

    /// 读取单个项目的 manifest 与 .env 原文
    pub fn show(&self, name: &str) -> Result<ProjectFiles> {
        let dir = self.existing_project_dir(name)?;
        let manifest_file = find_manifest(&dir)
            .ok_or_else(|| FleetError::ProjectNotFound(name.to_string()))?;
        let manifest_content = std::fs::read_to_string(&manifest_file)?;
        let env_content = match find_env_file(&dir) {
            Some(path) => Some(std::fs::read_to_string(path)?),
            None => None,
        };

        Ok(ProjectFiles {
            name: name.to_string(),
            manifest_file,
            manifest_content,
            env_content,
        })
    }

    fn existing_project_dir(&self, name: &str) -> Result<PathBuf> {
        if !manifest::is_valid_name(name) {
            return Err(FleetError::validation(format!("invalid project name: {name}")));
        }
        let dir = self.root.project_dir(name);
        if !dir.is_dir() {
            return Err(FleetError::ProjectNotFound(name.to_string()));
        }
        Ok(dir)
    }
}

/// 根目录下的第一层子目录
fn list_project_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(FleetError::Scan {
            path: root.display().to_string(),
            reason: "not a directory".to_string(),
        });
    }

    // 指向项目目录的符号链接同样视为项目
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1).follow_links(true) {
        match entry {
            Ok(entry) if entry.file_type().is_dir() => dirs.push(entry.into_path()),
            Ok(_) => {}
            // 根目录本身不可读
            Err(e) if e.depth() == 0 => {
                return Err(FleetError::Scan {
                    path: root.display().to_string(),
                    reason: e.to_string(),
                });
            }
            Err(e) => warn!("Skipping unreadable entry under {}: {}", root.display(), e),
        }
    }
    Ok(dirs)
}
