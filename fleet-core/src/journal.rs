use crate::constants::journal;
use crate::error::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

/// 操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    DeployUp,
    DeployDown,
    Cleanup,
    Delete,
    Create,
    SaveCompose,
    SaveEnv,
    ScanProjects,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::DeployUp => "deploy_up",
            OperationKind::DeployDown => "deploy_down",
            OperationKind::Cleanup => "cleanup",
            OperationKind::Delete => "delete",
            OperationKind::Create => "create",
            OperationKind::SaveCompose => "save_compose",
            OperationKind::SaveEnv => "save_env",
            OperationKind::ScanProjects => "scan_projects",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// 操作结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Success,
    Error,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Success => "success",
            OperationStatus::Error => "error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OperationStatus::Success)
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// 一条操作记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub timestamp: DateTime<Local>,
    pub operation: OperationKind,
    pub project: String,
    pub status: OperationStatus,
    pub message: String,
}

impl OperationRecord {
    pub fn new(
        operation: OperationKind,
        project: impl Into<String>,
        status: OperationStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            operation,
            project: project.into(),
            status,
            message: message.into(),
        }
    }

    /// 显示用的时间戳
    pub fn formatted_time(&self) -> String {
        self.timestamp.format(journal::TIMESTAMP_FORMAT).to_string()
    }
}

/// 操作日志
///
/// 只追加、容量有限，超出容量时按插入顺序淘汰最旧的记录。
/// 追加、淘汰和落盘在同一把锁内完成。
#[derive(Debug)]
pub struct OperationJournal {
    capacity: usize,
    path: Option<PathBuf>,
    records: Mutex<VecDeque<OperationRecord>>,
}

impl OperationJournal {
    /// 只保存在内存中的操作日志
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            path: None,
            records: Mutex::new(VecDeque::new()),
        }
    }

    /// 打开持久化的操作日志
    ///
    /// 文件不存在或内容损坏时从空日志开始，不返回错误
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize) -> Self {
        let path = path.as_ref().to_path_buf();
        let capacity = capacity.max(1);

        let mut records = match load_records(&path) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "Failed to load operation history from {}: {}",
                    path.display(),
                    e
                );
                VecDeque::new()
            }
        };
        while records.len() > capacity {
            records.pop_front();
        }

        Self {
            capacity,
            path: Some(path),
            records: Mutex::new(records),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<OperationRecord>> {
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// 追加一条记录，同时写入运行日志
    pub fn append(&self, record: OperationRecord) {
        let line = format!(
            "{} - {} - {}",
            record.operation, record.project, record.message
        );
        if record.status.is_success() {
            info!("{}", line);
        } else {
            error!("{}", line);
        }

        let mut records = self.lock();
        records.push_back(record);
        while records.len() > self.capacity {
            records.pop_front();
        }

        if let Some(path) = &self.path {
            if let Err(e) = persist_records(path, &records) {
                error!(
                    "Failed to save operation history to {}: {}",
                    path.display(),
                    e
                );
            }
        }
    }

    /// 构造并追加一条记录
    pub fn record(
        &self,
        operation: OperationKind,
        project: &str,
        status: OperationStatus,
        message: impl Into<String>,
    ) -> OperationRecord {
        let record = OperationRecord::new(operation, project, status, message);
        self.append(record.clone());
        record
    }

    /// 全部记录，按插入顺序
    pub fn list(&self) -> Vec<OperationRecord> {
        self.lock().iter().cloned().collect()
    }

    /// 最近的 `limit` 条记录，按插入顺序
    pub fn recent(&self, limit: usize) -> Vec<OperationRecord> {
        let records = self.lock();
        let skip = records.len().saturating_sub(limit);
        records.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn load_records(path: &Path) -> Result<VecDeque<OperationRecord>> {
    if !path.exists() {
        return Ok(VecDeque::new());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(VecDeque::new());
    }
    Ok(serde_json::from_str(&content)?)
}

/// 先写同目录下的临时文件，再原子替换
fn persist_records(path: &Path, records: &VecDeque<OperationRecord>) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut file = tempfile::NamedTempFile::new_in(&dir)?;
    serde_json::to_writer_pretty(&mut file, records)?;
    file.write_all(b"\n")?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
