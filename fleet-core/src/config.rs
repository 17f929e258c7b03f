use crate::constants::{compose, config, journal, logging};
use crate::error::{FleetError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// 应用配置结构
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    pub compose: ComposeConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

/// compose 项目相关配置
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ComposeConfig {
    pub root: String,
}

/// 操作历史相关配置
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct JournalConfig {
    pub history_file: String,
    pub max_records: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            history_file: journal::DEFAULT_HISTORY_FILE.to_string(),
            max_records: journal::MAX_RECORDS,
        }
    }
}

/// 日志相关配置
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: logging::DEFAULT_LOG_DIR.to_string(),
        }
    }
}

/// cleanup 操作相关配置
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct CleanupConfig {
    pub down_failure: DownFailurePolicy,
}

/// cleanup 第一步 "compose down" 失败时的处理策略
///
/// 两种策略下后续的镜像清理都会继续执行，区别只在最终结果
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DownFailurePolicy {
    /// 最终结果记为 error
    #[default]
    Fatal,
    /// 只记录警告，最终结果仍可为 success
    Warn,
}

impl DownFailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownFailurePolicy::Fatal => "fatal",
            DownFailurePolicy::Warn => "warn",
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            compose: ComposeConfig {
                root: compose::DEFAULT_COMPOSE_ROOT.to_string(),
            },
            journal: JournalConfig::default(),
            logging: LoggingConfig::default(),
            cleanup: CleanupConfig::default(),
        }
    }
}

impl AppConfig {
    /// 智能查找并加载配置文件
    /// 按优先级查找：config.toml -> fleet.toml -> .fleet.toml
    pub fn find_and_load_config() -> Result<Self> {
        for config_file in &config::CONFIG_SEARCH_ORDER {
            if Path::new(config_file).exists() {
                tracing::info!("Using config file: {}", config_file);
                return Self::load_from_file(config_file);
            }
        }

        // 没找到配置文件时写出默认配置
        tracing::warn!(
            "No config file found, writing defaults to {}",
            config::CONFIG_FILE_NAME
        );
        let default_config = Self::default();
        default_config.save_to_file(config::CONFIG_FILE_NAME)?;
        Ok(default_config)
    }

    /// 加载指定配置文件；文件不存在时退回到查找流程
    pub fn load_or_find<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            Self::find_and_load_config()
        }
    }

    /// 从指定文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;

        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml_with_comments();
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&path, content)?;
        Ok(())
    }

    /// 生成带注释的TOML配置
    fn to_toml_with_comments(&self) -> String {
        const TEMPLATE: &str = include_str!("../templates/config.toml.template");

        TEMPLATE
            .replace("{compose_root}", &escape_toml(&self.compose.root))
            .replace("{history_file}", &escape_toml(&self.journal.history_file))
            .replace("{max_records}", &self.journal.max_records.to_string())
            .replace("{log_dir}", &escape_toml(&self.logging.dir))
            .replace("{down_failure}", self.cleanup.down_failure.as_str())
    }

    /// 获取日志目录，未配置时返回 None
    pub fn log_dir(&self) -> Option<PathBuf> {
        let dir = self.logging.dir.trim();
        if dir.is_empty() {
            None
        } else {
            Some(PathBuf::from(dir))
        }
    }

    /// 获取操作历史文件路径
    pub fn history_file(&self) -> PathBuf {
        PathBuf::from(&self.journal.history_file)
    }
}

fn escape_toml(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// 共享的 compose 根目录
///
/// 构造时注入 [`crate::registry::ProjectRegistry`] 与
/// [`crate::lifecycle::LifecycleExecutor`]，修改只能经由 [`ComposeRoot::reconfigure`]。
#[derive(Debug, Clone)]
pub struct ComposeRoot {
    path: Arc<RwLock<PathBuf>>,
}

impl ComposeRoot {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: Arc::new(RwLock::new(path.into())),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.compose.root)
    }

    /// 当前根目录
    pub fn get(&self) -> PathBuf {
        match self.path.read() {
            Ok(path) => path.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// 项目目录路径
    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.get().join(project)
    }

    /// 校验并切换根目录
    pub fn reconfigure<P: AsRef<Path>>(&self, new_path: P) -> Result<PathBuf> {
        let new_path = new_path.as_ref();
        if new_path.as_os_str().is_empty() || new_path.to_string_lossy().trim().is_empty() {
            return Err(FleetError::validation("root path must not be empty"));
        }
        if !new_path.exists() {
            return Err(FleetError::validation(format!(
                "root path does not exist: {}",
                new_path.display()
            )));
        }
        if !new_path.is_dir() {
            return Err(FleetError::validation(format!(
                "root path is not a directory: {}",
                new_path.display()
            )));
        }

        let mut guard = match self.path.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = new_path.to_path_buf();
        tracing::info!("Compose root switched to {}", new_path.display());
        Ok(new_path.to_path_buf())
    }
}
