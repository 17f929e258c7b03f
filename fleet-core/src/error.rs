use thiserror::Error;

pub type Result<T> = std::result::Result<T, FleetError>;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// 名称格式、manifest 结构等校验失败，不会写入任何文件
    #[error("{0}")]
    Validation(String),

    /// manifest 或 run 命令文本无法解析
    #[error("{0}")]
    Parse(String),

    /// 容器运行时命令执行失败或不可用
    #[error("docker command failed: {0}")]
    Docker(String),

    #[error("project does not exist: {0}")]
    ProjectNotFound(String),

    #[error("failed to scan compose root {path}: {reason}")]
    Scan { path: String, reason: String },

    #[error("{0}")]
    Custom(String),
}

impl FleetError {
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    pub fn docker(msg: impl Into<String>) -> Self {
        Self::Docker(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// 校验类和解析类错误发生在任何副作用之前
    pub fn is_rejected_input(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Parse(_))
    }
}
