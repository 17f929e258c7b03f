/// Docker Compose 项目相关常量
pub mod compose {
    /// 默认的 compose 项目根目录
    pub const DEFAULT_COMPOSE_ROOT: &str = "/mnt/nas/docker";

    /// 识别的 manifest 文件名，按优先级排列（先匹配者生效）
    pub const MANIFEST_FILE_NAMES: [&str; 2] = ["docker-compose.yml", "docker-compose.yaml"];

    /// 新建或保存时写入的 manifest 文件名
    pub const DEFAULT_MANIFEST_FILE_NAME: &str = "docker-compose.yml";

    /// 环境变量文件名
    pub const ENV_FILE_NAME: &str = ".env";

    /// 项目名和服务名的合法格式
    pub const NAME_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9_.-]*$";

    /// 运行中容器的状态值
    pub const RUNNING_STATE: &str = "running";
}

/// run 命令互转相关常量
pub mod convert {
    /// run 命令必须以此动词对开头
    pub const RUN_VERB: [&str; 2] = ["docker", "run"];

    /// 未通过 --name 指定时的默认服务名
    pub const DEFAULT_SERVICE_NAME: &str = "app";

    /// 不接受参数值的长参数
    pub const BOOLEAN_LONG_FLAGS: [&str; 6] =
        ["rm", "privileged", "init", "read-only", "interactive", "tty"];

    /// 可以组合出现、不接受参数值的短开关（如 -it、-dit）
    pub const BOOLEAN_SHORT_SWITCHES: &str = "dit";
}

/// 操作日志相关常量
pub mod journal {
    /// 操作历史最多保留的记录数
    pub const MAX_RECORDS: usize = 1000;

    /// 默认操作历史文件
    pub const DEFAULT_HISTORY_FILE: &str = "logs/operation_history.json";

    /// 时间戳显示格式
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
}

/// 日志相关常量
pub mod logging {
    /// 默认日志目录
    pub const DEFAULT_LOG_DIR: &str = "logs";

    /// 按天滚动的日志文件前缀
    pub const LOG_FILE_PREFIX: &str = "fleet.log";

    /// 覆盖日志输出文件的环境变量
    pub const LOG_FILE_ENV: &str = "FLEET_LOG_FILE";
}

/// 配置文件相关常量
pub mod config {
    /// 默认配置文件名
    pub const CONFIG_FILE_NAME: &str = "config.toml";

    /// 查找配置文件的顺序
    pub const CONFIG_SEARCH_ORDER: [&str; 3] = ["config.toml", "fleet.toml", ".fleet.toml"];
}
