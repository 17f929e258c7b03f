use fleet_core::constants::logging;
use fleet_core::error::Result;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;

/// # Fleet CLI 日志系统使用说明
///
/// ## 基本原则
/// 1. **库代码只使用 `tracing` 宏**：`info!()`, `warn!()`, `error!()`, `debug!()`
/// 2. **应用入口控制日志配置**：在 `main.rs` 中调用 `setup_logging()`
/// 3. **操作记录同时写入运行日志**：每条操作历史都会以
///    `<操作> - <项目> - <消息>` 的格式出现在日志中
///
/// ## 日志配置选项
///
/// ### 命令行参数
/// - `-v, --verbose`：启用详细日志模式（DEBUG 级别）
///
/// ### 配置文件
/// - `[logging] dir`：按天滚动的日志目录（`fleet.log.YYYY-MM-DD`），留空则不写文件
///
/// ### 环境变量
/// - `RUST_LOG`：标准的 Rust 日志级别控制（如 `debug`, `info`, `warn`, `error`）
/// - `FLEET_LOG_FILE`：日志文件路径，设置后日志只追加到该文件，不输出到终端
///
/// ## 使用示例
///
/// ```bash
/// # 详细日志输出到终端
/// fleet-cli -v list
///
/// # 日志输出到文件
/// FLEET_LOG_FILE=fleet.log fleet-cli cleanup web
///
/// # 使用 RUST_LOG 控制特定模块的日志级别
/// RUST_LOG=fleet_core::lifecycle=debug fleet-cli up web
/// ```
///
/// 返回的 guard 必须在程序退出前一直持有，否则文件日志可能丢失
pub fn setup_logging(verbose: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    // 根据verbose参数和环境变量确定日志级别
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_writer, guard, to_terminal) = match std::env::var(logging::LOG_FILE_ENV) {
        Ok(log_file) => {
            // 输出到指定文件
            let path = PathBuf::from(log_file);
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path
                .file_name()
                .map(|name| name.to_os_string())
                .unwrap_or_else(|| logging::LOG_FILE_PREFIX.into());
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
            (Some(writer), Some(guard), false)
        }
        Err(_) => match log_dir {
            Some(dir) => match std::fs::create_dir_all(dir) {
                Ok(()) => {
                    let (writer, guard) = tracing_appender::non_blocking(
                        tracing_appender::rolling::daily(dir, logging::LOG_FILE_PREFIX),
                    );
                    (Some(writer), Some(guard), true)
                }
                Err(e) => {
                    eprintln!("cannot create log directory {}: {}", dir.display(), e);
                    (None, None, true)
                }
            },
            None => (None, None, true),
        },
    };

    // 终端输出 - 使用简洁格式，用户友好
    let terminal = to_terminal.then(|| {
        fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .without_time()
            .compact()
    });

    // 文件输出 - 使用详细格式便于审计
    let file = file_writer.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(terminal)
        .with(file)
        .init();

    guard
}

/// 读取文件内容；未指定路径或路径为 `-` 时读取标准输入
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            Ok(content)
        }
    }
}
