use super::runtime::ContainerRuntime;
use super::types::ProjectStatus;
use crate::constants::compose;
use crate::error::{FleetError, Result};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, error};

/// 状态探测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub status: ProjectStatus,
    pub running: usize,
}

impl ProbeResult {
    pub const UNKNOWN: Self = Self {
        status: ProjectStatus::Unknown,
        running: 0,
    };

    pub const STOPPED: Self = Self {
        status: ProjectStatus::Stopped,
        running: 0,
    };
}

/// 解析 `compose ps --format json` 的输出
///
/// 不同版本的 compose 会输出 JSON 数组，或者多个首尾相接、没有分隔的 JSON 对象，
/// 这里按流的方式逐个读取，遇到数组时展开。
pub fn parse_ps_output(output: &str) -> Result<Vec<Value>> {
    let mut records = Vec::new();
    for value in serde_json::Deserializer::from_str(output).into_iter::<Value>() {
        match value? {
            Value::Array(items) => records.extend(items),
            Value::Object(map) => records.push(Value::Object(map)),
            other => {
                return Err(FleetError::parse(format!(
                    "unexpected container record: {other}"
                )));
            }
        }
    }
    Ok(records)
}

/// 根据容器记录统计运行状态
pub fn summarize(records: &[Value]) -> ProbeResult {
    let running = records
        .iter()
        .filter(|record| record.get("State").and_then(Value::as_str) == Some(compose::RUNNING_STATE))
        .count();

    ProbeResult {
        status: if running > 0 {
            ProjectStatus::Running
        } else {
            ProjectStatus::Stopped
        },
        running,
    }
}

/// 探测项目目录的运行状态
///
/// 不会向调用方返回错误：查询命令退出码非零或没有输出视为 `stopped`，
/// 命令无法执行或输出无法解析时为 `unknown`。
pub async fn probe<R: ContainerRuntime>(runtime: &R, dir: &Path) -> ProbeResult {
    let output = match runtime.compose_ps(dir).await {
        Ok(output) => output,
        Err(e) => {
            error!("Error checking project status in {}: {}", dir.display(), e);
            return ProbeResult::UNKNOWN;
        }
    };

    if !output.success {
        debug!(
            "Container query exited with an error in {}: {}",
            dir.display(),
            output.stderr.trim()
        );
        return ProbeResult::STOPPED;
    }

    if output.stdout.trim().is_empty() {
        return ProbeResult::STOPPED;
    }

    match parse_ps_output(&output.stdout) {
        Ok(records) => {
            let result = summarize(&records);
            debug!(
                "{}: {} of {} containers running",
                dir.display(),
                result.running,
                records.len()
            );
            result
        }
        Err(e) => {
            error!("Malformed container status output in {}: {}", dir.display(), e);
            ProbeResult::UNKNOWN
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::fake::FakeRuntime;
    use crate::container::types::CommandOutput;
    use std::path::PathBuf;

    fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            success: true,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    #[test]
    fn test_parse_concatenated_records() {
        let output = r#"{"Name":"web-1","State":"running"}
{"Name":"db-1","State":"exited"}{"Name":"cache-1","State":"running"}"#;
        let records = parse_ps_output(output).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(
            summarize(&records),
            ProbeResult {
                status: ProjectStatus::Running,
                running: 2
            }
        );
    }

    #[test]
    fn test_parse_array_output() {
        let output = r#"[{"Name":"web-1","State":"exited"},{"Name":"db-1","State":"created"}]"#;
        let records = parse_ps_output(output).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(summarize(&records), ProbeResult::STOPPED);
    }

    #[test]
    fn test_parse_malformed_output() {
        assert!(parse_ps_output(r#"{"Name":"web-1","State":"#).is_err());
        assert!(parse_ps_output("42").is_err());
        assert!(parse_ps_output("").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_probe_degrades_on_failure() {
        let dir = PathBuf::from("/srv/compose/web");
        let runtime = FakeRuntime::default()
            .with_ps("web", ok("   \n"))
            .with_ps(
                "api",
                CommandOutput {
                    success: false,
                    stdout: String::new(),
                    stderr: "no configuration file provided".to_string(),
                },
            )
            .with_ps("db", ok("not json"))
            .with_ps("cache", ok(r#"{"State":"running"}"#));

        assert_eq!(probe(&runtime, &dir).await, ProbeResult::STOPPED);
        // 查询命令执行了但退出码非零：没有可用的容器
        assert_eq!(
            probe(&runtime, Path::new("/srv/compose/api")).await,
            ProbeResult::STOPPED
        );
        assert_eq!(
            probe(&runtime, Path::new("/srv/compose/db")).await,
            ProbeResult::UNKNOWN
        );
        assert_eq!(
            probe(&runtime, Path::new("/srv/compose/cache")).await.running,
            1
        );
        // 未配置输出的目录模拟命令无法启动
        assert_eq!(
            probe(&runtime, Path::new("/srv/compose/missing")).await,
            ProbeResult::UNKNOWN
        );
    }
}
