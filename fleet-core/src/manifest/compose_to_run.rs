use super::shell;
use super::types::{Manifest, Service};
use crate::error::{FleetError, Result};
use serde_yaml::Value;
use std::fmt;
use tracing::debug;

/// 已按固定顺序单独处理、不再作为通用参数输出的指令
const HANDLED_KEYS: [&str; 16] = [
    "image",
    "command",
    "ports",
    "volumes",
    "environment",
    "network_mode",
    "networks",
    "restart",
    "depends_on",
    "working_dir",
    "user",
    "hostname",
    "dns",
    "privileged",
    "version",
    "services",
];

/// 由一个服务生成的 run 命令
#[derive(Debug, Clone, PartialEq)]
pub struct RunCommand {
    pub service: String,
    /// 完整参数列表（含 `docker run`），未加引号
    pub args: Vec<String>,
    /// 没有单命令等价形式的提示，例如服务依赖
    pub notes: Vec<String>,
}

impl RunCommand {
    fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
            args: ["docker", "run", "-d", "--name", service]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            notes: Vec::new(),
        }
    }

    fn flag(&mut self, flag: &str, value: impl Into<String>) {
        self.args.push(flag.to_string());
        self.args.push(value.into());
    }

    fn switch(&mut self, flag: impl Into<String>) {
        self.args.push(flag.into());
    }
}

/// 命令占一行，提示以注释行的形式跟在命令之后，保证命令本身可以直接执行
impl fmt::Display for RunCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell::join(&self.args))?;
        for note in &self.notes {
            write!(f, "\n# {note}")?;
        }
        Ok(())
    }
}

fn scalar_arg(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_arg(&tagged.value),
        _ => None,
    }
}

fn field(map: &serde_yaml::Mapping, key: &str) -> Option<String> {
    map.get(key).and_then(scalar_arg)
}

/// 结构化端口 `{target, published}` 转为 `-p` 参数
fn port_arg(map: &serde_yaml::Mapping) -> Option<String> {
    let target = field(map, "target")?;
    let mut arg = match (field(map, "host_ip"), field(map, "published")) {
        (Some(ip), Some(published)) => format!("{ip}:{published}:{target}"),
        (None, Some(published)) => format!("{published}:{target}"),
        _ => target,
    };
    if let Some(protocol) = field(map, "protocol").filter(|p| p != "tcp") {
        arg.push('/');
        arg.push_str(&protocol);
    }
    Some(arg)
}

/// 结构化卷 `{source, target}` 转为 `-v` 参数
fn volume_arg(map: &serde_yaml::Mapping) -> Option<String> {
    let target = field(map, "target")?;
    let mut arg = match field(map, "source") {
        Some(source) => format!("{source}:{target}"),
        None => target,
    };
    if matches!(map.get("read_only"), Some(Value::Bool(true))) {
        arg.push_str(":ro");
    }
    Some(arg)
}

fn list_items(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Sequence(items)) => items,
        _ => &[],
    }
}

fn build_command(service: &Service) -> Result<RunCommand> {
    let mut cmd = RunCommand::new(&service.name);

    for port in list_items(service.get("ports")) {
        let arg = match port {
            Value::Mapping(map) => port_arg(map),
            other => scalar_arg(other),
        };
        if let Some(arg) = arg {
            cmd.flag("-p", arg);
        }
    }

    for volume in list_items(service.get("volumes")) {
        let arg = match volume {
            Value::Mapping(map) => volume_arg(map),
            other => scalar_arg(other),
        };
        if let Some(arg) = arg {
            cmd.flag("-v", arg);
        }
    }

    match service.get("environment") {
        Some(Value::Sequence(items)) => {
            for item in items.iter().filter_map(scalar_arg) {
                cmd.flag("-e", item);
            }
        }
        Some(Value::Mapping(map)) => {
            for (key, value) in map {
                let Some(key) = scalar_arg(key) else { continue };
                match scalar_arg(value) {
                    Some(value) => cmd.flag("-e", format!("{key}={value}")),
                    None => cmd.flag("-e", key),
                }
            }
        }
        _ => {}
    }

    if let Some(mode) = service.get("network_mode").and_then(scalar_arg) {
        cmd.flag("--network", mode);
    } else {
        let first_network = match service.get("networks") {
            Some(Value::Sequence(items)) => items.first().and_then(scalar_arg),
            Some(Value::Mapping(map)) => map.keys().next().and_then(scalar_arg),
            _ => None,
        };
        if let Some(network) = first_network {
            cmd.flag("--network", network);
        }
    }

    if let Some(restart) = service.get("restart").and_then(scalar_arg) {
        cmd.flag("--restart", restart);
    }

    let dependencies: Vec<String> = match service.get("depends_on") {
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar_arg).collect(),
        Some(Value::Mapping(map)) => map.keys().filter_map(scalar_arg).collect(),
        Some(other) => scalar_arg(other).into_iter().collect(),
        None => Vec::new(),
    };
    if !dependencies.is_empty() {
        cmd.notes.push(format!(
            "{} depends on: {}",
            service.name,
            dependencies.join(", ")
        ));
    }

    for (key, flag) in [
        ("working_dir", "--workdir"),
        ("user", "--user"),
        ("hostname", "--hostname"),
    ] {
        if let Some(value) = service.get(key).and_then(scalar_arg) {
            cmd.flag(flag, value);
        }
    }

    match service.get("dns") {
        Some(Value::Sequence(items)) => {
            for server in items.iter().filter_map(scalar_arg) {
                cmd.flag("--dns", server);
            }
        }
        Some(other) => {
            if let Some(server) = scalar_arg(other) {
                cmd.flag("--dns", server);
            }
        }
        None => {}
    }

    if matches!(service.get("privileged"), Some(Value::Bool(true))) {
        cmd.switch("--privileged");
    }

    // 其余未识别的标量/布尔指令按原始顺序输出
    for (key, value) in &service.directives {
        let Some(key) = key.as_str() else { continue };
        if HANDLED_KEYS.contains(&key) {
            continue;
        }
        let flag = format!("--{}", key.replace('_', "-"));
        match value {
            Value::Bool(true) => cmd.switch(flag),
            Value::Bool(false) => {}
            Value::String(_) | Value::Number(_) => {
                if let Some(value) = scalar_arg(value) {
                    cmd.flag(&flag, value);
                }
            }
            _ => debug!(
                "Skipping non-scalar directive {} of service {}",
                key, service.name
            ),
        }
    }

    let image = service.image().ok_or_else(|| {
        FleetError::validation(format!("service {} has no image", service.name))
    })?;
    cmd.switch(image);

    match service.get("command") {
        Some(Value::Sequence(items)) => cmd.args.extend(items.iter().filter_map(scalar_arg)),
        Some(Value::String(line)) => match shell::split(line) {
            Ok(words) => cmd.args.extend(words),
            Err(_) => cmd.args.push(line.clone()),
        },
        _ => {}
    }

    Ok(cmd)
}

/// 为 manifest 中的每个服务生成一条 run 命令
///
/// 任一服务缺少镜像时整个转换失败；没有服务时返回错误而不是空结果。
pub fn manifest_to_run(manifest: &Manifest) -> Result<Vec<RunCommand>> {
    if manifest.services.is_empty() {
        return Err(FleetError::validation(
            "nothing to convert: manifest defines no services",
        ));
    }

    manifest.services.iter().map(build_command).collect()
}
