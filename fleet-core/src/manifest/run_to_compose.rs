use super::shell;
use super::types::{Manifest, Service, is_valid_name};
use crate::constants::convert;
use crate::error::{FleetError, Result};
use serde_yaml::Value;
use tracing::{debug, warn};

/// 参数规则对应的处理方式
#[derive(Debug, Clone, Copy, PartialEq)]
enum FlagAction {
    /// 后台运行开关；声明式输出默认就是后台运行，直接忽略
    Detach,
    /// 以参数值重命名默认服务
    Rename,
    /// 追加到列表指令（可重复出现）
    Append(&'static str),
    /// 设置标量指令（后出现者生效）
    Set(&'static str),
}

struct FlagRule {
    flags: &'static [&'static str],
    action: FlagAction,
}

/// 按优先级排列的参数规则表，未命中的参数交给通用规则处理
const RULES: &[FlagRule] = &[
    FlagRule {
        flags: &["-d", "--detach"],
        action: FlagAction::Detach,
    },
    FlagRule {
        flags: &["--name"],
        action: FlagAction::Rename,
    },
    FlagRule {
        flags: &["-p", "--publish"],
        action: FlagAction::Append("ports"),
    },
    FlagRule {
        flags: &["-v", "--volume"],
        action: FlagAction::Append("volumes"),
    },
    FlagRule {
        flags: &["-e", "--env"],
        action: FlagAction::Append("environment"),
    },
    FlagRule {
        flags: &["--network", "--net"],
        action: FlagAction::Set("network_mode"),
    },
    FlagRule {
        flags: &["--restart"],
        action: FlagAction::Set("restart"),
    },
];

fn lookup_rule(flag: &str) -> Option<FlagAction> {
    RULES
        .iter()
        .find(|rule| rule.flags.contains(&flag))
        .map(|rule| rule.action)
}

fn is_flag(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}

/// 拆出内联的参数值：`--name=web`、`-p8080:80`
fn split_inline(token: &str) -> (&str, Option<&str>) {
    if let Some(long) = token.strip_prefix("--") {
        if let Some((name, value)) = long.split_once('=') {
            return (&token[..name.len() + 2], Some(value));
        }
        return (token, None);
    }

    if token.len() > 2 && token.is_char_boundary(2) {
        let (flag, rest) = token.split_at(2);
        if matches!(
            lookup_rule(flag),
            Some(FlagAction::Append(_) | FlagAction::Set(_) | FlagAction::Rename)
        ) {
            return (flag, Some(rest));
        }
    }
    (token, None)
}

/// 判断短参数是否只由不带值的开关组成（如 -it、-dit）
fn is_switch_cluster(token: &str) -> bool {
    token
        .strip_prefix('-')
        .is_some_and(|body| {
            !body.is_empty() && body.chars().all(|c| convert::BOOLEAN_SHORT_SWITCHES.contains(c))
        })
}

struct RunParser<'a> {
    tokens: &'a [String],
    pos: usize,
    service: Service,
    image_seen: bool,
}

impl<'a> RunParser<'a> {
    fn new(tokens: &'a [String]) -> Self {
        Self {
            tokens,
            pos: 0,
            service: Service::new(convert::DEFAULT_SERVICE_NAME),
            image_seen: false,
        }
    }

    fn next_token(&mut self) -> Option<&'a str> {
        let token = self.tokens.get(self.pos).map(String::as_str);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// 取参数值：优先使用内联值，否则消费下一个词
    fn take_value(&mut self, flag: &str, inline: Option<&str>) -> Result<String> {
        if let Some(value) = inline {
            return Ok(value.to_string());
        }
        self.next_token()
            .map(str::to_string)
            .ok_or_else(|| FleetError::parse(format!("flag {flag} requires a value")))
    }

    fn parse(mut self) -> Result<Service> {
        while let Some(token) = self.next_token() {
            if self.image_seen {
                // 镜像之后的所有词都是容器命令
                self.service.push("command", token);
                continue;
            }

            if !is_flag(token) {
                self.service.set("image", Value::String(token.to_string()));
                self.image_seen = true;
                continue;
            }

            let (flag, inline) = split_inline(token);
            match lookup_rule(flag) {
                Some(FlagAction::Detach) => {}
                Some(FlagAction::Rename) => {
                    let name = self.take_value(flag, inline)?;
                    if !is_valid_name(&name) {
                        return Err(FleetError::parse(format!(
                            "invalid container name: {name:?}"
                        )));
                    }
                    self.service.name = name;
                }
                Some(FlagAction::Append(key)) => {
                    let value = self.take_value(flag, inline)?;
                    self.service.push(key, value);
                }
                Some(FlagAction::Set(key)) => {
                    let value = self.take_value(flag, inline)?;
                    self.service.set(key, Value::String(value));
                }
                None if flag.starts_with("--") => self.generic_long_flag(flag, inline),
                None if is_switch_cluster(flag) => {
                    debug!("Ignoring switch cluster {} in run command", flag);
                }
                None => {
                    // 无法表示的短参数：连同其后的参数值一起丢弃
                    let dropped = self.next_token();
                    warn!(
                        "Dropping unsupported short flag {} {}",
                        flag,
                        dropped.unwrap_or_default()
                    );
                }
            }
        }

        if !self.image_seen {
            return Err(FleetError::parse("run command has no image reference"));
        }
        Ok(self.service)
    }

    /// 其余长参数映射为同名指令（连字符换成下划线）
    fn generic_long_flag(&mut self, flag: &str, inline: Option<&str>) {
        let name = &flag[2..];
        let key = name.replace('-', "_");

        let value = if let Some(value) = inline {
            match value {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                other => Value::String(other.to_string()),
            }
        } else if convert::BOOLEAN_LONG_FLAGS.contains(&name) {
            Value::Bool(true)
        } else {
            match self.tokens.get(self.pos) {
                Some(next) if !is_flag(next) => {
                    self.pos += 1;
                    Value::String(next.clone())
                }
                _ => Value::Bool(true),
            }
        };
        self.service.set(&key, value);
    }
}

/// 把 `docker run ...` 命令转换为只含一个服务的 manifest
pub fn run_to_manifest(command: &str) -> Result<Manifest> {
    let command = command.trim();
    if command.is_empty() {
        return Err(FleetError::parse("command must not be empty"));
    }

    let tokens = shell::split(command)
        .map_err(|e| FleetError::parse(format!("failed to parse command: {e}")))?;
    if tokens.len() < 2 || tokens[..2] != convert::RUN_VERB {
        return Err(FleetError::parse("not a valid docker run command"));
    }

    let service = RunParser::new(&tokens[2..]).parse()?;
    debug!(
        "Converted run command into service {} with {} directives",
        service.name,
        service.directives.len()
    );
    Ok(Manifest::single(service))
}
