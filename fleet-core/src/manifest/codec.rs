use super::types::{Manifest, Service};
use crate::error::{FleetError, Result};
use serde_yaml::{Mapping, Value};

const SERVICES_KEY: &str = "services";
const INDENT: usize = 2;

/// 解析 manifest 文本
///
/// 文本不是合法的 YAML、顶层不是映射、`services` 不是映射都会返回 `Parse` 错误。
/// 缺少 `services` 段不是解析错误，由调用方决定如何处理。
pub fn parse(text: &str) -> Result<Manifest> {
    let document: Value = serde_yaml::from_str(text)
        .map_err(|e| FleetError::parse(format!("invalid manifest: {e}")))?;

    let root = match document {
        Value::Mapping(root) => root,
        Value::Null => return Err(FleetError::parse("manifest is empty")),
        _ => return Err(FleetError::parse("manifest top level must be a mapping")),
    };

    let mut manifest = Manifest::default();
    for (key, value) in root {
        if key.as_str() == Some(SERVICES_KEY) {
            manifest.services = parse_services(value)?;
            manifest.services_declared = true;
        } else if manifest.services_declared {
            manifest.footer.insert(key, value);
        } else {
            manifest.header.insert(key, value);
        }
    }

    Ok(manifest)
}

fn parse_services(section: Value) -> Result<Vec<Service>> {
    let section = match section {
        Value::Mapping(section) => section,
        Value::Null => return Ok(Vec::new()),
        _ => return Err(FleetError::parse("services must be a mapping")),
    };

    let mut services = Vec::with_capacity(section.len());
    for (name, body) in section {
        let name = match name {
            Value::String(name) => name,
            other => {
                return Err(FleetError::parse(format!(
                    "service name must be a string, got {}",
                    render_scalar(&other)
                )));
            }
        };
        let directives = match body {
            Value::Mapping(directives) => directives,
            Value::Null => Mapping::new(),
            _ => {
                return Err(FleetError::parse(format!(
                    "service {name} must be a mapping"
                )));
            }
        };
        services.push(Service::with_directives(name, directives));
    }
    Ok(services)
}

/// 把 manifest 序列化为文本
///
/// 输出只取决于输入顺序：标量写作 `key: value`，列表和嵌套映射写作缩进块。
pub fn serialize(manifest: &Manifest) -> String {
    let mut out = String::new();
    write_mapping(&mut out, 0, &manifest.header);

    if manifest.services_declared {
        if manifest.services.is_empty() {
            out.push_str(&format!("{SERVICES_KEY}: {{}}\n"));
        } else {
            out.push_str(&format!("{SERVICES_KEY}:\n"));
            for service in &manifest.services {
                let name = Value::String(service.name.clone());
                write_entry(&mut out, 1, &name, &Value::Mapping(service.directives.clone()));
            }
        }
    }

    write_mapping(&mut out, 0, &manifest.footer);
    out
}

fn write_mapping(out: &mut String, level: usize, map: &Mapping) {
    for (key, value) in map {
        write_entry(out, level, key, value);
    }
}

fn write_entry(out: &mut String, level: usize, key: &Value, value: &Value) {
    let pad = " ".repeat(level * INDENT);
    let key = render_key(key);
    let (tag, value) = split_tag(value);
    match value {
        Value::Sequence(items) if !items.is_empty() => {
            out.push_str(&format!("{pad}{key}:{tag}\n"));
            write_sequence(out, level + 1, items);
        }
        Value::Mapping(map) if !map.is_empty() => {
            out.push_str(&format!("{pad}{key}:{tag}\n"));
            write_mapping(out, level + 1, map);
        }
        scalar => out.push_str(&format!("{pad}{key}:{tag} {}\n", render_scalar(scalar))),
    }
}

fn write_sequence(out: &mut String, level: usize, items: &[Value]) {
    let pad = " ".repeat(level * INDENT);
    for item in items {
        let (tag, item) = split_tag(item);
        let mut nested = String::new();
        match item {
            Value::Mapping(map) if !map.is_empty() => write_mapping(&mut nested, level + 1, map),
            Value::Sequence(inner) if !inner.is_empty() => {
                write_sequence(&mut nested, level + 1, inner)
            }
            scalar => {
                out.push_str(&format!("{pad}-{tag} {}\n", render_scalar(scalar)));
                continue;
            }
        }
        if tag.is_empty() {
            // 嵌套块的第一行以 (level + 1) 级缩进开头，替换为 "- " 即成为列表项
            out.push_str(&pad);
            out.push_str("- ");
            out.push_str(&nested[(level + 1) * INDENT..]);
        } else {
            // 带标签的列表项：标签独占一行，嵌套块保持 (level + 1) 级缩进
            out.push_str(&format!("{pad}-{tag}\n"));
            out.push_str(&nested);
        }
    }
}

/// 拆出节点的标签（如 compose 的 `!reset`、`!override`），返回 `" !tag"` 形式的前缀和标签内的值
fn split_tag(value: &Value) -> (String, &Value) {
    match value {
        Value::Tagged(tagged) => (format!(" {}", tagged.tag), &tagged.value),
        other => (String::new(), other),
    }
}

fn render_key(key: &Value) -> String {
    match key {
        Value::Sequence(_) | Value::Mapping(_) => {
            serde_json::to_string(key).unwrap_or_else(|_| "null".to_string())
        }
        scalar => render_scalar(scalar),
    }
}

/// 渲染单个标量；字符串只有在原样输出会被解析成别的值时才加引号
fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote_if_needed(s),
        Value::Sequence(items) if items.is_empty() => "[]".to_string(),
        Value::Mapping(map) if map.is_empty() => "{}".to_string(),
        Value::Tagged(tagged) => format!("{} {}", tagged.tag, render_scalar(&tagged.value)),
        other => serde_json::to_string(other).unwrap_or_else(|_| "null".to_string()),
    }
}

fn quote_if_needed(s: &str) -> String {
    if needs_quotes(s) {
        // JSON 字符串同时是合法的 YAML 双引号标量
        serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
    } else {
        s.to_string()
    }
}

fn needs_quotes(s: &str) -> bool {
    if s.is_empty() || s.trim() != s || s.chars().any(char::is_control) {
        return true;
    }
    !matches!(serde_yaml::from_str::<Value>(s), Ok(Value::String(ref plain)) if plain == s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_scalars_stay_unquoted() {
        assert_eq!(quote_if_needed("nginx:latest"), "nginx:latest");
        assert_eq!(quote_if_needed("8080:80"), "8080:80");
        assert_eq!(quote_if_needed("FOO=bar"), "FOO=bar");
        assert_eq!(quote_if_needed("/data:/var/lib/data"), "/data:/var/lib/data");
    }

    #[test]
    fn test_ambiguous_scalars_are_quoted() {
        assert_eq!(quote_if_needed("true"), "\"true\"");
        assert_eq!(quote_if_needed("3306"), "\"3306\"");
        assert_eq!(quote_if_needed(""), "\"\"");
        assert_eq!(quote_if_needed("a: b"), "\"a: b\"");
        assert_eq!(quote_if_needed("x #y"), "\"x #y\"");
        assert_eq!(quote_if_needed("line\nbreak"), "\"line\\nbreak\"");
        assert_eq!(quote_if_needed(" padded"), "\" padded\"");
    }

    #[test]
    fn test_sequence_of_mappings_layout() {
        let manifest = parse(
            "services:\n  web:\n    ports:\n      - target: 80\n        published: 8080\n",
        )
        .unwrap();
        let text = serialize(&manifest);
        assert_eq!(
            text,
            "services:\n  web:\n    ports:\n      - target: 80\n        published: 8080\n"
        );
    }

    #[test]
    fn test_compose_tags_survive_round_trip() {
        let text = "services:\n  web:\n    image: nginx\n    ports: !reset []\n    environment: !override\n      - A=1\n";
        let manifest = parse(text).unwrap();
        let serialized = serialize(&manifest);

        assert_eq!(serialized, text);
        assert_eq!(parse(&serialized).unwrap(), manifest);
    }

    #[test]
    fn test_tagged_sequence_items_keep_their_tags() {
        let text = "services:\n  web:\n    volumes:\n      - !override\n        source: data\n        target: /data\n      - !reset logs:/logs\n";
        let manifest = parse(text).unwrap();
        let serialized = serialize(&manifest);

        assert_eq!(serialized, text);
        assert_eq!(parse(&serialized).unwrap(), manifest);
    }
}
