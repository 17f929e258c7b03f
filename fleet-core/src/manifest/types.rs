use crate::constants::compose;
use crate::error::{FleetError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;

static NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(compose::NAME_PATTERN).expect("name pattern is a valid regex")
});

/// 项目名、服务名格式校验
pub fn is_valid_name(name: &str) -> bool {
    NAME_REGEX.is_match(name)
}

/// manifest 中的一个服务
///
/// 指令按原始顺序保存，顺序不影响语义，只用于保证往返输出稳定
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Service {
    pub name: String,
    pub directives: Mapping,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            directives: Mapping::new(),
        }
    }

    pub fn with_directives(name: impl Into<String>, directives: Mapping) -> Self {
        Self {
            name: name.into(),
            directives,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.directives.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.directives.contains_key(key)
    }

    /// 设置标量指令；已存在时原位覆盖（后出现者生效）
    pub fn set(&mut self, key: &str, value: Value) {
        self.directives.insert(Value::String(key.to_string()), value);
    }

    /// 向列表指令追加一项，不存在时创建
    pub fn push(&mut self, key: &str, item: impl Into<String>) {
        let item = Value::String(item.into());
        match self.directives.get_mut(key) {
            Some(Value::Sequence(items)) => items.push(item),
            Some(other) => *other = Value::Sequence(vec![item]),
            None => self.set(key, Value::Sequence(vec![item])),
        }
    }

    pub fn image(&self) -> Option<&str> {
        self.get("image").and_then(Value::as_str)
    }
}

/// 内存中的 manifest
///
/// `header` / `footer` 保存 `services` 之前和之后的顶层键（如 version、networks），
/// 系统不解释这些键，只在保存时原样输出。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Manifest {
    pub header: Mapping,
    pub services: Vec<Service>,
    pub footer: Mapping,
    pub(crate) services_declared: bool,
}

impl Manifest {
    /// 只包含一个服务的 manifest
    pub fn single(service: Service) -> Self {
        Self {
            header: Mapping::new(),
            services: vec![service],
            footer: Mapping::new(),
            services_declared: true,
        }
    }

    /// 文档中是否存在顶层 `services` 段
    pub fn has_services_section(&self) -> bool {
        self.services_declared
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn service_names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    /// 所有服务引用的镜像，按服务顺序去重
    pub fn images(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.services
            .iter()
            .filter_map(Service::image)
            .filter(|image| seen.insert(image.to_string()))
            .map(str::to_string)
            .collect()
    }

    /// 没有 `services` 段时，把整个文档视为一个隐式服务（仅用于转换流程）
    pub fn into_implicit_service(self, name: &str) -> Self {
        if self.services_declared {
            return self;
        }
        let mut directives = self.header;
        directives.extend(self.footer);
        Self::single(Service::with_directives(name, directives))
    }

    /// 创建项目前的结构校验
    pub fn validate(&self) -> Result<()> {
        if !self.services_declared {
            return Err(FleetError::validation("manifest is missing a services section"));
        }
        if self.services.is_empty() {
            return Err(FleetError::validation("manifest defines no services"));
        }

        let mut seen = HashSet::new();
        for service in &self.services {
            if !is_valid_name(&service.name) {
                return Err(FleetError::validation(format!(
                    "invalid service name: {}",
                    service.name
                )));
            }
            if !seen.insert(service.name.as_str()) {
                return Err(FleetError::validation(format!(
                    "duplicate service name: {}",
                    service.name
                )));
            }
        }
        Ok(())
    }
}
