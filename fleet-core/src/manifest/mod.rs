//! compose manifest 的内存模型、文本编解码，以及与 `docker run` 命令的互转

mod codec;
mod compose_to_run;
mod run_to_compose;
pub mod shell;
mod types;

#[cfg(test)]
mod tests;

// 重新导出公共接口
pub use codec::{parse, serialize};
pub use compose_to_run::{RunCommand, manifest_to_run};
pub use run_to_compose::run_to_manifest;
pub use types::{Manifest, Service, is_valid_name};

use crate::constants::convert;
use crate::error::{FleetError, Result};

/// 把 compose 文本转换为 run 命令字符串
///
/// 这里对缺少 `services` 段的文档更宽松：整个文档被视为一个名为 `app` 的服务。
pub fn compose_text_to_run(text: &str) -> Result<Vec<String>> {
    let text = text.trim();
    if text.is_empty() {
        return Err(FleetError::parse("manifest content must not be empty"));
    }
    let manifest = parse(text)?.into_implicit_service(convert::DEFAULT_SERVICE_NAME);
    let commands = manifest_to_run(&manifest)?;
    Ok(commands.iter().map(ToString::to_string).collect())
}

/// 把 run 命令转换为 compose 文本
pub fn run_to_compose_text(command: &str) -> Result<String> {
    let manifest = run_to_manifest(command)?;
    Ok(serialize(&manifest))
}

/// 创建或保存前的严格校验：必须可解析，且包含至少一个名称合法的服务
pub fn parse_for_create(text: &str) -> Result<Manifest> {
    let manifest = parse(text)?;
    manifest.validate()?;
    Ok(manifest)
}
