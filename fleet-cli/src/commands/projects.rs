use crate::app::CliApp;
use fleet_core::constants::journal::TIMESTAMP_FORMAT;
use fleet_core::error::Result;
use tracing::{info, warn};

/// 检查 Docker 是否可用；不可用时项目状态会显示为 unknown
async fn warn_if_docker_unavailable(app: &CliApp) {
    if let Err(e) = app.docker_manager.check_docker_status().await {
        warn!("⚠️  {}", e);
        warn!("   Project status will be reported as unknown");
    }
}

/// 列出所有项目
pub async fn run_list(app: &CliApp, json: bool) -> Result<()> {
    let projects = app.registry.scan().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&projects)?);
        return Ok(());
    }

    info!("📁 Compose root: {}", app.root.get().display());
    if projects.is_empty() {
        info!("   No projects found");
        return Ok(());
    }

    for project in &projects {
        let created = project
            .created_time
            .map(|time| time.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| "-".to_string());
        info!(
            "{} {:<24} {:<8} {}/{} running  created {}",
            project.status.icon(),
            project.name,
            project.status,
            project.running_containers,
            project.service_count,
            created
        );
        if project.manifest_content.starts_with("Error: ") {
            warn!("   ⚠️  {}", project.manifest_content);
        }
    }
    info!("Total: {} project(s)", projects.len());
    Ok(())
}

/// 显示项目运行状态
pub async fn run_status(app: &CliApp, name: Option<&str>) -> Result<()> {
    warn_if_docker_unavailable(app).await;

    if let Some(name) = name {
        let result = app.registry.probe(name).await?;
        info!(
            "{} {}: {} ({} running)",
            result.status.icon(),
            name,
            result.status,
            result.running
        );
        return Ok(());
    }

    let summary = app.registry.status().await?;
    info!("📊 Project status:");
    for row in &summary {
        info!(
            "   {} {:<24} {:<8} {}/{}",
            row.status.icon(),
            row.name,
            row.status,
            row.running_containers,
            row.service_count
        );
    }
    let running = summary
        .iter()
        .filter(|row| row.running_containers > 0)
        .count();
    info!("   {} of {} project(s) running", running, summary.len());
    Ok(())
}

/// 显示项目文件内容
pub fn run_show(app: &CliApp, name: &str) -> Result<()> {
    let files = app.registry.show(name)?;

    println!("# {}", files.manifest_file.display());
    print!("{}", files.manifest_content);
    if !files.manifest_content.ends_with('\n') {
        println!();
    }
    if let Some(env) = files.env_content {
        println!("# .env");
        print!("{env}");
        if !env.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}
