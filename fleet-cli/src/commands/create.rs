use super::deploy::{finish_log_printer, report_outcomes, spawn_log_printer};
use crate::app::CliApp;
use crate::cli::SaveSource;
use crate::utils::read_input;
use fleet_core::error::{FleetError, Result};
use fleet_core::lifecycle::{CreateProject, FileKind};
use std::path::Path;
use tracing::info;

/// 新建项目
pub async fn run_create(
    app: &CliApp,
    name: String,
    compose: &Path,
    env: Option<&Path>,
    start: bool,
) -> Result<bool> {
    let manifest = read_input(Some(compose))?;
    let env = env.map(|path| read_input(Some(path))).transpose()?;

    info!("🆕 Creating project {}...", name);
    let (tx, printer) = spawn_log_printer();
    let result = app
        .executor
        .create(
            CreateProject {
                name,
                manifest,
                env,
                start,
            },
            Some(tx),
        )
        .await;
    finish_log_printer(printer).await;

    let outcome = result?;
    Ok(report_outcomes(std::slice::from_ref(&outcome)))
}

/// 覆盖保存项目的 docker-compose.yml 或 .env
pub async fn run_save(app: &CliApp, name: &str, source: SaveSource) -> Result<bool> {
    let (kind, path) = match (source.compose, source.env) {
        (Some(path), None) => (FileKind::Compose, path),
        (None, Some(path)) => (FileKind::Env, path),
        _ => {
            return Err(FleetError::validation(
                "exactly one of --compose or --env is required",
            ));
        }
    };

    let content = read_input(Some(&path))?;
    let saved = app.executor.save_file(name, kind, &content).await?;
    info!("💾 Saved {}", saved.display());
    Ok(true)
}
