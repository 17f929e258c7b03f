use crate::project_info::get_version_string;
use fleet_core::{config::AppConfig, error::Result};
use std::path::Path;
use tracing::{info, warn};

/// 运行独立的初始化流程
pub fn run_init(config_path: &Path, force: bool) -> Result<()> {
    info!("🚢 {} initialization", get_version_string());
    info!("==========================");

    // 检查是否已经初始化过
    if !force && config_path.exists() {
        warn!("⚠️  Config file {} already exists", config_path.display());
        info!("Use --force to overwrite it");
        info!("Example: fleet-cli init --force");
        return Ok(());
    }

    info!("📋 Step 1: write config file");
    let config = AppConfig::default();
    config.save_to_file(config_path)?;
    info!("   ✅ Created {}", config_path.display());

    info!("📋 Step 2: create directories");
    if let Some(log_dir) = config.log_dir() {
        std::fs::create_dir_all(&log_dir)?;
        info!("   ✅ Log directory: {}", log_dir.display());
    }
    if let Some(parent) = config
        .history_file()
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent)?;
        info!("   ✅ History directory: {}", parent.display());
    }

    let root = Path::new(&config.compose.root);
    if root.is_dir() {
        info!("   ✅ Compose root: {}", root.display());
    } else {
        warn!(
            "   ⚠️  Compose root {} does not exist yet",
            root.display()
        );
        info!("   💡 Create it or run 'fleet-cli root set <path>'");
    }

    info!("🎉 Initialization complete");
    info!("");
    info!("📝 Next steps:");
    info!("   1️⃣  Run 'fleet-cli list' to see the projects under the compose root");
    info!("   2️⃣  Run 'fleet-cli create <name> --compose docker-compose.yml' to add one");
    info!("   3️⃣  Run 'fleet-cli up <name>' to start it");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_run_init_respects_existing_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "# custom\n").unwrap();

        run_init(&path, false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# custom\n");
    }
}
