use crate::app::CliApp;
use fleet_core::error::Result;
use std::path::Path;
use tracing::info;

/// 显示当前 compose 根目录
pub fn show_root(app: &CliApp) {
    info!("📁 Compose root: {}", app.root.get().display());
    info!("   Config file: {}", app.config_path.display());
}

/// 切换 compose 根目录并写回配置文件
pub fn set_root(app: &mut CliApp, path: &Path) -> Result<()> {
    let new_root = app.root.reconfigure(path)?;
    app.config.compose.root = new_root.display().to_string();
    app.config.save_to_file(&app.config_path)?;
    info!("✅ Compose root set to {}", new_root.display());
    info!("   Saved to {}", app.config_path.display());
    Ok(())
}
