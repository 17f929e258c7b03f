use crate::app::CliApp;
use tracing::info;

/// 显示最近的操作历史
pub fn run_history(app: &CliApp, limit: usize) {
    let records = app.journal.recent(limit);
    if records.is_empty() {
        info!("📜 No operations recorded yet");
        return;
    }

    info!(
        "📜 Last {} of {} operation(s):",
        records.len(),
        app.journal.len()
    );
    for record in &records {
        let icon = if record.status.is_success() { "✅" } else { "❌" };
        info!(
            "   {} {} {:<13} {:<20} {}",
            icon,
            record.formatted_time(),
            record.operation,
            record.project,
            record.message
        );
    }
}
