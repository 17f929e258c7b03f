use crate::app::CliApp;
use fleet_core::container::{LogLine, LogStream};
use fleet_core::error::Result;
use fleet_core::lifecycle::{DeployAction, ProjectOutcome};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// 启动一个后台任务，把执行过程中的日志实时打印到终端
pub(crate) fn spawn_log_printer() -> (UnboundedSender<LogLine>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<LogLine>();
    let handle = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            match line.stream {
                LogStream::Status => info!("   ▶ [{}] {}", line.project, line.line),
                LogStream::Stdout | LogStream::Stderr => {
                    info!("     [{}] {}", line.project, line.line)
                }
            }
        }
    });
    (tx, handle)
}

/// 等待日志打印任务把剩余的行打印完
pub(crate) async fn finish_log_printer(handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        warn!("Log printer stopped unexpectedly: {}", e);
    }
}

/// 汇总输出每个项目的结果，全部成功时返回 true
pub(crate) fn report_outcomes(outcomes: &[ProjectOutcome]) -> bool {
    for outcome in outcomes {
        if outcome.is_success() {
            info!("✅ {}: {}", outcome.project, outcome.message);
        } else {
            error!("❌ {}: {}", outcome.project, outcome.message);
        }
        for failure in &outcome.failures {
            warn!("   ⚠️  {}", failure);
        }
    }

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    if outcomes.len() > 1 {
        info!(
            "Done: {} succeeded, {} failed",
            outcomes.len() - failed,
            failed
        );
    }
    failed == 0
}

/// 批量启动或停止项目
pub async fn run_deploy(app: &CliApp, names: &[String], action: DeployAction) -> Result<bool> {
    let (tx, printer) = spawn_log_printer();
    let outcomes = app.executor.deploy(names, action, Some(tx)).await;
    finish_log_printer(printer).await;
    Ok(report_outcomes(&outcomes))
}

/// 停止项目并清理镜像
pub async fn run_cleanup(app: &CliApp, name: &str) -> Result<bool> {
    let (tx, printer) = spawn_log_printer();
    let outcome = app.executor.cleanup(name, Some(tx)).await;
    finish_log_printer(printer).await;
    Ok(report_outcomes(std::slice::from_ref(&outcome)))
}

/// 批量删除项目
pub async fn run_delete(app: &CliApp, names: &[String]) -> Result<bool> {
    let (tx, printer) = spawn_log_printer();
    let outcomes = app.executor.delete(names, Some(tx)).await;
    finish_log_printer(printer).await;
    Ok(report_outcomes(&outcomes))
}
