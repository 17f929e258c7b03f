use clap::Parser;
use fleet_cli::{Cli, CliApp, Commands, run_init, setup_logging};
use fleet_core::config::AppConfig;
use std::process::ExitCode;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    // 解析命令行参数
    let cli = Cli::parse();

    // `init` 命令是特例，它不需要预先加载配置
    if let Commands::Init { force } = cli.command {
        let _guard = setup_logging(cli.verbose, None);
        if let Err(e) = run_init(&cli.config, force) {
            error!("❌ Initialization failed: {}", e);
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    }

    // 对于其他所有命令，需要先加载配置，日志目录也来自配置
    let config = match AppConfig::load_or_find(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            let _guard = setup_logging(cli.verbose, None);
            error!("❌ Failed to load config '{}': {}", cli.config.display(), e);
            error!("👉 Run 'fleet-cli init' to create a config file");
            return ExitCode::FAILURE;
        }
    };

    // guard 必须持有到程序结束，保证文件日志全部写出
    let _guard = setup_logging(cli.verbose, config.log_dir().as_deref());

    let mut app = CliApp::with_config(config, cli.config);
    match app.run_command(cli.command).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("❌ Operation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
