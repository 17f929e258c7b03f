use fleet_core::{
    config::{AppConfig, ComposeRoot},
    container::DockerManager,
    error::Result,
    journal::OperationJournal,
    lifecycle::{DeployAction, LifecycleExecutor},
    registry::ProjectRegistry,
};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::{Commands, ConvertCommand, RootCommand};
use crate::commands;
use tracing::info;

/// CLI 应用：持有配置以及共享同一根目录、运行时和操作日志的各个组件
pub struct CliApp {
    pub config: AppConfig,
    pub config_path: PathBuf,
    pub root: ComposeRoot,
    pub docker_manager: Arc<DockerManager>,
    pub journal: Arc<OperationJournal>,
    pub registry: ProjectRegistry<DockerManager>,
    pub executor: LifecycleExecutor<DockerManager>,
}

impl CliApp {
    /// 使用已加载的配置初始化
    pub fn with_config(config: AppConfig, config_path: PathBuf) -> Self {
        let root = ComposeRoot::from_config(&config);
        let docker_manager = Arc::new(DockerManager::new());
        let journal = Arc::new(OperationJournal::open(
            config.history_file(),
            config.journal.max_records,
        ));

        let registry = ProjectRegistry::new(root.clone(), docker_manager.clone(), journal.clone());
        let executor = LifecycleExecutor::new(root.clone(), docker_manager.clone(), journal.clone())
            .with_down_failure(config.cleanup.down_failure);

        Self {
            config,
            config_path,
            root,
            docker_manager,
            journal,
            registry,
            executor,
        }
    }

    /// 运行应用命令
    ///
    /// 返回 `Ok(false)` 表示命令执行完毕，但至少有一个项目的结果为 error
    pub async fn run_command(&mut self, command: Commands) -> Result<bool> {
        match command {
            Commands::Init { .. } => unreachable!(), // 已经在 main.rs 中处理
            Commands::List { json } => commands::run_list(self, json).await.map(|_| true),
            Commands::Status { name } => {
                commands::run_status(self, name.as_deref()).await.map(|_| true)
            }
            Commands::Show { name } => commands::run_show(self, &name).map(|_| true),
            Commands::Up { names } => {
                info!("🚀 Starting {} project(s)...", names.len());
                commands::run_deploy(self, &names, DeployAction::Up).await
            }
            Commands::Down { names } => {
                info!("⏹️  Stopping {} project(s)...", names.len());
                commands::run_deploy(self, &names, DeployAction::Down).await
            }
            Commands::Cleanup { name } => {
                info!("🧹 Cleaning up project {}...", name);
                commands::run_cleanup(self, &name).await
            }
            Commands::Delete { names } => {
                info!("🗑️  Deleting {} project(s)...", names.len());
                commands::run_delete(self, &names).await
            }
            Commands::Create {
                name,
                compose,
                env,
                up,
            } => commands::run_create(self, name, &compose, env.as_deref(), up).await,
            Commands::Save { name, source } => commands::run_save(self, &name, source).await,
            Commands::Convert(convert_cmd) => self.run_convert_command(convert_cmd),
            Commands::History { limit } => {
                commands::run_history(self, limit);
                Ok(true)
            }
            Commands::Root(root_cmd) => self.run_root_command(root_cmd),
        }
    }

    /// 运行转换相关命令
    fn run_convert_command(&self, cmd: ConvertCommand) -> Result<bool> {
        match cmd {
            ConvertCommand::RunToCompose { command } => {
                commands::run_to_compose(&command).map(|_| true)
            }
            ConvertCommand::ComposeToRun { file } => {
                commands::compose_to_run(file.as_deref()).map(|_| true)
            }
        }
    }

    /// 运行根目录相关命令
    fn run_root_command(&mut self, cmd: RootCommand) -> Result<bool> {
        match cmd {
            RootCommand::Show => {
                commands::show_root(self);
                Ok(true)
            }
            RootCommand::Set { path } => commands::set_root(self, &path).map(|_| true),
        }
    }
}
