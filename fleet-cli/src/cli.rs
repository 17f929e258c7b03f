use crate::project_info::{metadata, version_info};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// run 命令与 compose 文本互转
#[derive(Subcommand, Debug)]
pub enum ConvertCommand {
    /// 把 `docker run ...` 命令转换为 compose 文本
    RunToCompose {
        /// 完整的 run 命令，例如 "docker run -d --name web -p 8080:80 nginx"
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },
    /// 把 compose 文本转换为 run 命令
    ComposeToRun {
        /// compose 文件路径，省略或为 "-" 时从标准输入读取
        file: Option<PathBuf>,
    },
}

/// compose 根目录管理
#[derive(Subcommand, Debug)]
pub enum RootCommand {
    /// 显示当前根目录
    Show,
    /// 切换根目录并写回配置文件
    Set {
        /// 新的根目录，必须是已存在的目录
        path: PathBuf,
    },
}

/// 要保存的文件（二选一）
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SaveSource {
    /// 用该文件覆盖项目的 docker-compose.yml
    #[arg(long, value_name = "FILE")]
    pub compose: Option<PathBuf>,
    /// 用该文件覆盖项目的 .env
    #[arg(long, value_name = "FILE")]
    pub env: Option<PathBuf>,
}

/// Fleet CLI - Docker Compose 项目集管理工具
#[derive(Parser)]
#[command(name = metadata::PROJECT_NAME)]
#[command(about = metadata::PROJECT_DESCRIPTION)]
#[command(version = version_info::CLI_VERSION)]
#[command(long_about = metadata::display::DESCRIPTION_LONG)]
#[command(author = metadata::PROJECT_AUTHORS)]
pub struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// 详细输出
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 首次使用时创建配置文件和目录
    Init {
        /// 如果配置文件已存在，强制覆盖
        #[arg(long)]
        force: bool,
    },
    /// 列出根目录下的所有项目
    List {
        /// 以 JSON 格式输出完整项目信息
        #[arg(long)]
        json: bool,
    },
    /// 显示项目运行状态
    Status {
        /// 只查看指定项目
        name: Option<String>,
    },
    /// 显示项目的 docker-compose.yml 与 .env
    Show {
        name: String,
    },
    /// 启动项目（compose up -d）
    Up {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// 停止项目（compose down）
    Down {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// 停止项目并删除其使用的镜像
    Cleanup {
        name: String,
    },
    /// 停止项目、删除镜像并删除项目目录
    Delete {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// 新建项目
    Create {
        /// 项目名称，也是项目目录名
        name: String,
        /// docker-compose.yml 内容所在的文件
        #[arg(long, value_name = "FILE")]
        compose: PathBuf,
        /// .env 内容所在的文件
        #[arg(long, value_name = "FILE")]
        env: Option<PathBuf>,
        /// 创建后立即启动
        #[arg(long)]
        up: bool,
    },
    /// 覆盖保存项目文件
    Save {
        name: String,
        #[command(flatten)]
        source: SaveSource,
    },
    /// run 命令与 compose 互转
    #[command(subcommand)]
    Convert(ConvertCommand),
    /// 查看操作历史
    History {
        /// 显示最近的记录条数
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// compose 根目录管理
    #[command(subcommand)]
    Root(RootCommand),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_to_compose_accepts_hyphen_values() {
        let cli = Cli::try_parse_from([
            "fleet-cli",
            "convert",
            "run-to-compose",
            "docker",
            "run",
            "-d",
            "--name",
            "web",
            "nginx",
        ])
        .unwrap();
        match cli.command {
            Commands::Convert(ConvertCommand::RunToCompose { command }) => {
                assert_eq!(command.join(" "), "docker run -d --name web nginx");
            }
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn test_save_requires_exactly_one_source() {
        assert!(Cli::try_parse_from(["fleet-cli", "save", "web"]).is_err());
        assert!(
            Cli::try_parse_from([
                "fleet-cli", "save", "web", "--compose", "a.yml", "--env", "b.env"
            ])
            .is_err()
        );
        assert!(Cli::try_parse_from(["fleet-cli", "save", "web", "--env", "b.env"]).is_ok());
    }

    #[test]
    fn test_batch_commands_require_names() {
        assert!(Cli::try_parse_from(["fleet-cli", "up"]).is_err());
        let cli = Cli::try_parse_from(["fleet-cli", "-v", "delete", "a", "b"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Delete { names } if names.len() == 2));
    }
}
