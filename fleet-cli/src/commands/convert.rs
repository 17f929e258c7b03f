use crate::utils::read_input;
use fleet_core::error::Result;
use fleet_core::manifest::{self, shell};
use std::path::Path;

/// 命令行参数还原为一条命令；只有一个参数时视为已经整体加了引号的命令
fn command_line(args: &[String]) -> String {
    match args {
        [single] => single.clone(),
        args => shell::join(args),
    }
}

/// run 命令转换为 compose 文本并输出到标准输出
pub fn run_to_compose(args: &[String]) -> Result<()> {
    let text = manifest::run_to_compose_text(&command_line(args))?;
    print!("{text}");
    Ok(())
}

/// compose 文本转换为 run 命令并输出到标准输出
pub fn compose_to_run(file: Option<&Path>) -> Result<()> {
    let text = read_input(file)?;
    let commands = manifest::compose_text_to_run(&text)?;
    println!("{}", commands.join("\n\n"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_requotes_split_arguments() {
        let single = vec!["docker run -e 'A=b c' nginx".to_string()];
        assert_eq!(command_line(&single), "docker run -e 'A=b c' nginx");

        let split: Vec<String> = ["docker", "run", "-e", "A=b c", "nginx"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(command_line(&split), "docker run -e 'A=b c' nginx");
    }
}
