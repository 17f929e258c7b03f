//! 按 shell 规则切分与转义命令行参数

use crate::error::{FleetError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_@%+=:,./-]").expect("unsafe char pattern is valid"));

#[derive(Clone, Copy, PartialEq)]
enum State {
    /// 词之间的空白
    Between,
    /// 未加引号的词内部
    Word,
    SingleQuoted,
    DoubleQuoted,
}

/// 按 POSIX shell 的分词规则切分命令行
///
/// 支持单引号、双引号和反斜杠转义，`\` 加换行视为续行。
/// 引号未闭合或末尾是孤立的反斜杠时返回 `Parse` 错误。
pub fn split(input: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut state = State::Between;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Between | State::Word => match c {
                c if c.is_whitespace() => {
                    if state == State::Word {
                        words.push(std::mem::take(&mut current));
                        state = State::Between;
                    }
                }
                '\'' => state = State::SingleQuoted,
                '"' => state = State::DoubleQuoted,
                '\\' => match chars.next() {
                    Some('\n') => {}
                    Some(escaped) => {
                        current.push(escaped);
                        state = State::Word;
                    }
                    None => return Err(FleetError::parse("no escaped character after '\\'")),
                },
                c => {
                    current.push(c);
                    state = State::Word;
                }
            },
            State::SingleQuoted => match c {
                '\'' => state = State::Word,
                c => current.push(c),
            },
            State::DoubleQuoted => match c {
                '"' => state = State::Word,
                '\\' => match chars.peek() {
                    Some(&next) if matches!(next, '\\' | '"' | '$' | '`') => {
                        current.push(next);
                        chars.next();
                    }
                    Some(&'\n') => {
                        chars.next();
                    }
                    _ => current.push('\\'),
                },
                c => current.push(c),
            },
        }
    }

    match state {
        State::SingleQuoted | State::DoubleQuoted => {
            Err(FleetError::parse("no closing quotation"))
        }
        State::Word => {
            words.push(current);
            Ok(words)
        }
        State::Between => Ok(words),
    }
}

/// 为参数加上 shell 引号，安全字符组成的参数原样返回
pub fn quote(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }
    if !UNSAFE_CHARS.is_match(arg) {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r#"'"'"'"#))
}

/// 把参数列表拼接成一行可直接粘贴执行的命令
pub fn join<I, S>(args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .map(|arg| quote(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain_words() {
        assert_eq!(
            split("docker run  -d\tnginx").unwrap(),
            vec!["docker", "run", "-d", "nginx"]
        );
        assert!(split("   ").unwrap().is_empty());
    }

    #[test]
    fn test_split_quotes_and_escapes() {
        assert_eq!(
            split(r#"-e "GREETING=hello world" -e 'A=$HOME' B=c\ d"#).unwrap(),
            vec!["-e", "GREETING=hello world", "-e", "A=$HOME", "B=c d"]
        );
        assert_eq!(split(r#""a\"b" ''"#).unwrap(), vec!["a\"b", ""]);
        assert_eq!(split("FOO=\"x\"y").unwrap(), vec!["FOO=xy"]);
        assert_eq!(split("a \\\nb").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_split_rejects_malformed_quoting() {
        assert!(split("docker run -e 'A=1").is_err());
        assert!(split("docker run -e \"A=1").is_err());
        assert!(split("docker run \\").is_err());
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("nginx:latest"), "nginx:latest");
        assert_eq!(quote("FOO=bar"), "FOO=bar");
        assert_eq!(quote("hello world"), "'hello world'");
        assert_eq!(quote("it's"), r#"'it'"'"'s'"#);
        assert_eq!(quote(""), "''");
        assert_eq!(split(&quote("it's a $test")).unwrap(), vec!["it's a $test"]);
    }
}
