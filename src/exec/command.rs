// src/exec/command.rs

use std::fmt;
use std::path::Path;

use crate::config::ExecutionConfig;
use crate::errors::{KimiRunError, Result};

/// Concrete argument vector for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    argv: Vec<String>,
    wrapped: bool,
}

impl ResolvedCommand {
    /// A command executed as-is.
    pub fn direct(argv: Vec<String>) -> Result<Self> {
        Self::new(argv, false)
    }

    /// A command that runs the real tool through a terminal helper.
    pub(crate) fn wrapped(argv: Vec<String>) -> Result<Self> {
        Self::new(argv, true)
    }

    fn new(argv: Vec<String>, wrapped: bool) -> Result<Self> {
        match argv.first() {
            Some(program) if !program.is_empty() => Ok(Self { argv, wrapped }),
            _ => Err(KimiRunError::InvalidCommand(
                "argument vector has no program".to_string(),
            )),
        }
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn is_wrapped(&self) -> bool {
        self.wrapped
    }
}

/// Space-joined, unquoted; for diagnostics only.
impl fmt::Display for ResolvedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv.join(" "))
    }
}

/// Argument vector for the tool itself:
/// `[program, --print, -p, <prompt>, -w, <workdir>, (--allowed-tools, <list>)]`.
pub fn tool_argv(program: &Path, config: &ExecutionConfig, workdir: &Path) -> Vec<String> {
    let mut argv = vec![
        program.to_string_lossy().into_owned(),
        "--print".to_string(),
        "-p".to_string(),
        config.prompt().to_string(),
        "-w".to_string(),
        workdir.to_string_lossy().into_owned(),
    ];

    if let Some(tools) = config.allowed_tools() {
        argv.push("--allowed-tools".to_string());
        argv.push(tools.to_string());
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_argv_layout() {
        let cfg = ExecutionConfig::builder("write hello.py").build().unwrap();
        let argv = tool_argv(Path::new("/usr/bin/kimi"), &cfg, Path::new("/work"));
        assert_eq!(
            argv,
            vec!["/usr/bin/kimi", "--print", "-p", "write hello.py", "-w", "/work"]
        );
    }

    #[test]
    fn tool_argv_appends_allow_list_verbatim() {
        let cfg = ExecutionConfig::builder("x")
            .allowed_tools(Some("read, exec,write".to_string()))
            .build()
            .unwrap();
        let argv = tool_argv(Path::new("kimi"), &cfg, Path::new("/w"));
        assert_eq!(&argv[argv.len() - 2..], ["--allowed-tools", "read, exec,write"]);
    }

    #[test]
    fn empty_argv_is_rejected() {
        assert!(ResolvedCommand::direct(vec![]).is_err());
        assert!(ResolvedCommand::direct(vec![String::new()]).is_err());
    }

    #[test]
    fn program_and_args_split() {
        let cmd = ResolvedCommand::direct(vec!["echo".into(), "a b".into()]).unwrap();
        assert_eq!(cmd.program(), "echo");
        assert_eq!(cmd.args(), ["a b"]);
        assert!(!cmd.is_wrapped());
        assert_eq!(cmd.to_string(), "echo a b");
    }
}
