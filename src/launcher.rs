//! Handing control to another program.
//!
//! On Unix the current process image is replaced in place (`execvp`), so the
//! launcher leaves nothing behind. Windows has no such call: there the
//! resolver is asked to print the final command line instead of running it,
//! and we run that command ourselves and relay its exit code.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::Command;

use crate::config::{Platform, ENV_NO_EXEC, ENV_PRINT};
use crate::errors::LaunchError;
use crate::util::exec::{ExecRequest, ExecService};
use crate::util::shell_like_split_args;

/// Ordered set of environment edits; `None` unsets the variable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvChanges(Vec<(OsString, Option<OsString>)>);

impl EnvChanges {
    pub fn set(&mut self, key: impl Into<OsString>, value: impl Into<OsString>) {
        self.0.push((key.into(), Some(value.into())));
    }

    pub fn remove(&mut self, key: impl Into<OsString>) {
        self.0.push((key.into(), None));
    }

    pub fn extend(&mut self, other: EnvChanges) {
        self.0.extend(other.0);
    }

    /// Last edit for `key`: `Some(Some(v))` set, `Some(None)` removed, `None` untouched.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref().and_then(OsStr::to_str))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsString, &Option<OsString>)> {
        self.0.iter().map(|(k, v)| (k, v))
    }

    fn apply(&self, cmd: &mut Command) {
        for (k, v) in &self.0 {
            match v {
                Some(v) => cmd.env(k, v),
                None => cmd.env_remove(k),
            };
        }
    }
}

/// What the launched program will do with control.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Stage {
    /// Runs to completion itself: the ssh client, or the resolver rendering a file.
    #[default]
    Terminal,
    /// The resolver, which will in turn start a connection.
    Resolver,
}

/// A program to hand control to, with the environment edits it must inherit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    pub env: EnvChanges,
    pub stage: Stage,
}

impl LaunchCommand {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: Option<PathBuf>) -> Self {
        self.cwd = dir;
        self
    }

    pub fn env(mut self, env: EnvChanges) -> Self {
        self.env.extend(env);
        self
    }

    /// Program followed by its arguments, for notices.
    pub fn argv(&self) -> Vec<&OsStr> {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .collect()
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        self.env.apply(&mut cmd);
        cmd
    }
}

/// Capability to hand control to another program. Every invocation makes at
/// most one `launch` call; it is always the last thing the launcher does.
pub trait ProcessLauncher {
    /// Returns the exit code to terminate with when the platform cannot replace
    /// the process; an in-place replacement only ever returns an error.
    fn launch(&self, cmd: LaunchCommand) -> Result<i32, LaunchError>;
}

/// Replace the current process image (`exec`).
#[derive(Debug, Default)]
pub struct ExecLauncher;

impl ProcessLauncher for ExecLauncher {
    #[cfg(unix)]
    fn launch(&self, cmd: LaunchCommand) -> Result<i32, LaunchError> {
        use std::os::unix::process::CommandExt;

        let err = cmd.to_command().exec();
        Err(LaunchError::io(
            format!("cannot execute {}", cmd.program.to_string_lossy()),
            err,
        ))
    }

    #[cfg(not(unix))]
    fn launch(&self, cmd: LaunchCommand) -> Result<i32, LaunchError> {
        PrintEvalLauncher::run(&cmd)
    }
}

/// Two-phase launch: run the resolver with `LUNA_PRINT=1 LUNA_NO_EXEC=1` so it
/// prints the command it would have run, then run that command and relay its
/// status. `Stage::Terminal` commands are simply run and their status relayed.
#[derive(Debug, Default)]
pub struct PrintEvalLauncher;

impl PrintEvalLauncher {
    fn run(cmd: &LaunchCommand) -> Result<i32, LaunchError> {
        let status = cmd.to_command().status().map_err(|e| {
            LaunchError::io(
                format!("cannot execute {}", cmd.program.to_string_lossy()),
                e,
            )
        })?;
        Ok(status.code().unwrap_or(1))
    }

    fn second_phase(printed: &str) -> Result<LaunchCommand, LaunchError> {
        let line = printed
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .ok_or_else(|| LaunchError::Message("resolver printed no command".to_string()))?;
        let mut words = shell_like_split_args(line).into_iter();
        let program = words
            .next()
            .ok_or_else(|| LaunchError::Message("resolver printed no command".to_string()))?;
        Ok(LaunchCommand::new(program).args(words))
    }
}

impl ProcessLauncher for PrintEvalLauncher {
    fn launch(&self, cmd: LaunchCommand) -> Result<i32, LaunchError> {
        if cmd.stage == Stage::Terminal {
            return Self::run(&cmd);
        }

        let mut req = ExecRequest::new(&cmd.program)
            .args(&cmd.args)
            .capture_stdout(true)
            .env(ENV_PRINT, Some("1".into()))
            .env(ENV_NO_EXEC, Some("1".into()));
        if let Some(ref cwd) = cmd.cwd {
            req = req.cwd(cwd);
        }
        for (k, v) in cmd.env.iter() {
            req = req.env(k, v.clone());
        }

        let out = ExecService::default()
            .run(req)
            .map_err(|e| LaunchError::from_anyhow(&e))?;
        if !out.status.success() {
            return Ok(out.status.code().unwrap_or(1));
        }

        let second = Self::second_phase(&out.stdout)?
            .cwd(cmd.cwd.clone())
            .env(cmd.env.clone());
        Self::run(&second)
    }
}

/// Launcher matching the host's process model.
pub fn for_platform(platform: Platform) -> Box<dyn ProcessLauncher> {
    match platform {
        Platform::Unix => Box::new(ExecLauncher),
        Platform::Windows => Box::new(PrintEvalLauncher),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_changes_last_edit_wins() {
        let mut e = EnvChanges::default();
        e.set("A", "1");
        e.remove("A");
        e.set("B", "2");
        assert_eq!(e.get("A"), Some(None));
        assert_eq!(e.get("B"), Some(Some("2")));
        assert_eq!(e.get("C"), None);
    }

    #[test]
    fn test_second_phase_parses_last_line() {
        let cmd = PrintEvalLauncher::second_phase("# resolving web01\nssh -J 'jump box' web01\n\n")
            .expect("command");
        assert_eq!(cmd.program, OsString::from("ssh"));
        assert_eq!(
            cmd.args,
            vec![
                OsString::from("-J"),
                OsString::from("jump box"),
                OsString::from("web01")
            ]
        );
    }

    #[test]
    fn test_second_phase_rejects_empty_output() {
        assert!(PrintEvalLauncher::second_phase("\n  \n").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_print_eval_runs_printed_command_and_relays_status() {
        let td = tempfile::tempdir().expect("tmpdir");
        let marker = td.path().join("ran");
        let script = format!(
            "if [ \"$LUNA_PRINT\" = 1 ] && [ \"$LUNA_NO_EXEC\" = 1 ]; then echo \"sh -c 'touch {} && exit 7'\"; else exit 99; fi",
            marker.display()
        );
        let code = PrintEvalLauncher
            .launch(
                LaunchCommand::new("sh")
                    .args(["-c", script.as_str()])
                    .stage(Stage::Resolver),
            )
            .expect("launch");
        assert_eq!(code, 7);
        assert!(marker.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_print_eval_relays_resolver_failure() {
        let code = PrintEvalLauncher
            .launch(
                LaunchCommand::new("sh")
                    .args(["-c", "exit 3"])
                    .stage(Stage::Resolver),
            )
            .expect("launch");
        assert_eq!(code, 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_print_eval_terminal_stage_runs_once_without_print_signals() {
        let code = PrintEvalLauncher
            .launch(LaunchCommand::new("sh").args([
                "-c",
                "[ -z \"$LUNA_PRINT\" ] && [ -z \"$LUNA_NO_EXEC\" ] && exit 5; exit 6",
            ]))
            .expect("launch");
        assert_eq!(code, 5);
    }

    #[test]
    fn test_print_eval_missing_program_maps_to_not_found() {
        let err = PrintEvalLauncher
            .launch(LaunchCommand::new("/nonexistent/luna-resolver").stage(Stage::Resolver))
            .unwrap_err();
        assert_eq!(crate::errors::exit_code_for_launch_error(&err), 127);
    }
}
