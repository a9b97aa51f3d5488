use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use wait_timeout::ChildExt;

/// Run a child to completion, optionally capturing stdout and bounding runtime.
///
/// stdin and stderr are always inherited so the user still sees prompts and
/// diagnostics from the child.
#[derive(Debug, Clone)]
pub struct ExecService {
    timeout: Duration,
}

impl ExecService {
    /// A zero timeout waits indefinitely.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn run(&self, request: ExecRequest) -> Result<ExecOutput> {
        let mut cmd = request.command();
        if request.capture_stdout {
            cmd.stdout(Stdio::piped());
        }
        if request.quiet_stderr {
            cmd.stderr(Stdio::null());
        }

        let mut child = cmd.spawn().with_context(|| {
            format!(
                "failed to spawn {:?} with args {:?}",
                request.program, request.args
            )
        })?;

        let timeout = self.timeout;
        let (status, stdout) = if timeout.is_zero() {
            // Unbounded: drain first so a chatty child cannot fill the pipe and stall.
            let stdout = read_stream(child.stdout.as_mut())?;
            let status = child.wait().context("failed to wait for process")?;
            (status, stdout)
        } else {
            // Bounded runs only capture short answers; the pipe buffer holds them.
            match child
                .wait_timeout(timeout)
                .context("failed to wait with timeout")?
            {
                Some(status) => (status, read_stream(child.stdout.as_mut())?),
                None => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(anyhow!(
                        "command {:?} timed out after {:?}",
                        request.program,
                        timeout
                    ));
                }
            }
        };

        Ok(ExecOutput { status, stdout })
    }
}

fn read_stream(stream: Option<&mut impl io::Read>) -> Result<String> {
    let mut buf = String::new();
    if let Some(reader) = stream {
        reader
            .read_to_string(&mut buf)
            .context("failed to read process output")?;
    }
    Ok(buf)
}

impl Default for ExecService {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[derive(Debug, Default, Clone)]
pub struct ExecRequest {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    env: Vec<(OsString, Option<OsString>)>,
    capture_stdout: bool,
    quiet_stderr: bool,
}

impl ExecRequest {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
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

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// `None` removes the variable from the child's environment.
    pub fn env(mut self, key: impl Into<OsString>, value: Option<OsString>) -> Self {
        self.env.push((key.into(), value));
        self
    }

    pub fn capture_stdout(mut self, capture: bool) -> Self {
        self.capture_stdout = capture;
        self
    }

    pub fn quiet_stderr(mut self, quiet: bool) -> Self {
        self.quiet_stderr = quiet;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &self.env {
            match value {
                Some(v) => cmd.env(key, v),
                None => cmd.env_remove(key),
            };
        }
        cmd
    }
}

#[derive(Debug)]
pub struct ExecOutput {
    pub status: ExitStatus,
    pub stdout: String,
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_capture_stdout_and_env_override() {
        let out = ExecService::default()
            .run(
                ExecRequest::new("sh")
                    .args(["-c", "printf '%s' \"$LUNA_T\""])
                    .env("LUNA_T", Some("v1".into()))
                    .capture_stdout(true),
            )
            .expect("run sh");
        assert!(out.status.success());
        assert_eq!(out.stdout, "v1");
    }

    #[test]
    fn test_env_remove() {
        let out = ExecService::default()
            .run(
                ExecRequest::new("sh")
                    .args(["-c", "printf '%s' \"${HOME-unset}\""])
                    .env("HOME", None)
                    .capture_stdout(true),
            )
            .expect("run sh");
        assert_eq!(out.stdout, "unset");
    }

    #[test]
    fn test_timeout_kills_child() {
        let err = ExecService::new(Duration::from_millis(100))
            .run(ExecRequest::new("sh").args(["-c", "sleep 5"]))
            .unwrap_err();
        assert!(err.to_string().contains("timed out"), "{err}");
    }

    #[test]
    fn test_missing_program_keeps_io_kind() {
        let err = ExecService::default()
            .run(ExecRequest::new("/nonexistent/luna-test-binary"))
            .unwrap_err();
        let io = err.root_cause().downcast_ref::<io::Error>().expect("io cause");
        assert_eq!(io.kind(), io::ErrorKind::NotFound);
    }
}
