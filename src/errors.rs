//! Error mapping guide:
//! - Map io::ErrorKind::NotFound to exit code 127 and PermissionDenied to 126,
//!   mirroring what a POSIX shell reports for a command it cannot run.
//! - Usage errors (bad install flags) exit with 2; everything else with 1.
//! - Messages are rendered with display_for_launch_error; keep strings stable.
use std::fmt;
use std::io;

/// Map an io::Error to a process exit code:
/// - 127 for NotFound (command not found)
/// - 126 for PermissionDenied (found but not executable)
/// - 1 for all other errors
pub fn exit_code_for_io_error(e: &io::Error) -> u8 {
    match e.kind() {
        io::ErrorKind::NotFound => 127,
        io::ErrorKind::PermissionDenied => 126,
        _ => 1,
    }
}

/// Failures that abort an invocation before (or instead of) its terminal handoff.
#[derive(Debug)]
pub enum LaunchError {
    /// An OS-level failure, optionally tagged with what was being attempted.
    Io {
        context: String,
        source: io::Error,
    },
    /// Bad command-line usage (e.g. `-o` without a value).
    Usage(String),
    Message(String),
}

impl LaunchError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        LaunchError::Io {
            context: context.into(),
            source,
        }
    }

    /// Keep the io::ErrorKind of the root cause (for exit-code mapping) while
    /// carrying the full context chain in the message.
    pub fn from_anyhow(e: &anyhow::Error) -> Self {
        match e.root_cause().downcast_ref::<io::Error>() {
            Some(ioe) => LaunchError::Io {
                context: String::new(),
                source: io::Error::new(ioe.kind(), format!("{e:#}")),
            },
            None => LaunchError::Message(format!("{e:#}")),
        }
    }
}

impl From<io::Error> for LaunchError {
    fn from(e: io::Error) -> Self {
        LaunchError::Io {
            context: String::new(),
            source: e,
        }
    }
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&display_for_launch_error(self))
    }
}

impl std::error::Error for LaunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LaunchError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convert LaunchError to exit code (parity with io::Error mapping).
pub fn exit_code_for_launch_error(e: &LaunchError) -> u8 {
    match e {
        LaunchError::Io { source, .. } => exit_code_for_io_error(source),
        LaunchError::Usage(_) => 2,
        LaunchError::Message(_) => 1,
    }
}

/// Render a user-facing string for LaunchError.
pub fn display_for_launch_error(e: &LaunchError) -> String {
    match e {
        LaunchError::Io { context, source } if context.is_empty() => source.to_string(),
        LaunchError::Io { context, source } => format!("{context}: {source}"),
        LaunchError::Usage(s) => format!("usage: {s}"),
        LaunchError::Message(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_shell_conventions() {
        let nf = io::Error::new(io::ErrorKind::NotFound, "nope");
        let pd = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let other = io::Error::other("boom");
        assert_eq!(exit_code_for_io_error(&nf), 127);
        assert_eq!(exit_code_for_io_error(&pd), 126);
        assert_eq!(exit_code_for_io_error(&other), 1);
        assert_eq!(
            exit_code_for_launch_error(&LaunchError::Usage("-o".into())),
            2
        );
        assert_eq!(
            exit_code_for_launch_error(&LaunchError::io("exec ssh", nf)),
            127
        );
    }

    #[test]
    fn test_display_includes_context() {
        let e = LaunchError::io(
            "cannot read config",
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert_eq!(
            display_for_launch_error(&e),
            "cannot read config: No such file or directory"
        );
        assert_eq!(LaunchError::Message("x".into()).to_string(), "x");
    }

    #[test]
    fn test_from_anyhow_keeps_io_kind() {
        let e = anyhow::Error::new(io::Error::new(io::ErrorKind::NotFound, "gone"))
            .context("failed to spawn \"python3\"");
        let le = LaunchError::from_anyhow(&e);
        assert_eq!(exit_code_for_launch_error(&le), 127);
        assert!(le.to_string().contains("failed to spawn"), "{le}");

        let plain = LaunchError::from_anyhow(&anyhow::anyhow!("timed out"));
        assert_eq!(exit_code_for_launch_error(&plain), 1);
    }
}
