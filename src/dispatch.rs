//! `connect`: either run the real ssh client right away (direct mode) or hand
//! the command line to the resolver, which works out jump hosts and then
//! re-enters this launcher in direct mode to connect.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[cfg(feature = "debug-log")]
use tracing::instrument;

use crate::config::{InvocationContext, LaunchRequest, ENV_DIRECT};
use crate::errors::LaunchError;
use crate::launcher::{EnvChanges, LaunchCommand, ProcessLauncher, Stage};
use crate::notice::{Action, Notifier};
use crate::sanitize::sanitize;
use crate::stamp::version_stamp;
use crate::util::shell_join;

/// Locate the ssh client, skipping our own executable when the launcher is
/// installed on `PATH` under the client's name.
pub fn resolve_client(ssh: &str) -> OsString {
    let me = std::env::current_exe()
        .ok()
        .and_then(|p| std::fs::canonicalize(p).ok());
    resolve_client_excluding(ssh, me.as_deref())
}

pub fn resolve_client_excluding(ssh: &str, exclude: Option<&Path>) -> OsString {
    if Path::new(ssh).components().count() > 1 {
        return OsString::from(ssh);
    }
    let found = which::which_all(ssh)
        .ok()
        .and_then(|candidates| pick_client(candidates, exclude));
    match found {
        Some(p) => p.into_os_string(),
        None => OsString::from(ssh),
    }
}

fn pick_client(
    mut candidates: impl Iterator<Item = PathBuf>,
    exclude: Option<&Path>,
) -> Option<PathBuf> {
    candidates.find(|c| match exclude {
        Some(me) => std::fs::canonicalize(c).map_or(true, |c| c != me),
        None => true,
    })
}

/// Base command for the resolver: `python3 luna.py` for a Python entry point,
/// the entry point itself otherwise.
pub(crate) fn resolver_command(ctx: &InvocationContext) -> Result<LaunchCommand, LaunchError> {
    if !ctx.resolver.is_file() {
        return Err(LaunchError::io(
            format!("resolver not found at {}", ctx.resolver.display()),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        ));
    }
    let is_python = ctx
        .resolver
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("py"));
    if is_python {
        return Ok(LaunchCommand::new(&ctx.python).arg(&ctx.resolver));
    }
    ensure_executable(&ctx.resolver)?;
    Ok(LaunchCommand::new(&ctx.resolver))
}

#[cfg(unix)]
fn ensure_executable(path: &Path) -> Result<(), LaunchError> {
    use nix::unistd::{access, AccessFlags};

    access(path, AccessFlags::X_OK).map_err(|errno| {
        LaunchError::io(
            format!("resolver at {} is not executable", path.display()),
            std::io::Error::from(errno),
        )
    })
}

#[cfg(not(unix))]
fn ensure_executable(_path: &Path) -> Result<(), LaunchError> {
    Ok(())
}

pub(crate) fn require_zone(ctx: &InvocationContext) -> Result<(), LaunchError> {
    if ctx.zone.is_file() {
        Ok(())
    } else {
        Err(LaunchError::Message(format!(
            "zone definition not found at {}",
            ctx.zone.display()
        )))
    }
}

/// Sanitize, stamp, and arm the recursion guard: the environment edits every
/// managed-mode handoff carries. Runs once per invocation.
pub(crate) fn prepare_managed(
    ctx: &InvocationContext,
    notifier: &Notifier,
) -> (EnvChanges, Option<String>) {
    let mut env = EnvChanges::default();
    if let Some(s) = sanitize(&ctx.env) {
        notifier.notice(Action::Sanitized, &format!("dropped {} from PATH", s.removed));
        env.extend(s.changes());
    }
    let stamp = version_stamp(&ctx.zone, ctx.git_timeout);
    #[cfg(feature = "debug-log")]
    tracing::debug!(stamp = ?stamp, zone = %ctx.zone.display(), "version stamp");
    env.set(ENV_DIRECT, "1");
    (env, stamp)
}

pub(crate) fn with_stamp(detail: String, stamp: Option<&str>) -> String {
    match stamp {
        Some(rev) => format!("{detail} (zone @ {rev})"),
        None => detail,
    }
}

/// Run one `connect` invocation to its terminal action.
#[cfg_attr(
    feature = "debug-log",
    instrument(level = "debug", skip_all, fields(mode = ?ctx.mode, argc = request.args.len()))
)]
pub fn connect(
    request: &LaunchRequest,
    ctx: &InvocationContext,
    launcher: &dyn ProcessLauncher,
    notifier: &Notifier,
) -> Result<i32, LaunchError> {
    if ctx.is_direct() {
        let cmd = LaunchCommand::new(resolve_client(&ctx.ssh)).args(&request.args);
        notifier.notice(Action::Direct, &shell_join(&cmd.argv()));
        return launcher.launch(cmd);
    }

    let base = resolver_command(ctx)?;
    require_zone(ctx)?;
    let (env, stamp) = prepare_managed(ctx, notifier);

    notifier.notice(
        Action::Connecting,
        &with_stamp(shell_join(&request.args), stamp.as_deref()),
    );

    let cmd = base
        .args([
            OsString::from("-x"),
            OsString::from(&ctx.ssh),
            OsString::from("-z"),
            ctx.zone.clone().into_os_string(),
            OsString::from("-i"),
            OsString::from(ctx.discover.as_arg()),
        ])
        .args(&request.args)
        .env(env)
        .stage(Stage::Resolver);
    launcher.launch(cmd)
}
