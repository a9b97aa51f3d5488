//! `install`: regenerate the ssh_config from the zone definition through the
//! resolver, or, in direct mode, copy a ready-made input file into place.
//!
//! Leading flags (`-c DIR`, `-i PATH`, `-o PATH`) are consumed in any order;
//! the first other token ends flag parsing and everything from there on is
//! forwarded to the resolver untouched. A non-empty remainder means the caller
//! is really connecting through the install entry point.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[cfg(feature = "debug-log")]
use tracing::instrument;

use crate::config::{absolutize, InvocationContext, LaunchRequest};
use crate::dispatch::{prepare_managed, require_zone, resolver_command, with_stamp};
use crate::errors::LaunchError;
use crate::launcher::{ProcessLauncher, Stage};
use crate::lock::{acquire_output_lock, lock_path_for};
use crate::notice::{Action, Notifier};
use crate::stamp::generated_header;
use crate::util::shell_join;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstallOptions {
    pub chdir: Option<PathBuf>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub rest: Vec<OsString>,
}

pub fn parse_install_args(args: &[OsString]) -> Result<InstallOptions, LaunchError> {
    let mut opts = InstallOptions::default();
    let mut i = 0usize;
    while i < args.len() {
        let slot = match args[i].to_str() {
            Some("-c") => &mut opts.chdir,
            Some("-i") => &mut opts.input,
            Some("-o") => &mut opts.output,
            _ => break,
        };
        let value = args.get(i + 1).ok_or_else(|| {
            LaunchError::Usage(format!(
                "{} requires an argument",
                args[i].to_string_lossy()
            ))
        })?;
        *slot = Some(PathBuf::from(value));
        i += 2;
    }
    opts.rest = args[i..].to_vec();
    Ok(opts)
}

/// Install options with every path resolved against the `-c` directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallPlan {
    pub cwd: Option<PathBuf>,
    pub input: PathBuf,
    pub output: PathBuf,
    pub rest: Vec<OsString>,
}

impl InstallPlan {
    pub fn resolve(opts: InstallOptions, ctx: &InvocationContext) -> Result<Self, LaunchError> {
        let cwd = match opts.chdir {
            Some(dir) => {
                let dir = absolutize(&dir, &ctx.cwd);
                let meta = fs::metadata(&dir).map_err(|e| {
                    LaunchError::Message(format!(
                        "cannot change directory to {}: {e}",
                        dir.display()
                    ))
                })?;
                if !meta.is_dir() {
                    return Err(LaunchError::Message(format!(
                        "cannot change directory to {}: not a directory",
                        dir.display()
                    )));
                }
                Some(dir)
            }
            None => None,
        };
        let anchor = |p: PathBuf| match cwd.as_deref() {
            Some(base) => absolutize(&p, base),
            None => p,
        };
        Ok(Self {
            input: anchor(opts.input.unwrap_or_else(|| ctx.input.clone())),
            output: anchor(opts.output.unwrap_or_else(|| ctx.output.clone())),
            cwd,
            rest: opts.rest,
        })
    }

    pub fn is_connecting(&self) -> bool {
        !self.rest.is_empty()
    }
}

/// Replace `output` with the contents of `input` without ever exposing a
/// half-written file: copy into a sibling temp file, then rename over.
pub fn copy_into_place(input: &Path, output: &Path) -> io::Result<()> {
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    let _lock = acquire_output_lock(&lock_path_for(output))?;

    let mut src = File::open(input)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    io::copy(&mut src, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(output).map_err(|e| e.error)?;
    Ok(())
}

/// Run one `install` invocation to its terminal action.
pub fn install(
    request: &LaunchRequest,
    ctx: &InvocationContext,
    launcher: &dyn ProcessLauncher,
    notifier: &Notifier,
) -> Result<i32, LaunchError> {
    install_at(request, ctx, launcher, notifier, SystemTime::now())
}

#[cfg_attr(
    feature = "debug-log",
    instrument(level = "debug", skip_all, fields(mode = ?ctx.mode, argc = request.args.len()))
)]
pub fn install_at(
    request: &LaunchRequest,
    ctx: &InvocationContext,
    launcher: &dyn ProcessLauncher,
    notifier: &Notifier,
    now: SystemTime,
) -> Result<i32, LaunchError> {
    let plan = InstallPlan::resolve(parse_install_args(&request.args)?, ctx)?;

    if (ctx.is_direct() || !plan.is_connecting()) && !plan.input.is_file() {
        return Err(LaunchError::Message(format!(
            "input file not found at {}",
            plan.input.display()
        )));
    }

    if ctx.is_direct() {
        // Exit codes 126/127 belong to programs that cannot run, not to copies.
        copy_into_place(&plan.input, &plan.output).map_err(|e| {
            LaunchError::Message(format!("cannot install {}: {e}", plan.output.display()))
        })?;
        notifier.notice(
            Action::Direct,
            &format!("{} -> {}", plan.input.display(), plan.output.display()),
        );
        return Ok(0);
    }

    let base = resolver_command(ctx)?;
    require_zone(ctx)?;
    let (env, stamp) = prepare_managed(ctx, notifier);
    let header = generated_header(stamp.as_deref(), now);

    let (action, detail, stage) = if plan.is_connecting() {
        (Action::Connecting, shell_join(&plan.rest), Stage::Resolver)
    } else {
        (
            Action::Generating,
            plan.output.display().to_string(),
            Stage::Terminal,
        )
    };
    notifier.notice(action, &with_stamp(detail, stamp.as_deref()));

    let cmd = base
        .args([
            OsString::from("-H"),
            OsString::from(header),
            OsString::from("-o"),
            plan.output.clone().into_os_string(),
            OsString::from("-i"),
            plan.input.clone().into_os_string(),
            OsString::from("-z"),
            ctx.zone.clone().into_os_string(),
        ])
        .args(plan.rest)
        .cwd(plan.cwd)
        .env(env)
        .stage(stage);
    launcher.launch(cmd)
}
