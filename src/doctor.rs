use std::path::Path;

use serde::Serialize;

use crate::config::{InvocationContext, Mode, Platform};
use crate::dispatch::resolve_client;
use crate::sanitize::sanitize;
use crate::stamp::version_stamp;

/// Effective configuration as the launcher would use it right now.
#[derive(Debug, Serialize)]
pub struct DoctorReport {
    pub version: &'static str,
    pub build: BuildInfo,
    pub mode: Mode,
    pub platform: Platform,
    pub muted: bool,
    pub ssh: String,
    pub python: String,
    pub resolver: PathReport,
    pub zone: PathReport,
    pub zone_revision: Option<String>,
    pub discover: String,
    pub input: String,
    pub output: String,
    pub virtualenv: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BuildInfo {
    pub revision: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PathReport {
    pub path: String,
    pub exists: bool,
}

impl PathReport {
    fn of(p: &Path) -> Self {
        Self {
            path: p.display().to_string(),
            exists: p.is_file(),
        }
    }
}

pub fn doctor_report(ctx: &InvocationContext) -> DoctorReport {
    DoctorReport {
        version: env!("CARGO_PKG_VERSION"),
        build: BuildInfo {
            revision: env!("LUNA_BUILD_REVISION"),
            target: env!("LUNA_BUILD_TARGET"),
            profile: env!("LUNA_BUILD_PROFILE"),
        },
        mode: ctx.mode,
        platform: ctx.platform,
        muted: ctx.mute,
        ssh: resolve_client(&ctx.ssh).to_string_lossy().into_owned(),
        python: ctx.python.clone(),
        resolver: PathReport::of(&ctx.resolver),
        zone: PathReport::of(&ctx.zone),
        zone_revision: version_stamp(&ctx.zone, ctx.git_timeout),
        discover: ctx.discover.as_arg().to_string(),
        input: ctx.input.display().to_string(),
        output: ctx.output.display().to_string(),
        virtualenv: sanitize(&ctx.env).map(|s| s.removed),
    }
}

/// Print the report to stderr (human) or stdout (`--json`).
pub fn run_doctor(ctx: &InvocationContext, json: bool) -> anyhow::Result<()> {
    let r = doctor_report(ctx);
    if json {
        println!("{}", serde_json::to_string_pretty(&r)?);
        return Ok(());
    }

    let use_err = crate::color::color_enabled_stderr();
    let val = |s: &str| crate::color::paint(use_err, "\x1b[34;1m", s);
    let found = |p: &PathReport| {
        if p.exists {
            val(&p.path)
        } else {
            format!("{} {}", val(&p.path), crate::color::paint(use_err, "\x1b[31;1m", "(missing)"))
        }
    };

    eprintln!("luna doctor");
    eprintln!();
    eprintln!("  version:  v{} ({})", r.version, r.build.revision);
    eprintln!("  build:    {} ({})", r.build.target, r.build.profile);
    eprintln!("  platform: {:?}", r.platform);
    eprintln!("  mode:     {:?}{}", r.mode, if r.muted { " (muted)" } else { "" });
    eprintln!();
    eprintln!("  ssh:      {}", val(&r.ssh));
    eprintln!("  python:   {}", val(&r.python));
    eprintln!("  resolver: {}", found(&r.resolver));
    eprintln!("  zone:     {}", found(&r.zone));
    eprintln!(
        "  revision: {}",
        val(r.zone_revision.as_deref().unwrap_or("(none)"))
    );
    eprintln!(
        "  discover: {}",
        val(if r.discover.is_empty() { "(disabled)" } else { &r.discover })
    );
    eprintln!("  input:    {}", val(&r.input));
    eprintln!("  output:   {}", val(&r.output));
    if let Some(v) = r.virtualenv.as_deref() {
        eprintln!("  venv:     {} (dropped before handoff)", val(v));
    }
    eprintln!();
    eprintln!("doctor: completed diagnostics.");
    Ok(())
}
