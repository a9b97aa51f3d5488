use std::ffi::OsString;
use std::process::ExitCode;

use clap::Parser;
use luna::{
    connect, display_for_launch_error, exit_code_for_launch_error, install, launcher_for_platform,
    log_error_stderr, InvocationContext, LaunchError, LaunchRequest, Notifier, Target,
};

mod cli;
use cli::{Cli, Command};

fn dispatch(request: &LaunchRequest) -> Result<i32, LaunchError> {
    let ctx = InvocationContext::from_env();
    let notifier = Notifier::stderr(ctx.mute);
    let launcher = launcher_for_platform(ctx.platform);
    match request.target {
        Target::Connect => connect(request, &ctx, launcher.as_ref(), &notifier),
        Target::Install => install(request, &ctx, launcher.as_ref(), &notifier),
    }
}

fn finish(result: Result<i32, LaunchError>) -> ExitCode {
    match result {
        Ok(code) => ExitCode::from((code & 0xff) as u8),
        Err(e) => {
            let use_err = luna::color_enabled_stderr();
            log_error_stderr(use_err, &format!("luna: {}", display_for_launch_error(&e)));
            ExitCode::from(exit_code_for_launch_error(&e))
        }
    }
}

fn main() -> ExitCode {
    #[cfg(feature = "debug-log")]
    luna::telemetry_init();

    let argv: Vec<OsString> = std::env::args_os().collect();

    // Installed as `ssh`, `luna-ssh` or `luna-install`: every argument belongs
    // to the target, so clap never sees them.
    if let Some(target) = argv.first().and_then(|a0| cli::target_from_argv0(a0)) {
        return finish(dispatch(&LaunchRequest::new(target, argv.into_iter().skip(1))));
    }

    let cli = Cli::parse_from(argv);
    if let Some(mode) = cli.color {
        luna::set_color_mode(mode);
    }

    match cli.command {
        Command::Connect { args } => finish(dispatch(&LaunchRequest::new(Target::Connect, args))),
        Command::Install { args } => finish(dispatch(&LaunchRequest::new(Target::Install, args))),
        Command::Doctor { json } => {
            let ctx = InvocationContext::from_env();
            match luna::run_doctor(&ctx, json) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => finish(Err(LaunchError::from_anyhow(&e))),
            }
        }
    }
}
