use std::ffi::{OsStr, OsString};
use std::path::Path;

use clap::{Parser, Subcommand};
use luna::Target;

#[derive(Parser, Debug)]
#[command(
    name = "luna",
    version,
    about = "Connect through zone-aware ssh configuration, or regenerate it."
)]
pub(crate) struct Cli {
    /// Colorize notices: auto|always|never
    #[arg(long = "color", value_enum, global = true)]
    pub color: Option<luna::ColorMode>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Command {
    /// Connect to a host; arguments go to ssh (via the resolver unless LUNA_DIRECT is set)
    #[command(disable_help_flag = true)]
    Connect {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<OsString>,
    },
    /// Regenerate the ssh configuration: [-c DIR] [-i INPUT] [-o OUTPUT] [ARGS...]
    #[command(disable_help_flag = true)]
    Install {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<OsString>,
    },
    /// Show the effective configuration
    Doctor {
        /// Emit machine-readable JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

/// Entry points installed under another name skip the subcommand: `ssh` and
/// `luna-ssh` connect, `luna-install` installs.
pub(crate) fn target_from_argv0(argv0: &OsStr) -> Option<Target> {
    let stem = Path::new(argv0).file_stem()?.to_str()?;
    match stem.to_ascii_lowercase().as_str() {
        "ssh" | "luna-ssh" => Some(Target::Connect),
        "luna-install" => Some(Target::Install),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("parse")
    }

    #[test]
    fn test_argv0_dispatch() {
        assert_eq!(
            target_from_argv0(OsStr::new("/usr/local/bin/ssh")),
            Some(Target::Connect)
        );
        assert_eq!(target_from_argv0(OsStr::new("luna-ssh")), Some(Target::Connect));
        assert_eq!(
            target_from_argv0(OsStr::new("/opt/luna/luna-install.exe")),
            Some(Target::Install)
        );
        assert_eq!(target_from_argv0(OsStr::new("luna-install")), Some(Target::Install));
        assert_eq!(target_from_argv0(OsStr::new("luna")), None);
    }

    #[test]
    fn test_connect_keeps_ssh_flags() {
        let cli = parse(&["luna", "connect", "-p", "2222", "-v", "myhost", "ls", "-la"]);
        match cli.command {
            Command::Connect { args } => assert_eq!(
                args,
                ["-p", "2222", "-v", "myhost", "ls", "-la"]
                    .iter()
                    .map(OsString::from)
                    .collect::<Vec<_>>()
            ),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_install_keeps_flags_for_own_parser() {
        let cli = parse(&["luna", "--color", "never", "install", "-o", "/tmp/out", "-h"]);
        assert_eq!(cli.color, Some(luna::ColorMode::Never));
        match cli.command {
            Command::Install { args } => assert_eq!(
                args,
                ["-o", "/tmp/out", "-h"].iter().map(OsString::from).collect::<Vec<_>>()
            ),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_doctor_json_flag() {
        assert!(matches!(
            parse(&["luna", "doctor", "--json"]).command,
            Command::Doctor { json: true }
        ));
    }
}
