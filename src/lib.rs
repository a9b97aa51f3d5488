//! Luna: a thin ssh launcher that routes connections through a zone-aware
//! resolver and regenerates ssh configuration from the zone definition.
//!
//! Architecture
//! - Binary glue (src/main.rs) parses the CLI, builds the context and picks a launcher.
//! - config: immutable InvocationContext read once from the environment (and luna.env).
//! - dispatch / install: decide the terminal action for `connect` and `install`.
//! - launcher: how a command is finally run (exec, or print-then-eval on Windows shells).
//! - sanitize, stamp, notice: environment scrubbing, zone revision stamp, stderr notices.
//!
//! Environment invariants
//! - LUNA_DIRECT: recursion guard. Present means "connect now"; managed handoffs set it to 1.
//! - LUNA_MUTE: presence silences every notice.
//! - LUNA_COLOR / NO_COLOR: color control; message text is identical either way.
//! - LUNA_PRINT / LUNA_NO_EXEC: set for the first phase of a print-then-eval handoff.

pub mod color;
pub mod config;
pub mod dispatch;
pub mod doctor;
pub mod errors;
pub mod install;
pub mod launcher;
pub mod lock;
pub mod notice;
pub mod sanitize;
pub mod stamp;
#[cfg(feature = "debug-log")]
pub mod telemetry;
pub mod util;

pub use color::*;
pub use config::{
    lookup_from_map, DiscoveryOption, EnvironmentSnapshot, InvocationContext, LaunchRequest, Mode,
    Platform, Target,
};
pub use dispatch::{connect, resolve_client};
pub use doctor::{doctor_report, run_doctor, DoctorReport};
pub use errors::*;
pub use install::{copy_into_place, install, install_at, parse_install_args, InstallPlan};
pub use launcher::{
    for_platform as launcher_for_platform, EnvChanges, ExecLauncher, LaunchCommand,
    PrintEvalLauncher, ProcessLauncher, Stage,
};
pub use lock::{acquire_output_lock, lock_path_for, OutputLock};
pub use notice::{Action, Notifier};
pub use sanitize::{remove_path_segment, sanitize, Sanitized};
pub use stamp::{generated_header, version_stamp};
#[cfg(feature = "debug-log")]
pub use telemetry::telemetry_init;
pub use util::{shell_join, shell_like_split_args};
