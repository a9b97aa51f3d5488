//! Invocation context: everything a single launcher run needs to decide and act,
//! read once from the environment (plus an optional `luna.env` file) at startup.
//!
//! Nothing below the dispatcher reads `std::env` for these values; they are
//! threaded through as an immutable `InvocationContext`.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_SSH: &str = "LUNA_SSH";
pub const ENV_PYTHON: &str = "LUNA_PYTHON";
pub const ENV_RESOLVER: &str = "LUNA_RESOLVER";
pub const ENV_ZONE: &str = "LUNA_ZONE";
pub const ENV_DISCOVER: &str = "LUNA_DISCOVER";
pub const ENV_INPUT: &str = "LUNA_INPUT";
pub const ENV_OUTPUT: &str = "LUNA_OUTPUT";
pub const ENV_HOME: &str = "LUNA_HOME";
pub const ENV_DIRECT: &str = "LUNA_DIRECT";
pub const ENV_MUTE: &str = "LUNA_MUTE";
pub const ENV_PLATFORM: &str = "LUNA_PLATFORM";
pub const ENV_PRINT: &str = "LUNA_PRINT";
pub const ENV_NO_EXEC: &str = "LUNA_NO_EXEC";
pub const ENV_GIT_TIMEOUT: &str = "LUNA_GIT_TIMEOUT";
pub const ENV_VIRTUAL_ENV: &str = "VIRTUAL_ENV";
pub const ENV_PYTHONHOME: &str = "PYTHONHOME";

const DEFAULT_SSH: &str = "ssh";
const DEFAULT_PYTHON: &str = "python3";
const DEFAULT_RESOLVER: &str = "luna.py";
const DEFAULT_ZONE: &str = "zone.ini";
const DEFAULT_INPUT: &str = "config";
const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(5);
const DOTENV_FILE: &str = "luna.env";

/// How a process gets replaced on this host.
#[derive(Copy, Clone, PartialEq, Eq, Debug, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// In-place `exec`; nothing of the launcher survives.
    Unix,
    /// No `exec`: the resolver prints the final command and we run it.
    Windows,
}

impl Platform {
    fn detect(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup(ENV_PLATFORM) {
            match v.trim().to_ascii_lowercase().as_str() {
                "windows" | "windows_nt" | "nt" => return Platform::Windows,
                "unix" | "posix" => return Platform::Unix,
                _ => {}
            }
        }
        if lookup("OS").as_deref() == Some("Windows_NT") || cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

/// The two states of the recursion protocol. `Managed` always hands off with
/// the recursion flag set, so the next generation is `Direct`; `Direct` never
/// transitions further.
#[derive(Copy, Clone, PartialEq, Eq, Debug, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Managed,
    Direct,
}

/// Value forwarded to the resolver as `-i` in connect mode.
///
/// The flag is always emitted: an empty value switches off the resolver's
/// default host discovery from `./config`, which an omitted flag would leave on.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DiscoveryOption {
    Disabled,
    Input(String),
}

impl DiscoveryOption {
    fn from_env(v: Option<String>) -> Self {
        match v {
            Some(s) if !s.is_empty() => DiscoveryOption::Input(s),
            _ => DiscoveryOption::Disabled,
        }
    }

    pub fn as_arg(&self) -> &str {
        match self {
            DiscoveryOption::Disabled => "",
            DiscoveryOption::Input(s) => s,
        }
    }
}

/// The part of the environment the sanitizer is allowed to touch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    pub path: Option<String>,
    pub virtual_env: Option<String>,
    pub python_home: Option<String>,
}

impl EnvironmentSnapshot {
    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        Self {
            path: lookup("PATH"),
            virtual_env: lookup(ENV_VIRTUAL_ENV),
            python_home: lookup(ENV_PYTHONHOME),
        }
    }
}

#[derive(Clone, Debug)]
pub struct InvocationContext {
    pub mode: Mode,
    pub mute: bool,
    pub platform: Platform,
    pub ssh: String,
    pub python: String,
    pub resolver: PathBuf,
    pub zone: PathBuf,
    pub discover: DiscoveryOption,
    pub input: PathBuf,
    pub output: PathBuf,
    pub home: PathBuf,
    /// Working directory the launcher was started in.
    pub cwd: PathBuf,
    pub git_timeout: Duration,
    pub env: EnvironmentSnapshot,
}

impl InvocationContext {
    /// Build from the process environment, after merging `$LUNA_HOME/luna.env`.
    /// Variables already present in the environment take precedence over the file.
    pub fn from_env() -> Self {
        let home = launcher_home(std::env::var(ENV_HOME).ok());
        let _ = dotenvy::from_path(home.join(DOTENV_FILE));
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::from_lookup(
            |k| std::env::var_os(k).map(|v| v.to_string_lossy().into_owned()),
            &cwd,
        )
    }

    /// Deterministic constructor for tests: `lookup` stands in for the environment.
    pub fn from_lookup<F>(lookup: F, cwd: &Path) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let nonempty = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());
        let home = launcher_home(nonempty(ENV_HOME));
        let home = absolutize(&home, cwd);

        let resolver = nonempty(ENV_RESOLVER)
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(DEFAULT_RESOLVER));
        let zone = nonempty(ENV_ZONE)
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(DEFAULT_ZONE));
        let output = nonempty(ENV_OUTPUT)
            .map(PathBuf::from)
            .unwrap_or_else(default_output);
        let git_timeout = nonempty(ENV_GIT_TIMEOUT)
            .and_then(|s| humantime::parse_duration(s.trim()).ok())
            .unwrap_or(DEFAULT_GIT_TIMEOUT);

        let mode = if lookup(ENV_DIRECT).is_some() {
            Mode::Direct
        } else {
            Mode::Managed
        };

        Self {
            mode,
            mute: lookup(ENV_MUTE).is_some(),
            platform: Platform::detect(&lookup),
            ssh: nonempty(ENV_SSH).unwrap_or_else(|| DEFAULT_SSH.to_string()),
            python: nonempty(ENV_PYTHON).unwrap_or_else(|| DEFAULT_PYTHON.to_string()),
            resolver: absolutize(&resolver, cwd),
            zone: absolutize(&zone, cwd),
            discover: DiscoveryOption::from_env(lookup(ENV_DISCOVER)),
            input: nonempty(ENV_INPUT)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT)),
            output,
            home,
            cwd: cwd.to_path_buf(),
            git_timeout,
            env: EnvironmentSnapshot::from_lookup(&lookup),
        }
    }

    pub fn is_direct(&self) -> bool {
        self.mode == Mode::Direct
    }
}

/// Which mode of operation the user asked for.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Target {
    Connect,
    Install,
}

/// One invocation's arguments, exactly as received (minus the launcher's own
/// subcommand token).
#[derive(Clone, Debug)]
pub struct LaunchRequest {
    pub target: Target,
    pub args: Vec<OsString>,
}

impl LaunchRequest {
    pub fn new<I, S>(target: Target, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            target,
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

fn launcher_home(explicit: Option<String>) -> PathBuf {
    if let Some(h) = explicit.filter(|s| !s.trim().is_empty()) {
        return PathBuf::from(h);
    }
    std::env::current_exe()
        .ok()
        .map(|p| std::fs::canonicalize(&p).unwrap_or(p))
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_output() -> PathBuf {
    home::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ssh")
        .join("config")
}

pub(crate) fn absolutize(p: &Path, base: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

/// Snapshot of a fixed map, handy for building contexts in tests.
pub fn lookup_from_map(map: HashMap<String, String>) -> impl Fn(&str) -> Option<String> {
    move |k| map.get(k).cloned()
}
