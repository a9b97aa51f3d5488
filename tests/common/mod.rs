#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub fn luna_bin() -> &'static str {
    env!("CARGO_BIN_EXE_luna")
}

pub fn have_sh() -> bool {
    Path::new("/bin/sh").exists()
}

/// `luna` with every LUNA_* knob cleared, home pinned to `home` and colors off.
pub fn luna(home: &Path) -> Command {
    luna_as(Path::new(luna_bin()), home)
}

/// Same as [`luna`], started through another path (e.g. an alias symlink).
pub fn luna_as(program: &Path, home: &Path) -> Command {
    let mut cmd = Command::new(program);
    for (k, _) in std::env::vars_os() {
        if k.to_string_lossy().starts_with("LUNA_") {
            cmd.env_remove(&k);
        }
    }
    cmd.env_remove("VIRTUAL_ENV")
        .env_remove("PYTHONHOME")
        .env("LUNA_HOME", home)
        .env("LUNA_PLATFORM", "unix")
        .env("LUNA_GIT_TIMEOUT", "2s")
        .env("NO_COLOR", "1")
        .current_dir(home);
    cmd
}

/// Write an executable `/bin/sh` script.
#[cfg(unix)]
pub fn write_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let p = dir.join(name);
    std::fs::write(&p, format!("#!/bin/sh\n{body}")).expect("write stub");
    std::fs::set_permissions(&p, std::fs::Permissions::from_mode(0o755)).expect("chmod stub");
    p
}

/// A fake ssh client that records one argument per line into `$LUNA_TEST_ARGS`.
#[cfg(unix)]
pub fn fake_client(dir: &Path) -> PathBuf {
    write_stub(
        dir,
        "fake-ssh",
        "printf '%s\\n' \"$@\" > \"$LUNA_TEST_ARGS\"\nexit \"${LUNA_TEST_STATUS:-0}\"\n",
    )
}

pub fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

pub fn lines(p: &Path) -> Vec<String> {
    std::fs::read_to_string(p)
        .unwrap_or_else(|e| panic!("read {}: {e}", p.display()))
        .lines()
        .map(str::to_string)
        .collect()
}
