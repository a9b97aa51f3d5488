//! Drop an activated Python virtualenv from the environment handed to the
//! resolver, so it runs under the system interpreter instead of whatever the
//! user's shell happens to have activated.

use crate::config::{EnvironmentSnapshot, ENV_PYTHONHOME, ENV_VIRTUAL_ENV};
use crate::launcher::EnvChanges;

const PATH_SEP: char = ':';

/// Outcome of a sanitizer pass that actually changed something.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sanitized {
    /// The directory that was removed from `PATH`.
    pub removed: String,
    pub path: String,
}

impl Sanitized {
    /// Environment edits to apply to the next process generation.
    pub fn changes(&self) -> EnvChanges {
        let mut changes = EnvChanges::default();
        changes.set("PATH", &self.path);
        changes.remove(ENV_VIRTUAL_ENV);
        changes.remove(ENV_PYTHONHOME);
        changes
    }
}

/// Inspect `snapshot` and, when a virtualenv is active and its `bin` directory
/// is on `PATH`, return the cleaned-up `PATH`. Returns `None` otherwise.
pub fn sanitize(snapshot: &EnvironmentSnapshot) -> Option<Sanitized> {
    let venv = snapshot.virtual_env.as_deref().filter(|v| !v.is_empty())?;
    let path = snapshot.path.as_deref()?;
    let bin = format!("{}/bin", venv.trim_end_matches('/'));
    let cleaned = remove_path_segment(path, &bin)?;
    Some(Sanitized {
        removed: bin,
        path: cleaned,
    })
}

/// Remove the first segment of a colon-delimited list equal to `segment`.
///
/// Returns `None` when `segment` is absent. Other segments (including empty
/// ones, which mean "current directory" to a shell) keep their order.
pub fn remove_path_segment(path: &str, segment: &str) -> Option<String> {
    let parts: Vec<&str> = path.split(PATH_SEP).collect();
    let idx = parts.iter().position(|p| *p == segment)?;
    let rest: Vec<&str> = parts
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != idx)
        .map(|(_, p)| *p)
        .collect();
    Some(rest.join(&PATH_SEP.to_string()))
}
