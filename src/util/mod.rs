#![allow(clippy::module_name_repetitions)]
//! Small utilities: shell quoting for notices, shell-like splitting of printed commands.

pub mod exec;

use std::ffi::OsStr;

/// Join words into a single POSIX-sh line (lossy for non-UTF-8 words).
pub fn shell_join<S: AsRef<OsStr>>(args: &[S]) -> String {
    args.iter()
        .map(|a| shell_escape(&a.as_ref().to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escape a single shell word safely for POSIX sh.
pub fn shell_escape(s: &str) -> String {
    if s.is_empty() {
        "''".to_string()
    } else if s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-_=./:@,+%".contains(c))
    {
        s.to_string()
    } else {
        let escaped = s.replace('\'', "'\"'\"'");
        format!("'{}'", escaped)
    }
}

/// Split a command line the way a shell would for simple quoting: whitespace
/// separates words, single and double quotes group. Empty quoted words are kept.
pub fn shell_like_split_args(s: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut quoted = false;

    for ch in s.chars() {
        match ch {
            '\'' if !in_double => {
                in_single = !in_single;
                quoted = true;
            }
            '"' if !in_single => {
                in_double = !in_double;
                quoted = true;
            }
            c if c.is_whitespace() && !in_single && !in_double => {
                if !current.is_empty() || quoted {
                    out.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() || quoted {
        out.push(current);
    }
    out
}
