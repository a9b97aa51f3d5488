//! Version stamp for generated files: the short git revision of the zone
//! definition's repository, plus the header line that carries it.

use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::util::exec::{ExecRequest, ExecService};

const HEADER_TAG: &str = "~~~ luna";
const HEADER_NOTICE: &str = "~~~ GENERATED, DO NOT EDIT ~~~";

/// Short revision of HEAD for the repository containing `zone_file`.
///
/// Any failure (no git, not a work tree, no commits, timeout) yields `None`.
pub fn version_stamp(zone_file: &Path, timeout: Duration) -> Option<String> {
    run_rev_parse(rev_parse_request(zone_file), timeout)
}

fn rev_parse_request(zone_file: &Path) -> ExecRequest {
    let dir = match zone_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    ExecRequest::new("git")
        .arg("-C")
        .arg(dir)
        .args(["rev-parse", "--short", "HEAD"])
        .capture_stdout(true)
        .quiet_stderr(true)
}

fn run_rev_parse(req: ExecRequest, timeout: Duration) -> Option<String> {
    let out = ExecService::new(timeout).run(req).ok()?;
    if !out.status.success() {
        return None;
    }
    let rev = out.stdout.trim();
    if rev.is_empty() || rev.contains(char::is_whitespace) {
        None
    } else {
        Some(rev.to_string())
    }
}

/// One-line header written at the top of a generated ssh_config.
pub fn generated_header(stamp: Option<&str>, at: SystemTime) -> String {
    let mut header = format!("# {HEADER_TAG}");
    if let Some(rev) = stamp {
        header.push_str(" @ ");
        header.push_str(rev);
    }
    header.push_str(" at ");
    header.push_str(&humantime::format_rfc3339_seconds(at).to_string());
    header.push(' ');
    header.push_str(HEADER_NOTICE);
    header
}
