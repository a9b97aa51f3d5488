use std::path::Path;
use std::process::Command;

/// `git describe` of the source tree being built, if it is a checkout.
fn source_revision(manifest_dir: &Path) -> Option<String> {
    let out = Command::new("git")
        .arg("-C")
        .arg(manifest_dir)
        .args(["describe", "--always", "--dirty", "--tags"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let rev = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!rev.is_empty()).then_some(rev)
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=LUNA_BUILD_REVISION");

    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let manifest_dir = Path::new(&manifest_dir);
    let head = manifest_dir.join(".git").join("HEAD");
    if head.exists() {
        println!("cargo:rerun-if-changed={}", head.display());
    }

    // Packagers building from a tarball can pin the revision explicitly.
    let revision = std::env::var("LUNA_BUILD_REVISION")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| source_revision(manifest_dir))
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=LUNA_BUILD_REVISION={revision}");

    for (key, var) in [("LUNA_BUILD_TARGET", "TARGET"), ("LUNA_BUILD_PROFILE", "PROFILE")] {
        let value = std::env::var(var).unwrap_or_else(|_| "unknown".to_string());
        println!("cargo:rustc-env={key}={value}");
    }
}
