mod common;

use common::{luna, stderr};

#[test]
fn test_cli_doctor_exits_zero() {
    let td = tempfile::tempdir().expect("tmpdir");
    let out = luna(td.path())
        .arg("doctor")
        .output()
        .expect("failed to run luna doctor");
    assert!(
        out.status.success(),
        "luna doctor exited non-zero: {:?}\nstderr:\n{}",
        out.status.code(),
        stderr(&out)
    );
    assert!(stderr(&out).contains("doctor: completed diagnostics."));
}

#[test]
fn test_cli_doctor_json_reports_context() {
    let td = tempfile::tempdir().expect("tmpdir");
    std::fs::write(td.path().join("zone.ini"), "[home]\n").unwrap();
    let out = luna(td.path())
        .env("LUNA_DIRECT", "1")
        .env("LUNA_DISCOVER", "hosts.cfg")
        .args(["doctor", "--json"])
        .output()
        .expect("failed to run luna doctor --json");
    assert!(out.status.success(), "stderr:\n{}", stderr(&out));

    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("doctor json");
    assert_eq!(v["mode"], "direct");
    assert_eq!(v["discover"], "hosts.cfg");
    assert_eq!(v["zone"]["exists"], true);
    assert_eq!(v["resolver"]["exists"], false);
    assert_eq!(v["version"], env!("CARGO_PKG_VERSION"));
    let revision = v["build"]["revision"].as_str().unwrap_or_default();
    assert!(!revision.is_empty(), "{v}");

    let human = luna(td.path())
        .arg("doctor")
        .output()
        .expect("failed to run luna doctor");
    let version_line = format!("v{} ({revision})", env!("CARGO_PKG_VERSION"));
    assert!(stderr(&human).contains(&version_line), "stderr:\n{}", stderr(&human));
}
