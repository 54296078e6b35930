mod common;

use common::{fixture_path, overcheck};

const GOOD_UNIT: &str = r#"{
    "classes": [
        {
            "name": "Job",
            "interfaces": [{"kind": "named", "name": "Runnable"}],
            "members": [
                {"name": "run", "kind": "method", "ret": {"kind": "named", "name": "void"}, "declared_override": true}
            ]
        }
    ]
}"#;

fn write_unit(dir: &tempfile::TempDir, json: &str) -> std::path::PathBuf {
    let path = dir.path().join("unit.json");
    std::fs::write(&path, json).unwrap();
    path
}

#[test]
fn fixture_exits_with_error() {
    let output = overcheck()
        .arg("check")
        .arg(fixture_path("fixture_test.json"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("error[unresolved_name] Test: Cannot resolve name 'A'"),
        "unexpected output: {stdout}"
    );
}

#[test]
fn conforming_unit_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let unit = write_unit(&dir, GOOD_UNIT);
    let output = overcheck().arg("check").arg(&unit).output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("note[conforms] Job.run: Overrides 'run(): void' from 'Runnable'"));
}

#[test]
fn json_output() {
    let output = overcheck()
        .args(["check", "--format", "json"])
        .arg(fixture_path("fixture_test.json"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let diagnostics: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let first = &diagnostics.as_array().unwrap()[0];
    assert_eq!(first["kind"], "unresolved_name");
    assert_eq!(first["severity"], "error");
    assert_eq!(first["class"], "Test");
    assert_eq!(first["span"]["start"], 55);
}

#[test]
fn annotated_output_with_source() {
    let output = overcheck()
        .arg("check")
        .arg(fixture_path("fixture_test.json"))
        .arg("--source")
        .arg(fixture_path("Test.java"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Cannot resolve name"), "stderr: {stderr}");
}

#[test]
fn no_prelude_flag_hides_builtins() {
    let dir = tempfile::tempdir().unwrap();
    let unit = write_unit(&dir, GOOD_UNIT);
    let output = overcheck().arg("check").arg(&unit).arg("--no-prelude").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("error[unresolved_interface] Job: Cannot resolve interface 'Runnable'"));
}

#[test]
fn config_is_discovered_next_to_unit() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("overcheck.toml"), "[checker]\nprelude = false\n").unwrap();
    let unit = write_unit(&dir, GOOD_UNIT);
    let output = overcheck().arg("check").arg(&unit).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("unresolved_interface"));
}

#[test]
fn bad_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("custom.toml");
    std::fs::write(&config, "[checker]\nstrictness = 11\n").unwrap();
    let unit = write_unit(&dir, GOOD_UNIT);
    let output = overcheck().arg("check").arg(&unit).arg("--config").arg(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Config error: failed to parse config"));
}

#[test]
fn malformed_unit_is_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let unit = write_unit(&dir, "{\"classes\": [{\"kind\": \"class\"}]}");
    let output = overcheck().arg("check").arg(&unit).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Input error: invalid compilation unit"));
}

#[test]
fn hierarchy_dump() {
    let dir = tempfile::tempdir().unwrap();
    let unit = write_unit(&dir, GOOD_UNIT);
    let output = overcheck().arg("hierarchy").arg(&unit).arg("Job").output().unwrap();
    assert!(output.status.success());
    let hierarchy: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let run = &hierarchy["inherited"]["run"]["candidates"][0];
    assert_eq!(run["origin"]["name"], "Runnable");
    assert_eq!(run["sig"]["name"], "run");
    assert_eq!(hierarchy["ancestors"].as_array().unwrap().len(), 1);
}

#[test]
fn fingerprint_is_stable() {
    let run = || {
        let output = overcheck()
            .arg("fingerprint")
            .arg(fixture_path("fixture_test.json"))
            .output()
            .unwrap();
        assert!(output.status.success());
        String::from_utf8_lossy(&output.stdout).to_string()
    };
    let first = run();
    assert_eq!(first, run());
    let lines: Vec<_> = first.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("  Test"));
    assert_eq!(lines[0].split_whitespace().next().unwrap().len(), 64);
}
