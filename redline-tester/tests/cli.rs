use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "redline-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_writes_json_report_for_each_career() {
    let exe = env!("CARGO_BIN_EXE_redline-tester");
    let output_path = temp_path("run.json");
    let status = Command::new(exe)
        .args([
            "--seeds",
            "1,2",
            "--strategies",
            "cautious,balanced",
            "--races",
            "20",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    assert_eq!(report["careers"], 4);
    assert_eq!(report["passed"], 4);
}

#[test]
fn cli_commits_profiles_to_save_dir() {
    let exe = env!("CARGO_BIN_EXE_redline-tester");
    let save_dir = temp_path("saves");
    let output = Command::new(exe)
        .args(["--seeds", "9", "--races", "5", "--report", "markdown", "--save-dir"])
        .arg(&save_dir)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# Redline Career Simulation Results"));
    let saved = std::fs::read_to_string(save_dir.join("seed-9-balanced.json")).expect("saved profile");
    assert!(saved.contains("\"id\": \"seed-9-balanced\""));
}

#[test]
fn cli_rejects_bad_seeds() {
    let exe = env!("CARGO_BIN_EXE_redline-tester");
    let output = Command::new(exe)
        .args(["--seeds", "not-a-seed"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid seed"));
}
