//! Exit-status tests for the `verify-dataset` and `run-benchmark` binaries

use image::RgbaImage;
use std::path::Path;
use std::process::{Command, Output};

fn run(bin: &str, args: &[&Path]) -> Output {
    Command::new(bin)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

// =============================================================================
// verify-dataset
// =============================================================================

fn dataset(root: &Path) {
    std::fs::create_dir_all(root.join("images/train")).unwrap();
    std::fs::create_dir_all(root.join("labels/train")).unwrap();
    std::fs::write(root.join("data.yaml"), "train: images/train\nnames: [car]\n").unwrap();
}

#[test]
fn test_verify_exits_zero_when_overlay_rendered() {
    let dir = tempfile::tempdir().unwrap();
    dataset(dir.path());
    RgbaImage::new(16, 16)
        .save(dir.path().join("images/train/a.png"))
        .unwrap();
    std::fs::write(dir.path().join("labels/train/a.txt"), "0 0.5 0.5 0.5 0.5\n").unwrap();
    let out = dir.path().join("overlays");

    let output = Command::new(env!("CARGO_BIN_EXE_verify-dataset"))
        .arg(dir.path().join("data.yaml"))
        .args(["--samples", "3", "--seed", "1", "--out"])
        .arg(&out)
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(out.join("Check__a.png.png").is_file());
}

#[test]
fn test_verify_fails_when_nothing_renders() {
    let dir = tempfile::tempdir().unwrap();
    dataset(dir.path());
    std::fs::write(dir.path().join("images/train/bad.jpg"), b"not a jpeg").unwrap();

    let output = run(
        env!("CARGO_BIN_EXE_verify-dataset"),
        &[&dir.path().join("data.yaml")],
    );
    assert!(!output.status.success());
}

#[test]
fn test_verify_fails_on_missing_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(
        env!("CARGO_BIN_EXE_verify-dataset"),
        &[&dir.path().join("data.yaml")],
    );
    assert!(!output.status.success());
}

// =============================================================================
// run-benchmark
// =============================================================================

#[cfg(unix)]
const BRIDGE: &str = r#"
case "$1" in
  train)
    if [ "$3" = "missing.pt" ]; then echo "weights not found" >&2; exit 1; fi
    echo '{"weights": "best.pt"}' ;;
  evaluate)
    echo '{"map50": 0.7, "map50_95": 0.4, "precision": 0.8, "recall": 0.6}' ;;
  *) exit 1 ;;
esac
"#;

#[cfg(unix)]
fn session(dir: &Path, models: &str) -> std::path::PathBuf {
    std::fs::write(dir.join("data.yaml"), "train: images/train\n").unwrap();
    std::fs::write(dir.join("bridge.sh"), BRIDGE).unwrap();
    let path = dir.join("session.yaml");
    std::fs::write(
        &path,
        format!(
            "session: cli\ndataset: data.yaml\noutput: results.csv\n\
             models:\n{models}\
             trainer:\n  program: sh\n  args: [bridge.sh]\n"
        ),
    )
    .unwrap();
    path
}

#[cfg(unix)]
#[test]
fn test_benchmark_exits_zero_when_export_written() {
    let dir = tempfile::tempdir().unwrap();
    let config = session(dir.path(), "  Good: yolov8n.pt\n  Bad: missing.pt\n");

    let output = run(env!("CARGO_BIN_EXE_run-benchmark"), &[&config]);
    assert!(output.status.success());

    let csv = std::fs::read_to_string(dir.path().join("cli/results.csv")).unwrap();
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.contains("Good,0.7000"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("1/2 runs succeeded"));
}

#[cfg(unix)]
#[test]
fn test_benchmark_fails_when_every_run_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = session(dir.path(), "  Bad: missing.pt\n");

    let output = run(env!("CARGO_BIN_EXE_run-benchmark"), &[&config]);
    assert!(!output.status.success());
    assert!(!dir.path().join("cli/results.csv").exists());
}

#[cfg(unix)]
#[test]
fn test_benchmark_dry_run_trains_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = session(dir.path(), "  Good: yolov8n.pt\n");

    let output = Command::new(env!("CARGO_BIN_EXE_run-benchmark"))
        .arg(&config)
        .arg("--dry-run")
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("1. Good (yolov8n.pt)"));
    assert!(!dir.path().join("cli").exists());
}
