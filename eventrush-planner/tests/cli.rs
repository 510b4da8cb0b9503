use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

fn temp_path(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "eventrush-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

#[test]
fn cli_graph_writes_output() {
    let exe = env!("CARGO_BIN_EXE_eventrush-planner");
    let output_path = temp_path("graph");
    let status = Command::new(exe)
        .arg("graph")
        .arg("--game")
        .arg(data("harvest.json"))
        .arg("--output")
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Statue -> 1"));
    assert!(content.contains("Kiln: alternate"));
}

#[test]
fn cli_random_is_reproducible() {
    let exe = env!("CARGO_BIN_EXE_eventrush-planner");
    let run = |label: &str| {
        let output_path = temp_path(label);
        let status = Command::new(exe)
            .args(["random", "--restarts", "2", "--seed", "99", "--switches", "0,0,0,2"])
            .arg("--game")
            .arg(data("harvest.json"))
            .arg("--output")
            .arg(&output_path)
            .status()
            .expect("run cli");
        assert!(status.success());
        std::fs::read_to_string(output_path).expect("read plan")
    };
    let first = run("random-a");
    assert_eq!(first, run("random-b"));
    assert_eq!(first.lines().filter(|l| l.ends_with("cold") || l.ends_with("hot")).count(), 2);
}

#[test]
fn cli_play_exports_the_session() {
    let exe = env!("CARGO_BIN_EXE_eventrush-planner");
    let output_path = temp_path("play");
    let mut child = Command::new(exe)
        .arg("play")
        .arg("--start")
        .arg(data("start.json"))
        .arg("--output")
        .arg(&output_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn cli");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"0\nu\n1\nq\n")
        .expect("write moves");
    let output = child.wait_with_output().expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Eventrush Planner"));
    let csv = std::fs::read_to_string(output_path).expect("read session");
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].contains(",upg #,upgrade,cost,"));
    assert!(rows[1].contains(",1,Sawmill -> 2,"));
}

#[test]
fn cli_reports_a_missing_game() {
    let exe = env!("CARGO_BIN_EXE_eventrush-planner");
    let output = Command::new(exe)
        .args(["score", "plan.txt", "--game"])
        .arg(temp_path("missing.json"))
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load game"));
}
