// CLI entry point tests

mod common;

use std::process::Command;

fn cargo_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pdf_editor"))
}

// ============================================================
// 1. No arguments shows usage and exits with failure
// ============================================================

#[test]
fn test_main_no_args_shows_usage() {
    let output = cargo_bin().output().expect("failed to execute binary");

    assert!(
        !output.status.success(),
        "should exit with failure when no args given"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Usage"),
        "stderr should contain 'Usage', got: {stderr}"
    );
}

// ============================================================
// 2. --help flag shows usage and exits with success
// ============================================================

#[test]
fn test_main_help_flag() {
    let output = cargo_bin()
        .arg("--help")
        .output()
        .expect("failed to execute binary");

    assert!(
        output.status.success(),
        "should exit with success for --help"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("remove-elements"),
        "usage should list commands, got: {stderr}"
    );
}

// ============================================================
// 3. --version flag shows version and exits with success
// ============================================================

#[test]
fn test_main_version_flag() {
    let output = cargo_bin()
        .arg("--version")
        .output()
        .expect("failed to execute binary");

    assert!(
        output.status.success(),
        "should exit with success for --version"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    let version = env!("CARGO_PKG_VERSION");
    assert!(
        stderr.contains(version),
        "stderr should contain version '{version}', got: {stderr}"
    );
}

// ============================================================
// 4. Argument errors
// ============================================================

#[test]
fn test_main_unknown_command() {
    let output = cargo_bin()
        .arg("frobnicate")
        .output()
        .expect("failed to execute binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("ERROR") && stderr.contains("frobnicate"),
        "got: {stderr}"
    );
}

#[test]
fn test_main_unknown_option() {
    let output = cargo_bin()
        .args(["analyze", "in.pdf", "--bogus", "x"])
        .output()
        .expect("failed to execute binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--bogus"), "got: {stderr}");
}

#[test]
fn test_main_invalid_element_type() {
    let output = cargo_bin()
        .args(["remove-elements", "in.pdf", "out.pdf", "--type", "text"])
        .output()
        .expect("failed to execute binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid element type"), "got: {stderr}");
}

// ============================================================
// 5. Nonexistent settings file produces error
// ============================================================

#[test]
fn test_main_nonexistent_settings_file() {
    let unique_path = std::env::temp_dir().join(format!(
        "nonexistent_settings_{}.yaml",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system clock error")
            .as_nanos()
    ));
    let output = cargo_bin()
        .arg("--settings")
        .arg(unique_path.as_os_str())
        .args(["resave", "in.pdf", "out.pdf"])
        .output()
        .expect("failed to execute binary");

    assert!(
        !output.status.success(),
        "should exit with failure for nonexistent settings file"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("ERROR"),
        "stderr should contain error message, got: {stderr}"
    );
}

// ============================================================
// 6. End-to-end analyze through the scripted toolkit
// ============================================================

#[cfg(unix)]
#[test]
fn test_main_analyze_writes_json() {
    let fake = common::FakeTool::new();
    fake.set_page_count(3);
    fake.set_listing(&common::listing(&common::repeated(
        "Image-1", 100, 1..=3, 800, 600, "120KB",
    )));
    let input = fake.document("in.pdf", b"%PDF-1.7 source");
    let analysis_path = fake.path().join("analysis.json");

    let settings = fake.settings();
    let settings_path = fake.path().join("settings.yaml");
    std::fs::write(
        &settings_path,
        format!("tool: {}\ntool_args: [\"{}\"]\n", settings.tool, settings.tool_args[0]),
    )
    .expect("write settings");

    let output = cargo_bin()
        .arg("--settings")
        .arg(&settings_path)
        .arg("analyze")
        .arg(&input)
        .arg("--output")
        .arg(&analysis_path)
        .output()
        .expect("failed to execute binary");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "analyze failed: {stderr}");

    let json = std::fs::read_to_string(&analysis_path).expect("analysis written");
    let report = pdf_editor::analysis::UnwantedElementsAnalysis::from_json(&json).expect("valid json");
    assert_eq!(report.total_pages, 3);
    assert_eq!(report.image_candidates[0].id, "fullpage_watermark_Image_120KB");
    assert_eq!(report.document_digest.len(), 64);
}
