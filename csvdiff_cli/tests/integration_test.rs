use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Helper struct to manage test directories
struct TestFixture {
    _temp_dir: TempDir,
    left_dir: PathBuf,
    right_dir: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with left and right directories
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let left_dir = temp_dir.path().join("left");
        let right_dir = temp_dir.path().join("right");

        fs::create_dir(&left_dir).expect("Failed to create left dir");
        fs::create_dir(&right_dir).expect("Failed to create right dir");

        TestFixture {
            _temp_dir: temp_dir,
            left_dir,
            right_dir,
        }
    }

    /// Create a file with content in the left directory
    fn create_left_file<P: AsRef<Path>>(&self, path: P, content: &str) -> PathBuf {
        self.create_file(&self.left_dir, path, content)
    }

    /// Create a file with content in the right directory
    fn create_right_file<P: AsRef<Path>>(&self, path: P, content: &str) -> PathBuf {
        self.create_file(&self.right_dir, path, content)
    }

    /// Create a file with content in the specified base directory
    fn create_file<P: AsRef<Path>>(&self, base: &Path, path: P, content: &str) -> PathBuf {
        let file_path = base.join(path.as_ref());
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    /// Write a `.csvdiff` options file in the left directory
    fn write_left_options(&self, content: &str) -> PathBuf {
        self.create_file(&self.left_dir, ".csvdiff", content)
    }

    /// Path for a report file outside both comparison directories
    fn report_path(&self, name: &str) -> PathBuf {
        self._temp_dir.path().join(name)
    }

    /// Get the left directory path
    fn left(&self) -> &Path {
        &self.left_dir
    }

    /// Get the right directory path
    fn right(&self) -> &Path {
        &self.right_dir
    }
}

/// Helper to run the CLI binary. The working directory is a fresh temp
/// directory so no stray `.csvdiff` can leak into the run.
fn run_cli(args: &[&str]) -> std::process::Output {
    let exe = env!("CARGO_BIN_EXE_csvdiff");
    let work_dir = TempDir::new().expect("Failed to create work dir");
    Command::new(exe)
        .args(args)
        .current_dir(work_dir.path())
        .output()
        .expect("Failed to execute command")
}

/// Helper to run CLI and expect success
fn run_cli_success(args: &[&str]) -> std::process::Output {
    let output = run_cli(args);
    if !output.status.success() {
        eprintln!("STDOUT:\n{}", String::from_utf8_lossy(&output.stdout));
        eprintln!("STDERR:\n{}", String::from_utf8_lossy(&output.stderr));
        panic!("Command failed with status: {}", output.status);
    }
    output
}

#[test]
fn test_identical_files() {
    let fixture = TestFixture::new();
    let left = fixture.create_left_file("data.csv", "id,qty\n1,10\n2,20\n");
    let right = fixture.create_right_file("data.csv", "id,qty\n1,10\n2,20\n");

    let output = run_cli_success(&["diff", left.to_str().unwrap(), right.to_str().unwrap()]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Comparing"));
    assert!(stdout.contains("Found 0 differences"));
}

#[test]
fn test_updated_row_reported() {
    let fixture = TestFixture::new();
    let left = fixture.create_left_file("data.csv", "id,qty\n1,10\n2,20\n");
    let right = fixture.create_right_file("data.csv", "id,qty\n1,10\n2,25\n");

    let output = run_cli_success(&["diff", left.to_str().unwrap(), right.to_str().unwrap()]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Found 1 differences: 1 Updates"));
}

#[test]
fn test_added_and_deleted_rows() {
    let fixture = TestFixture::new();
    let left = fixture.create_left_file("data.csv", "id,qty\n1,10\n2,20\n");
    let right = fixture.create_right_file("data.csv", "id,qty\n1,10\n3,30\n");

    let output = run_cli_success(&["diff", left.to_str().unwrap(), right.to_str().unwrap()]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 Adds"));
    assert!(stdout.contains("1 Deletes"));
}

#[test]
fn test_directory_comparison_skips_unpaired() {
    let fixture = TestFixture::new();
    fixture.create_left_file("x.csv", "id\n1\n");
    fixture.create_left_file("y.csv", "id\n1\n");
    fixture.create_right_file("x.csv", "id\n1\n");

    let output = run_cli_success(&[
        "diff",
        fixture.left().to_str().unwrap(),
        fixture.right().to_str().unwrap(),
    ]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("x.csv"));
    assert!(stdout.contains("no corresponding file"));
}

#[test]
fn test_exclude_flag() {
    let fixture = TestFixture::new();
    fixture.create_left_file("a.csv", "id\n1\n");
    fixture.create_left_file("b.csv", "id\n1\n");
    fixture.create_right_file("a.csv", "id\n1\n");
    fixture.create_right_file("b.csv", "id\n1\n");

    let output = run_cli_success(&[
        "diff",
        fixture.left().to_str().unwrap(),
        fixture.right().to_str().unwrap(),
        "--exclude",
        "b*.csv",
    ]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("a.csv"));
    assert!(!stdout.contains("b.csv"));
}

#[test]
fn test_options_file_defaults_applied() {
    let fixture = TestFixture::new();
    fixture.write_left_options("defaults:\n  ignore: true\n");
    fixture.create_left_file("data.csv", "id\n1\n");
    fixture.create_right_file("data.csv", "id\n2\n");

    let output = run_cli_success(&[
        "diff",
        fixture.left().to_str().unwrap(),
        fixture.right().to_str().unwrap(),
    ]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Using options from"));
    assert!(stdout.contains("Ignoring"));
    assert!(!stdout.contains("Found"));
}

#[test]
fn test_file_types_selector() {
    let fixture = TestFixture::new();
    fixture.write_left_options(
        "file_types:\n  sales:\n    pattern: \"sales*.csv\"\n  reports:\n    pattern: \"*.txt\"\n",
    );
    fixture.create_left_file("sales_jan.csv", "id,v\n1,a\n");
    fixture.create_right_file("sales_jan.csv", "id,v\n1,b\n");
    fixture.create_left_file("notes.txt", "id\n1\n");
    fixture.create_right_file("notes.txt", "id\n1\n");

    let output = run_cli_success(&[
        "diff",
        fixture.left().to_str().unwrap(),
        fixture.right().to_str().unwrap(),
        "--file-types",
        "sales",
    ]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sales_jan.csv"));
    assert!(!stdout.contains("notes.txt"));
    assert!(stdout.contains("Found 1 differences: 1 Updates"));
}

#[test]
fn test_key_fields_flag() {
    let fixture = TestFixture::new();
    let left = fixture.create_left_file("data.csv", "name,id\nalice,1\n");
    let right = fixture.create_right_file("data.csv", "name,id\nbob,1\n");

    let output = run_cli_success(&[
        "diff",
        left.to_str().unwrap(),
        right.to_str().unwrap(),
        "--key-fields",
        "id",
    ]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Found 1 differences: 1 Updates"));
}

#[test]
fn test_ignore_fields_flag() {
    let fixture = TestFixture::new();
    let left = fixture.create_left_file("data.csv", "id,updated_at\n1,2024-01-01\n");
    let right = fixture.create_right_file("data.csv", "id,updated_at\n1,2024-06-30\n");

    let output = run_cli_success(&[
        "diff",
        left.to_str().unwrap(),
        right.to_str().unwrap(),
        "--ignore-fields",
        "updated_at",
    ]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Found 0 differences"));
}

#[test]
fn test_case_insensitive_flag() {
    let fixture = TestFixture::new();
    let left = fixture.create_left_file("data.csv", "id,v\n1,abc\n");
    let right = fixture.create_right_file("data.csv", "id,v\n1,ABC\n");

    let output = run_cli_success(&[
        "diff",
        left.to_str().unwrap(),
        right.to_str().unwrap(),
        "--case-insensitive",
    ]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Found 0 differences"));
}

#[test]
fn test_text_report_written() {
    let fixture = TestFixture::new();
    let left = fixture.create_left_file("data.csv", "id,qty\n1,10\n");
    let right = fixture.create_right_file("data.csv", "id,qty\n1,12\n");
    let report = fixture.report_path("report.txt");

    let output = run_cli_success(&[
        "diff",
        left.to_str().unwrap(),
        right.to_str().unwrap(),
        "--output",
        report.to_str().unwrap(),
    ]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Report saved to"));

    let content = fs::read_to_string(&report).expect("report file missing");
    assert!(content.contains("CSV Diff Report"));
    assert!(content.contains("Update '1'"));
}

#[test]
fn test_html_report_written() {
    let fixture = TestFixture::new();
    let left = fixture.create_left_file("data.csv", "id,qty\n1,10\n");
    let right = fixture.create_right_file("data.csv", "id,qty\n1,12\n");
    let report = fixture.report_path("report.html");

    run_cli_success(&[
        "diff",
        left.to_str().unwrap(),
        right.to_str().unwrap(),
        "--output",
        report.to_str().unwrap(),
    ]);

    let content = fs::read_to_string(&report).expect("report file missing");
    assert!(content.starts_with("<!DOCTYPE html>"));
}

#[test]
fn test_excel_report_written() {
    let fixture = TestFixture::new();
    let left = fixture.create_left_file("data.csv", "id,qty\n1,10\n");
    let right = fixture.create_right_file("data.csv", "id,qty\n1,12\n");
    let report = fixture.report_path("report.xlsx");

    run_cli_success(&[
        "diff",
        left.to_str().unwrap(),
        right.to_str().unwrap(),
        "--output",
        report.to_str().unwrap(),
    ]);

    let bytes = fs::read(&report).expect("report file missing");
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn test_format_token_beats_extension() {
    let fixture = TestFixture::new();
    let left = fixture.create_left_file("data.csv", "id\n1\n");
    let right = fixture.create_right_file("data.csv", "id\n1\n");
    let report = fixture.report_path("report.dat");

    run_cli_success(&[
        "diff",
        left.to_str().unwrap(),
        right.to_str().unwrap(),
        "--output",
        report.to_str().unwrap(),
        "--format",
        "text",
    ]);

    let content = fs::read_to_string(&report).expect("report file missing");
    assert!(content.contains("CSV Diff Report"));
}

#[test]
fn test_unsupported_format_fails() {
    let fixture = TestFixture::new();
    let left = fixture.create_left_file("data.csv", "id\n1\n");
    let right = fixture.create_right_file("data.csv", "id\n1\n");
    let report = fixture.report_path("report.json");

    let output = run_cli(&[
        "diff",
        left.to_str().unwrap(),
        right.to_str().unwrap(),
        "--output",
        report.to_str().unwrap(),
        "--format",
        "json",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Diff failed"));
}

#[test]
fn test_mixed_path_kinds_fail() {
    let fixture = TestFixture::new();
    let left = fixture.create_left_file("data.csv", "id\n1\n");

    let output = run_cli(&[
        "diff",
        left.to_str().unwrap(),
        fixture.right().to_str().unwrap(),
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Diff failed"));
}

#[test]
fn test_nonexistent_path_fails() {
    let fixture = TestFixture::new();

    let output = run_cli(&[
        "diff",
        "/nonexistent/path/left.csv",
        fixture.right().to_str().unwrap(),
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Diff failed"));
}

#[test]
fn test_help_flag() {
    let output = run_cli(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Keyed comparison of CSV files"));
    assert!(stdout.contains("diff"));
}

#[test]
fn test_diff_help() {
    let output = run_cli(&["diff", "--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Left file or directory"));
    assert!(stdout.contains("--pattern"));
    assert!(stdout.contains("--file-types"));
    assert!(stdout.contains("--output"));
}

#[test]
fn test_version_flag() {
    let output = run_cli(&["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("csvdiff"));
}

#[test]
fn test_missing_subcommand() {
    let output = run_cli(&[]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage:") || stderr.contains("subcommand"));
}

#[test]
fn test_no_color_when_piped() {
    let fixture = TestFixture::new();
    let left = fixture.create_left_file("data.csv", "id\n1\n");
    let right = fixture.create_right_file("data.csv", "id\n2\n");

    let output = run_cli_success(&["diff", left.to_str().unwrap(), right.to_str().unwrap()]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("\x1b["));
}

#[test]
fn test_duplicate_key_warning_surfaces() {
    let fixture = TestFixture::new();
    let left = fixture.create_left_file("data.csv", "id,v\n1,a\n1,b\n");
    let right = fixture.create_right_file("data.csv", "id,v\n1,a\n");

    let output = run_cli_success(&["diff", left.to_str().unwrap(), right.to_str().unwrap()]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Duplicate key"));
    assert!(stdout.contains("1 Warnings"));
}
