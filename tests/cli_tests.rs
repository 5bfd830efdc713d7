//! Integration tests for the CLI application
//!
//! These tests verify that the CLI commands work correctly with real data files.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::{NamedTempFile, TempDir};

/// Helper to create test data files
struct TestDataFiles {
    pub train_file: NamedTempFile,
    pub test_file: NamedTempFile,
    pub stream_file: NamedTempFile,
}

impl TestDataFiles {
    fn new() -> std::io::Result<Self> {
        let mut train_file = NamedTempFile::with_suffix(".libsvm")?;
        writeln!(train_file, "+1 1:2.0 2:1.0")?;
        writeln!(train_file, "-1 1:-2.0 2:-1.0")?;
        writeln!(train_file, "+1 1:1.5 2:0.8")?;
        writeln!(train_file, "-1 1:-1.5 2:-0.8")?;
        writeln!(train_file, "+1 1:1.8 2:0.9")?;
        writeln!(train_file, "-1 1:-1.8 2:-0.9")?;
        train_file.flush()?;

        let mut test_file = NamedTempFile::with_suffix(".libsvm")?;
        writeln!(test_file, "+1 1:1.6 2:0.7")?;
        writeln!(test_file, "-1 1:-1.6 2:-0.7")?;
        test_file.flush()?;

        let mut stream_file = NamedTempFile::with_suffix(".libsvm")?;
        for i in 0..40 {
            let shift = (i % 7) as f64 * 0.1;
            if i % 2 == 0 {
                writeln!(stream_file, "+1 1:{} 2:{}", 1.0 + shift, 1.2 - shift)?;
            } else {
                writeln!(stream_file, "-1 1:{} 2:{}", -1.0 - shift, -0.8 + shift)?;
            }
        }
        stream_file.flush()?;

        Ok(TestDataFiles {
            train_file,
            test_file,
            stream_file,
        })
    }
}

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lasvm"))
        .args(args)
        .output()
        .expect("Failed to run CLI binary")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are valid UTF-8")
}

fn train_model(data: &Path, model: &Path, extra: &[&str]) -> Output {
    let mut args = vec!["train", "--data", path_str(data), "--output", path_str(model)];
    args.extend_from_slice(extra);
    run_cli(&args)
}

#[test]
fn test_cli_train_command() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");

    let output = train_model(
        test_data.train_file.path(),
        &model_path,
        &["-k", "linear", "-C", "1.0", "--tau", "0.001", "--max-iter", "20"],
    );

    assert!(
        output.status.success(),
        "Train command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(model_path.exists(), "Model file was not created");
}

#[test]
fn test_cli_train_selection_policies() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    for selection in ["cyclic", "active", "loss"] {
        let model_path = temp_dir.path().join(format!("model_{selection}.json"));
        let output = train_model(
            test_data.stream_file.path(),
            &model_path,
            &["--selection", selection, "--random-state", "3"],
        );
        assert!(
            output.status.success(),
            "Train with {selection} selection failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        assert!(model_path.exists());
    }
}

#[test]
fn test_cli_train_n_components() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");

    let output = train_model(
        test_data.stream_file.path(),
        &model_path,
        &["--n-components", "2"],
    );
    assert!(output.status.success());

    let info_output = run_cli(&["info", path_str(&model_path)]);
    assert!(info_output.status.success());
    let stdout = String::from_utf8_lossy(&info_output.stdout);
    assert!(stdout.contains("Support Vectors: 2"));
    assert!(stdout.contains("Target Components: 2"));
}

#[test]
fn test_cli_train_in_chunks() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");

    let output = train_model(
        test_data.stream_file.path(),
        &model_path,
        &["--chunks", "4", "--verbose"],
    );

    assert!(
        output.status.success(),
        "Chunked training failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Chunk 4/4"));
    assert!(model_path.exists());
}

/// Files sorted by label still train in chunks since the rows are shuffled
#[test]
fn test_cli_train_in_chunks_label_sorted() {
    let mut sorted_file = NamedTempFile::with_suffix(".libsvm").expect("Failed to create temp file");
    for i in 0..40 {
        let shift = (i % 7) as f64 * 0.1;
        if i < 20 {
            writeln!(sorted_file, "+1 1:{} 2:{}", 1.0 + shift, 1.2 - shift).unwrap();
        } else {
            writeln!(sorted_file, "-1 1:{} 2:{}", -1.0 - shift, -0.8 + shift).unwrap();
        }
    }
    sorted_file.flush().unwrap();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");

    let output = train_model(
        sorted_file.path(),
        &model_path,
        &["--chunks", "4", "-k", "linear", "--verbose"],
    );

    assert!(
        output.status.success(),
        "Chunked training failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Chunk 4/4"));
    assert!(model_path.exists());
}

#[test]
fn test_cli_error_handling_oversized_cache() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");

    let cache_size = usize::MAX.to_string();
    let output = train_model(
        test_data.train_file.path(),
        &model_path,
        &["--cache-size", cache_size.as_str()],
    );
    assert!(!output.status.success());
    assert!(!model_path.exists());
}

#[test]
fn test_cli_info_command() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");

    let train_output = train_model(test_data.train_file.path(), &model_path, &[]);
    assert!(train_output.status.success());

    let info_output = run_cli(&["info", path_str(&model_path)]);
    assert!(
        info_output.status.success(),
        "Info command failed: {}",
        String::from_utf8_lossy(&info_output.stderr)
    );

    let stdout = String::from_utf8_lossy(&info_output.stdout);
    assert!(stdout.contains("LaSVM Model Summary"));
    assert!(stdout.contains("Support Vector Details"));
    assert!(stdout.contains("Coefficients"));
}

#[test]
fn test_cli_predict_command() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");
    let predictions_path = temp_dir.path().join("predictions.txt");

    let train_output = train_model(test_data.train_file.path(), &model_path, &["-k", "linear"]);
    assert!(train_output.status.success());

    let output = run_cli(&[
        "predict",
        "--model",
        path_str(&model_path),
        "--data",
        path_str(test_data.test_file.path()),
        "--output",
        path_str(&predictions_path),
    ]);
    assert!(
        output.status.success(),
        "Predict command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let contents = std::fs::read_to_string(&predictions_path).expect("Failed to read predictions");
    let lines: Vec<&str> = contents.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(lines, vec!["0 1", "1 -1"]);
}

#[test]
fn test_cli_predict_with_confidence() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");

    let train_output = train_model(test_data.train_file.path(), &model_path, &[]);
    assert!(train_output.status.success());

    let output = run_cli(&[
        "predict",
        "--model",
        path_str(&model_path),
        "--data",
        path_str(test_data.test_file.path()),
        "--confidence",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("confidence"));
    for line in stdout.lines().filter(|l| !l.starts_with('#')) {
        assert_eq!(line.split_whitespace().count(), 3, "unexpected line: {line}");
    }
}

#[test]
fn test_cli_evaluate_detailed() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");

    let train_output = train_model(test_data.train_file.path(), &model_path, &["-k", "linear"]);
    assert!(train_output.status.success());

    let output = run_cli(&[
        "evaluate",
        "--model",
        path_str(&model_path),
        "--data",
        path_str(test_data.test_file.path()),
        "--detailed",
    ]);
    assert!(
        output.status.success(),
        "Evaluate command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Accuracy: 100.00%"));
    assert!(stdout.contains("F1 Score:        1.0000"));
}

#[test]
fn test_cli_error_handling_invalid_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");

    let output = train_model(Path::new("/non/existent/file.libsvm"), &model_path, &[]);
    assert!(!output.status.success());
    assert!(!model_path.exists());
}

#[test]
fn test_cli_error_handling_single_class() {
    let mut data = NamedTempFile::with_suffix(".libsvm").expect("Failed to create temp file");
    writeln!(data, "+1 1:1.0").unwrap();
    writeln!(data, "+1 1:2.0").unwrap();
    data.flush().unwrap();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");

    let output = train_model(data.path(), &model_path, &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error"));
}

#[test]
fn test_cli_error_handling_invalid_chunks() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");

    let output = train_model(test_data.train_file.path(), &model_path, &["--chunks", "0"]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_train_with_unknown_extension() {
    let mut data = NamedTempFile::with_suffix(".data1").expect("Failed to create temp file");
    writeln!(data, "+1 1:1.0").unwrap();
    writeln!(data, "-1 1:-1.0").unwrap();
    data.flush().unwrap();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");

    let output = train_model(data.path(), &model_path, &[]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("assuming LibSVM format"));
}

#[test]
fn test_cli_help_output() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("train"));
    assert!(stdout.contains("predict"));
    assert!(stdout.contains("evaluate"));
    assert!(stdout.contains("info"));
}

#[test]
fn test_cli_version_output() {
    let output = run_cli(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}
