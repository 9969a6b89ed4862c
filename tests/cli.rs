use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn run_cli<I, S>(table: &Path, args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Command::new(env!("CARGO_BIN_EXE_fdf_converter"))
        .env("RUST_LOG", "off")
        .arg(table)
        .args(args)
        .output()
        .expect("Failed to run fdf_converter")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be a JSON payload")
}

#[test]
fn test_list_clients_prints_json_array() {
    let output = run_cli(&fixtures_path().join("clients.csv"), ["list_clients"]);
    assert!(output.status.success());

    let payload = stdout_json(&output);
    let entries = payload.as_array().expect("array payload");
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["original_index"], 2);
    assert_eq!(entries[0]["display_name"], "Smith, Anna");
    assert_eq!(entries[2]["original_index"], 0);
}

#[test]
fn test_convert_client_prints_file_name() {
    let out = TempDir::new().expect("Failed to create temp dir");
    let output = run_cli(
        &fixtures_path().join("clients.csv"),
        [OsStr::new("convert_client"), out.path().as_os_str(), OsStr::new("2")],
    );
    assert!(output.status.success());

    let payload = stdout_json(&output);
    let name = payload["fdf_filename"].as_str().expect("fdf_filename");
    assert!(name.starts_with("Smith_Anna_"));
    assert!(out.path().join(name).exists());
}

#[test]
fn test_convert_client_out_of_range_exits_with_one() {
    let out = TempDir::new().expect("Failed to create temp dir");

    for index in ["3", "-1", "x"] {
        let output = run_cli(
            &fixtures_path().join("clients.csv"),
            [OsStr::new("convert_client"), out.path().as_os_str(), OsStr::new(index)],
        );
        assert_eq!(output.status.code(), Some(1), "index {}", index);
        assert!(output.stdout.is_empty());

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains(index), "stderr should name {}: {}", index, stderr);
    }
}

#[test]
fn test_convert_all_to_zip_empty_table_creates_no_archive() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let zip_path = dir.path().join("all.zip");

    let output = run_cli(
        &fixtures_path().join("header_only.csv"),
        [
            OsStr::new("convert_all_to_zip"),
            dir.path().as_os_str(),
            zip_path.as_os_str(),
        ],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(!zip_path.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_convert_all_to_zip_reports_archive() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let zip_path = dir.path().join("all.zip");

    let output = run_cli(
        &fixtures_path().join("clients.csv"),
        [
            OsStr::new("convert_all_to_zip"),
            dir.path().as_os_str(),
            zip_path.as_os_str(),
        ],
    );
    assert!(output.status.success());

    let payload = stdout_json(&output);
    assert_eq!(payload["zip_filename"], "all.zip");
    assert_eq!(payload["fdf_count"], 3);
    // Only the archive is left behind
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_generate_empty_fdf_prints_file_name() {
    let out = TempDir::new().expect("Failed to create temp dir");
    let output = run_cli(
        &fixtures_path().join("clients.csv"),
        [OsStr::new("generate_empty_fdf"), out.path().as_os_str()],
    );
    assert!(output.status.success());

    let payload = stdout_json(&output);
    let name = payload["fdf_filename"].as_str().expect("fdf_filename");
    assert!(out.path().join(name).exists());
}

#[test]
fn test_missing_table_exits_with_one() {
    let output = run_cli(&fixtures_path().join("missing.csv"), ["list_clients"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.csv"));
}
