//! End-to-end tests for depclash CLI
//!
//! These tests verify:
//! - Exit codes for clean, conflicting and malformed plugin sets
//! - CLI produces the expected JSON output schema
//! - Report files and dependency replacement on disk

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn depclash() -> Command {
    let mut cmd = Command::cargo_bin("depclash").expect("Failed to find binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn add_plugin(dir: &Path, name: &str, requirements: &str) {
    let plugin = dir.join(name);
    fs::create_dir_all(&plugin).unwrap();
    fs::write(plugin.join("requirements.txt"), requirements).unwrap();
}

/// Two plugins that agree with each other
fn create_clean_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    add_plugin(dir.path(), "plugin-a", "numpy>=1.24\ntorch\n");
    add_plugin(dir.path(), "plugin-b", "numpy<2\n");
    dir
}

/// Two plugins pinning different versions of the same package
fn create_conflict_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    add_plugin(dir.path(), "ComfyUI-Impact-Pack", "pillow==9.5\nnumpy\n");
    add_plugin(dir.path(), "was-node-suite", "pillow==10.0\n");
    dir
}

mod exit_code_tests {
    use super::*;

    /// Agreeing plugins exit successfully
    #[test]
    fn test_exit_code_clean() {
        let dir = create_clean_dir();
        depclash()
            .args(["check", dir.path().to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("No dependency conflicts found."));
    }

    /// A blocking conflict exits with 1
    #[test]
    fn test_exit_code_conflict() {
        let dir = create_conflict_dir();
        depclash()
            .args(["check", dir.path().to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("CONFLICT"))
            .stdout(predicate::str::contains(
                "ComfyUI-Impact-Pack and was-node-suite cannot both be satisfied",
            ));
    }

    /// An installed version outside the allowed range exits with 2
    #[test]
    fn test_exit_code_violation() {
        let dir = create_clean_dir();
        let freeze = dir.path().join("freeze.txt");
        fs::write(&freeze, "numpy==2.1.0\ntorch==2.1.0+cu121\n").unwrap();

        depclash()
            .args(["check", dir.path().to_str().unwrap(), "--installed"])
            .arg(&freeze)
            .assert()
            .code(2)
            .stdout(predicate::str::contains("VIOLATION"))
            .stdout(predicate::str::contains("installed 2.1.0"));
    }

    /// A malformed line without conflicts exits with 2
    #[test]
    fn test_exit_code_diagnostics_only() {
        let dir = create_clean_dir();
        add_plugin(dir.path(), "plugin-c", "opencv-python>>4\n");

        depclash()
            .args(["check", dir.path().to_str().unwrap()])
            .assert()
            .code(2)
            .stdout(predicate::str::contains("could not be parsed"))
            .stdout(predicate::str::contains("plugin-c"));
    }

    /// A missing plugins directory is a runtime failure
    #[test]
    fn test_exit_code_nonexistent_path() {
        depclash()
            .args(["check", "/nonexistent/path/that/does/not/exist"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("plugins directory not found"));
    }

    /// A subcommand is required
    #[test]
    fn test_exit_code_usage_error() {
        depclash().assert().failure();
    }

    /// Help exits successfully and names both subcommands
    #[test]
    fn test_exit_code_help() {
        depclash()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("check"))
            .stdout(predicate::str::contains("replace"));
    }
}

mod json_output_tests {
    use super::*;

    /// JSON output carries counters, packages and the conflicts list
    #[test]
    fn test_json_output_schema() {
        let dir = create_conflict_dir();
        let output = depclash()
            .args(["check", dir.path().to_str().unwrap(), "--json"])
            .output()
            .expect("Failed to execute command");
        assert_eq!(output.status.code(), Some(1));

        let json: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");
        assert_eq!(json["has_blocking_conflict"], true);
        assert_eq!(json["summary"]["conflicts"], 1);
        assert!(json["generated_at"].is_string());

        let packages = json["packages"].as_array().unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0]["package"], "pillow");
        assert_eq!(packages[0]["conflict_pair"]["first"], "ComfyUI-Impact-Pack");

        let conflicts = json["conflicts"].as_array().unwrap();
        assert_eq!(conflicts[0]["dependency_name"], "pillow");
        assert_eq!(conflicts[0]["conflicting_plugins"].as_array().unwrap().len(), 2);
    }

    /// `--all` includes packages without problems
    #[test]
    fn test_json_output_all() {
        let dir = create_conflict_dir();
        let output = depclash()
            .args(["check", dir.path().to_str().unwrap(), "--json", "--all"])
            .output()
            .expect("Failed to execute command");

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let names: Vec<&str> = json["packages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["package"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["pillow", "numpy"]);
    }

    /// An empty plugins directory yields an empty, clean report
    #[test]
    fn test_json_output_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output = depclash()
            .args(["check", dir.path().to_str().unwrap(), "--json"])
            .output()
            .expect("Failed to execute command");
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["has_blocking_conflict"], false);
        assert!(json["packages"].as_array().unwrap().is_empty());
    }
}

mod cli_options_tests {
    use super::*;

    /// `--output-dir` writes the Markdown and JSON report files
    #[test]
    fn test_output_dir_writes_reports() {
        let dir = create_conflict_dir();
        let out = tempfile::tempdir().unwrap();

        depclash()
            .args(["check", dir.path().to_str().unwrap(), "--quiet", "--output-dir"])
            .arg(out.path())
            .assert()
            .code(1);

        let markdown = fs::read_to_string(out.path().join("conflict_report.md")).unwrap();
        assert!(markdown.contains("## pillow (CONFLICT)"));
        let json = fs::read_to_string(out.path().join("conflict_report.json")).unwrap();
        assert!(json.contains("\"dependency_name\": \"pillow\""));
    }

    /// Markdown output goes to stdout
    #[test]
    fn test_markdown_output() {
        let dir = create_conflict_dir();
        depclash()
            .args(["check", dir.path().to_str().unwrap(), "--markdown"])
            .assert()
            .code(1)
            .stdout(predicate::str::starts_with("# Dependency Conflict Report"));
    }

    /// Ignored packages cannot cause a conflict
    #[test]
    fn test_ignore_package() {
        let dir = create_conflict_dir();
        depclash()
            .args(["check", dir.path().to_str().unwrap(), "--ignore", "Pillow"])
            .assert()
            .success();
    }

    /// The config file in the plugins directory is picked up
    #[test]
    fn test_config_file_ignore() {
        let dir = create_conflict_dir();
        fs::write(dir.path().join("depclash.toml"), "ignore = [\"pillow\"]\n").unwrap();
        depclash()
            .args(["check", dir.path().to_str().unwrap()])
            .assert()
            .success();
    }

    /// JSON snapshot files are accepted by `--installed`
    #[test]
    fn test_installed_json_snapshot() {
        let dir = create_clean_dir();
        let snapshot = dir.path().join("installed.json");
        fs::write(
            &snapshot,
            r#"[{"name": "numpy", "version": "1.26.4"}, {"name": "tqdm", "version": "4.66.1"}]"#,
        )
        .unwrap();

        depclash()
            .args(["check", dir.path().to_str().unwrap(), "--all", "--installed"])
            .arg(&snapshot)
            .assert()
            .success()
            .stdout(predicate::str::contains("UNCONSTRAINED tqdm"));
    }

    /// `--installed` and `--python` are mutually exclusive
    #[test]
    fn test_installed_conflicts_with_python() {
        depclash()
            .args(["check", ".", "--installed", "a.txt", "--python", "python3"])
            .assert()
            .failure();
    }
}

mod replace_tests {
    use super::*;

    /// Dry-run reports matches without touching files
    #[test]
    fn test_replace_dry_run_leaves_files_unchanged() {
        let dir = create_conflict_dir();
        let path = dir.path().join("was-node-suite/requirements.txt");
        let before = fs::read_to_string(&path).unwrap();

        depclash()
            .args([
                "replace",
                dir.path().to_str().unwrap(),
                "pillow",
                "pillow==9.5",
                "--dry-run",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Would replace 2 line(s) in 2 file(s)"));

        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    /// Replacing a pin resolves the conflict
    #[test]
    fn test_replace_resolves_conflict() {
        let dir = create_conflict_dir();
        depclash()
            .args([
                "replace",
                dir.path().to_str().unwrap(),
                "pillow==10.0",
                "pillow==9.5",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Replaced 1 line(s) in 1 file(s)"));

        assert_eq!(
            fs::read_to_string(dir.path().join("was-node-suite/requirements.txt")).unwrap(),
            "pillow==9.5\n"
        );

        depclash()
            .args(["check", dir.path().to_str().unwrap()])
            .assert()
            .success();
    }

    /// An unparsable dependency to replace is a runtime failure
    #[test]
    fn test_replace_invalid_dependency() {
        let dir = create_conflict_dir();
        depclash()
            .args(["replace", dir.path().to_str().unwrap(), "pillow>>1", "pillow"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("invalid dependency"));
    }
}
