/// End-to-end tests for the CLI
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_sbom(dir: &Path, name: &str, repo: &str, component: &str) {
    let document = serde_json::json!({
        "bomFormat": "CycloneDX",
        "specVersion": "1.5",
        "metadata": {"component": {"name": repo}},
        "components": [{"name": component, "version": "1.0.0"}]
    });
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), serde_json::to_vec(&document).unwrap()).unwrap();
}

// Exit code tests for CLI
mod exit_code_tests {
    use super::*;

    /// Exit code 0: --help should return success
    #[test]
    fn test_exit_code_help() {
        cargo_bin_cmd!("sbom-collector")
            .arg("--help")
            .assert()
            .code(0)
            .stdout(predicate::str::contains("--merge"));
    }

    /// Exit code 0: --version should return success
    #[test]
    fn test_exit_code_version() {
        cargo_bin_cmd!("sbom-collector").arg("--version").assert().code(0);
    }

    /// Exit code 2: Invalid arguments
    #[test]
    fn test_exit_code_invalid_argument() {
        cargo_bin_cmd!("sbom-collector")
            .arg("--invalid-option")
            .assert()
            .code(2);
    }

    /// Exit code 2: Invalid output format value
    #[test]
    fn test_exit_code_invalid_format() {
        cargo_bin_cmd!("sbom-collector")
            .args(["--output-format", "swid"])
            .assert()
            .code(2);
    }

    /// Exit code 3: Explicit config file does not exist
    #[test]
    fn test_exit_code_missing_config_file() {
        cargo_bin_cmd!("sbom-collector")
            .args(["--config", "/nonexistent/sbom-collector.config.yml"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Failed to read config file"));
    }

    /// Exit code 3: Nothing configured at all
    #[test]
    fn test_exit_code_no_provider() {
        let temp_dir = TempDir::new().unwrap();
        cargo_bin_cmd!("sbom-collector")
            .current_dir(temp_dir.path())
            .assert()
            .code(3)
            .stderr(predicate::str::contains("No provider configured"));
    }

    /// Exit code 3: Missing secret is named together with its environment variable
    #[test]
    fn test_exit_code_missing_token() {
        let temp_dir = TempDir::new().unwrap();
        let config = temp_dir.path().join("ci.yml");
        fs::write(
            &config,
            "provider: github\ngithub:\n  owner: octo\n  repo: repo\nstorage:\n  local_dir: out\n",
        )
        .unwrap();

        cargo_bin_cmd!("sbom-collector")
            .env_remove("GITHUB_TOKEN")
            .arg("--config")
            .arg(&config)
            .assert()
            .code(3)
            .stderr(predicate::str::contains("GITHUB_TOKEN"));
    }

    /// Exit code 3: Merge with nothing to merge
    #[test]
    fn test_exit_code_empty_candidate_set() {
        let temp_dir = TempDir::new().unwrap();
        let store = temp_dir.path().join("store");
        fs::create_dir_all(store.join("sboms")).unwrap();
        fs::write(store.join("sboms/spdx.json"), r#"{"spdxVersion":"SPDX-2.3"}"#).unwrap();
        let config = temp_dir.path().join("ci.yml");
        fs::write(&config, "storage:\n  local_dir: store\n  prefix: sboms\n").unwrap();

        cargo_bin_cmd!("sbom-collector")
            .current_dir(temp_dir.path())
            .args(["--config", "ci.yml", "--merge"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("sboms/spdx.json: detected format: SPDX"));
    }
}

mod merge_run_tests {
    use super::*;

    /// Exit code 0: merge mode against a local directory store
    #[test]
    fn test_merge_into_local_store() {
        let temp_dir = TempDir::new().unwrap();
        let sboms = temp_dir.path().join("store/sboms");
        write_sbom(&sboms, "repo-a.json", "repoA", "lodash");
        write_sbom(&sboms, "repo-b.json", "repoB", "lodash");
        fs::write(
            temp_dir.path().join("sbom-collector.config.yml"),
            "storage:\n  local_dir: store\n  prefix: sboms\n",
        )
        .unwrap();

        cargo_bin_cmd!("sbom-collector")
            .current_dir(temp_dir.path())
            .arg("--merge")
            .assert()
            .code(0)
            .stderr(predicate::str::contains("Components: 2"));

        let merged: serde_json::Value =
            serde_json::from_slice(&fs::read(sboms.join("merged-sbom.json")).unwrap()).unwrap();
        let sources: Vec<&str> = merged["components"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["source"].as_str().unwrap())
            .collect();
        assert_eq!(sources, vec!["repoA", "repoB"]);

        let metadata: serde_json::Value =
            serde_json::from_slice(&fs::read(sboms.join("merged-sbom.json.meta.json")).unwrap())
                .unwrap();
        assert_eq!(metadata["format"], "cyclonedx");
        assert_eq!(metadata["source"], "merged-sbom");
    }

    /// A second run does not merge its own previous output
    #[test]
    fn test_merge_rerun_is_stable() {
        let temp_dir = TempDir::new().unwrap();
        let sboms = temp_dir.path().join("store/sboms");
        write_sbom(&sboms, "repo-a.json", "repoA", "lodash");
        fs::write(
            temp_dir.path().join("sbom-collector.config.yml"),
            "storage:\n  local_dir: store\n  prefix: sboms\n",
        )
        .unwrap();

        for _ in 0..2 {
            cargo_bin_cmd!("sbom-collector")
                .current_dir(temp_dir.path())
                .arg("--merge")
                .assert()
                .code(0)
                .stderr(predicate::str::contains("Components: 1"));
        }
    }

    /// --include narrows the merge and --output-key moves the output
    #[test]
    fn test_merge_with_include_and_output_key() {
        let temp_dir = TempDir::new().unwrap();
        let sboms = temp_dir.path().join("store/sboms");
        write_sbom(&sboms, "backend.json", "backend", "express");
        write_sbom(&sboms, "frontend.json", "frontend", "react");
        fs::write(
            temp_dir.path().join("sbom-collector.config.yml"),
            "storage:\n  local_dir: store\n  prefix: sboms\n",
        )
        .unwrap();

        cargo_bin_cmd!("sbom-collector")
            .current_dir(temp_dir.path())
            .args([
                "--merge",
                "--include",
                "back*",
                "--output-key",
                "merged/backend.json",
            ])
            .assert()
            .code(0)
            .stderr(predicate::str::contains("Components: 1"));

        assert!(temp_dir.path().join("store/merged/backend.json").exists());
    }
}
