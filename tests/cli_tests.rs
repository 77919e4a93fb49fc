//! CLI integration tests for statesandbox
//!
//! Every test runs in its own temp directory so no local statesandbox.toml
//! or .env leaks in.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const DOCUMENT: &str = "\
# People
## Population Metrics
- Total Population: 5.2 million
- Urbanization Rate: 64%

## Ethnic Composition
- Velorian: 30%
- Marrish: 30%
- Other: 30%

# Economy
## Economic System
A mixed economy: markets with a strong public sector.

## Economic Metrics
- GDP: $2,700,000,000
- Inflation Rate: 3%
";

const EVENTS: &str = "\
# Weather
- 80% No notable events
- 20% Flood

# Markets
- 90% No notable events
- 10% Stock market crash
";

/// Helper to create a statesandbox Command inside `dir`
fn sandbox(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("statesandbox");
    cmd.current_dir(dir.path())
        .env_remove("STATESANDBOX_GENERATOR")
        .env_remove("STATESANDBOX_PORT")
        .env_remove("STATESANDBOX_CLAUDE_CMD")
        .env_remove("RUST_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_help() {
        let dir = TempDir::new().unwrap();
        sandbox(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("serve"))
            .stdout(predicate::str::contains("sample"));
    }

    #[test]
    fn test_version() {
        let dir = TempDir::new().unwrap();
        sandbox(&dir).arg("--version").assert().success();
    }

    #[test]
    fn test_unknown_command_fails() {
        let dir = TempDir::new().unwrap();
        sandbox(&dir).arg("conquer").assert().failure();
    }
}

// =============================================================================
// Document Tools
// =============================================================================

mod document_tools {
    use super::*;

    #[test]
    fn test_parse_prints_typed_tree() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "state.md", DOCUMENT);

        let output = sandbox(&dir).args(["parse", &file]).output().unwrap();
        assert!(output.status.success());
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

        let gdp = &json["economy"]["economic_metrics"]["gdp"];
        assert_eq!(gdp["value"], 2_700_000_000.0);
        assert_eq!(gdp["unit"], "units");
        assert_eq!(json["economy"]["economic_metrics"]["inflation_rate"]["value"], 0.03);
        // Prose sections stay lists
        assert!(json["economy"]["economic_system"].is_array());
        // Compositions are normalized before parsing
        assert_eq!(json["people"]["ethnic_composition"]["velorian"]["raw"], "33.3%");
    }

    #[test]
    fn test_parse_raw_skips_normalization() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "state.md", DOCUMENT);

        let output = sandbox(&dir)
            .args(["parse", &file, "--raw"])
            .output()
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["people"]["ethnic_composition"]["velorian"]["raw"], "30%");
    }

    #[test]
    fn test_parse_with_keys_projects_tree() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "state.md", DOCUMENT);

        let output = sandbox(&dir)
            .args(["parse", &file, "--keys", "economy.economic_metrics.gdp"])
            .output()
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert!(json.get("people").is_none());
        assert!(json["economy"]["economic_metrics"].get("inflation_rate").is_none());
        assert_eq!(json["economy"]["economic_metrics"]["gdp"]["raw"], "$2,700,000,000");
    }

    #[test]
    fn test_parse_check_reports_missing_sections() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "state.md", DOCUMENT);

        sandbox(&dir)
            .args(["parse", &file, "--check"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("missing sections"))
            .stderr(predicate::str::contains("Public Opinion"));
    }

    #[test]
    fn test_parse_missing_file() {
        let dir = TempDir::new().unwrap();
        sandbox(&dir)
            .args(["parse", "nope.md"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to read"));
    }

    #[test]
    fn test_normalize_rescales_compositions() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "comp.md", "# Composition\n- X: 30%\n- Y: 30%\n- Z: 30%");

        sandbox(&dir)
            .args(["normalize", &file])
            .assert()
            .success()
            .stdout(predicate::str::contains("- X: 33.3%\n- Y: 33.3%\n- Z: 33.3%"));
    }

    #[test]
    fn test_sample_once_prints_event_log() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "events.md", EVENTS);

        sandbox(&dir)
            .args(["sample", &file, "--seed", "42"])
            .assert()
            .success()
            .stdout(predicate::str::contains("- Weather: "))
            .stdout(predicate::str::contains("- Markets: "));
    }

    #[test]
    fn test_sample_is_reproducible_with_seed() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "events.md", EVENTS);

        let first = sandbox(&dir)
            .args(["sample", &file, "--seed", "7", "--draws", "500"])
            .output()
            .unwrap();
        let second = sandbox(&dir)
            .args(["sample", &file, "--seed", "7", "--draws", "500"])
            .output()
            .unwrap();
        assert!(first.status.success());
        assert_eq!(first.stdout, second.stdout);
        let stdout = String::from_utf8(first.stdout).unwrap();
        assert!(stdout.contains("Weather (500 draws)"));
        assert!(stdout.contains("(expected 20.00%)"));
    }

    #[test]
    fn test_sample_without_categories_fails() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "events.md", "just some text\n");

        sandbox(&dir)
            .args(["sample", &file])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No event categories"));
    }
}

// =============================================================================
// Schema
// =============================================================================

mod schema {
    use super::*;

    #[test]
    fn test_schema_lists_dimensions() {
        let dir = TempDir::new().unwrap();
        sandbox(&dir)
            .arg("schema")
            .assert()
            .success()
            .stdout(predicate::str::contains("13 dimensions"))
            .stdout(predicate::str::contains("People"))
            .stdout(predicate::str::contains("Public Opinion"));
    }

    #[test]
    fn test_schema_single_dimension_case_insensitive() {
        let dir = TempDir::new().unwrap();
        sandbox(&dir)
            .args(["schema", "--dimension", "economy"])
            .assert()
            .success()
            .stdout(predicate::str::contains("# Economy"))
            .stdout(predicate::str::contains("key: economy"));
    }

    #[test]
    fn test_schema_unknown_dimension() {
        let dir = TempDir::new().unwrap();
        sandbox(&dir)
            .args(["schema", "--dimension", "Astrology"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown dimension"));
    }

    #[test]
    fn test_schema_template() {
        let dir = TempDir::new().unwrap();
        sandbox(&dir)
            .args(["schema", "--template"])
            .assert()
            .success()
            .stdout(predicate::str::contains("# People"))
            .stdout(predicate::str::contains("# Government"));
    }

    #[test]
    fn test_custom_schema_from_config() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "dimensions.toml",
            "[[dimensions]]\ntitle = \"Weather\"\ntemplate = \"- Rainfall: {Number} mm\"\n",
        );
        write(&dir, "statesandbox.toml", "schema_path = \"dimensions.toml\"\n");

        sandbox(&dir)
            .arg("schema")
            .assert()
            .success()
            .stdout(predicate::str::contains("1 dimensions"))
            .stdout(predicate::str::contains("Weather"));
    }
}

// =============================================================================
// Configuration
// =============================================================================

mod configuration {
    use super::*;

    #[test]
    fn test_config_init_then_validate() {
        let dir = TempDir::new().unwrap();

        sandbox(&dir)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created statesandbox.toml"));
        assert!(dir.path().join("statesandbox.toml").exists());

        sandbox(&dir)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));

        sandbox(&dir)
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration is valid."));
    }

    #[test]
    fn test_config_validate_reports_warnings() {
        let dir = TempDir::new().unwrap();
        write(&dir, "statesandbox.toml", "[turn]\nmax_policy_chars = 0\n");

        sandbox(&dir)
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration warnings:"))
            .stdout(predicate::str::contains("max_policy_chars"));
    }

    #[test]
    fn test_zero_period_months_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(&dir, "statesandbox.toml", "[turn]\nperiod_months = 0\n");

        sandbox(&dir)
            .args(["config", "validate"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("period_months must be greater than 0"));
        sandbox(&dir).arg("schema").assert().failure();
    }

    #[test]
    fn test_config_show_defaults() {
        let dir = TempDir::new().unwrap();
        sandbox(&dir)
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("using defaults"))
            .stdout(predicate::str::contains("[generator]"))
            .stdout(predicate::str::contains("listen = 127.0.0.1:8000"));
    }

    #[test]
    fn test_invalid_config_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, "statesandbox.toml", "[turn\nbroken");

        sandbox(&dir).arg("schema").assert().failure();
    }

    #[test]
    fn test_explicit_config_path() {
        let dir = TempDir::new().unwrap();
        write(&dir, "custom.toml", "[server]\nport = 9100\n");

        sandbox(&dir)
            .args(["--config", "custom.toml", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("listen = 127.0.0.1:9100"));
    }
}
