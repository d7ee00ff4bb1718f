//! CLI tests for the `depfence` binary.
//!
//! Package resolution is served by a shell stand-in for `go`, so no Go
//! toolchain is needed.

mod common;

use common::{depfence_cmd as depfence, write_rules};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::fs;
use tempfile::TempDir;

// ─── init ──────────────────────────────────────────────────────────

#[test]
fn init_writes_starter_config() {
    let dir = TempDir::new().expect("tempdir");
    depfence(&dir)
        .arg("init")
        .assert()
        .success()
        .stderr(contains("Created depfence.toml"));

    let written = fs::read_to_string(dir.path().join("depfence.toml")).expect("file written");
    assert!(written.contains("working_package"));
}

#[test]
fn init_refuses_to_overwrite() {
    let dir = TempDir::new().expect("tempdir");
    write_rules(&dir, "depfence.toml", "# mine\n");
    depfence(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(contains("already exists"));

    let kept = fs::read_to_string(dir.path().join("depfence.toml")).expect("file kept");
    assert_eq!(kept, "# mine\n");
}

// ─── list-rules ────────────────────────────────────────────────────

#[test]
fn list_rules_prints_compiled_rules() {
    let dir = TempDir::new().expect("tempdir");
    write_rules(
        &dir,
        "rules.yaml",
        "options:\n  working_package: github.com/acme/app\nrules:\n  - name: pure domain\n    packages: domain/.*\n    may_depend: ['<.*>']\n    expected: ['domain/a -> util']\n",
    );
    depfence(&dir)
        .args(["list-rules", "--config", "rules.yaml"])
        .assert()
        .success()
        .stdout(contains("working package: github.com/acme/app"))
        .stdout(contains("pure domain"))
        .stdout(contains("may depend: <.*>"))
        .stdout(contains(
            "expected:   github.com/acme/app/domain/a -> github.com/acme/app/util",
        ));
}

// ─── check: configuration errors ──────────────────────────────────

#[test]
fn check_without_rule_file_fails() {
    let dir = TempDir::new().expect("tempdir");
    depfence(&dir)
        .arg("check")
        .assert()
        .code(2)
        .stderr(contains("CONFIG_IO").and(contains("depfence.toml")));
}

#[test]
fn check_rejects_malformed_expectation() {
    let dir = TempDir::new().expect("tempdir");
    write_rules(
        &dir,
        "depfence.toml",
        "[options]\nworking_package = \"acme\"\n[[rules]]\nname = \"r\"\npackages = \".*\"\nexpected = [\"a -> b -> c\"]\n",
    );
    depfence(&dir)
        .arg("check")
        .assert()
        .code(2)
        .stderr(contains("CONFIG_MALFORMED_EXPECTATION"))
        .stderr(contains("a -> b -> c"));
}

#[test]
fn check_rejects_trailing_slash_prefix() {
    let dir = TempDir::new().expect("tempdir");
    write_rules(&dir, "depfence.toml", "[options]\nworking_package = \"acme/\"\n");
    depfence(&dir)
        .arg("check")
        .assert()
        .code(2)
        .stderr(contains("CONFIG_MALFORMED_WORKING_PACKAGE"));
}

#[test]
fn check_reports_unresolvable_toolchain() {
    let dir = TempDir::new().expect("tempdir");
    write_rules(&dir, "depfence.toml", "[options]\nworking_package = \"acme\"\n");
    depfence(&dir)
        .args(["check", "--go", "/nonexistent/depfence-test-go"])
        .assert()
        .code(2)
        .stderr(contains("RESOLVE_SPAWN"));
}

#[test]
fn go_binary_from_environment() {
    let dir = TempDir::new().expect("tempdir");
    write_rules(&dir, "depfence.toml", "[options]\nworking_package = \"acme\"\n");
    depfence(&dir)
        .env("DEPFENCE_GO", "/nonexistent/env-go")
        .arg("check")
        .assert()
        .code(2)
        .stderr(contains("/nonexistent/env-go"));
}

// ─── check: full runs ──────────────────────────────────────────────

#[cfg(unix)]
mod full_run {
    use super::*;
    use common::install_fake_go;

    const VIOLATING: &str = "[options]\nworking_package = \"acme/app\"\n\n[[rules]]\nname = \"core is a leaf\"\npackages = \"core\"\n";

    const CLEAN: &str = "[options]\nworking_package = \"acme/app\"\n\n[[rules]]\nname = \"core uses the standard library\"\npackages = \"core\"\nmay_depend = [\"<.*>\"]\n";

    #[test]
    fn violations_exit_one() {
        let dir = TempDir::new().expect("tempdir");
        write_rules(&dir, "depfence.toml", VIOLATING);
        let go = install_fake_go(&dir);

        depfence(&dir)
            .arg("check")
            .arg("--go")
            .arg(&go)
            .assert()
            .code(1)
            .stdout(contains("core is a leaf\n- disallowed acme/app/core -> fmt\n"))
            .stderr(contains("1 violation(s) in 1 of 1 rule(s), 3 package(s) checked"));
    }

    #[test]
    fn clean_run_exits_zero() {
        let dir = TempDir::new().expect("tempdir");
        write_rules(&dir, "depfence.toml", CLEAN);
        let go = install_fake_go(&dir);

        depfence(&dir)
            .env("DEPFENCE_GO", &go)
            .arg("check")
            .assert()
            .success()
            .stdout(contains("disallowed").not());
    }

    #[test]
    fn json_format_emits_tagged_violations() {
        let dir = TempDir::new().expect("tempdir");
        write_rules(&dir, "depfence.toml", VIOLATING);
        let go = install_fake_go(&dir);

        let output = depfence(&dir)
            .args(["check", "--format", "json", "--go"])
            .arg(&go)
            .output()
            .expect("run depfence");
        assert_eq!(output.status.code(), Some(1));

        let json: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("stdout is JSON");
        assert_eq!(json["packages_checked"], 3);
        let violation = &json["reports"][0]["violations"][0];
        assert_eq!(violation["kind"], "disallowed");
        assert_eq!(violation["package"], "acme/app/core");
        assert_eq!(violation["dependency"], "fmt");
    }

    #[test]
    fn unknown_rule_filter_fails() {
        let dir = TempDir::new().expect("tempdir");
        write_rules(&dir, "depfence.toml", VIOLATING);
        let go = install_fake_go(&dir);

        depfence(&dir)
            .args(["check", "--rule", "nope", "--go"])
            .arg(&go)
            .assert()
            .code(2)
            .stderr(contains("CONFIG_UNKNOWN_RULE"));
    }
}
