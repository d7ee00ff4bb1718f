//! Shared helpers for `depfence` binary tests.

use assert_cmd::cargo::cargo_bin_cmd;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

/// Default timeout for CLI tests.
pub const TIMEOUT_BASIC: Duration = Duration::from_secs(10);

/// Variables that would leak the caller's setup into a test run.
const DEPFENCE_VARS: &[&str] = &["RUST_LOG", "DEPFENCE_GO", "DEPFENCE_WORKING_PACKAGE"];

/// Build a Command for the `depfence` binary running inside `dir`.
pub fn depfence_cmd(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd: assert_cmd::Command = cargo_bin_cmd!("depfence");
    cmd.timeout(TIMEOUT_BASIC).current_dir(dir.path());
    for var in DEPFENCE_VARS {
        cmd.env_remove(var);
    }
    cmd
}

pub fn write_rules(dir: &TempDir, name: &str, content: &str) {
    fs::write(dir.path().join(name), content).expect("write rule file");
}

/// `go list -json` stand-in for a module `acme/app`:
///
/// ```text
/// acme/app -> acme/app/core, fmt
/// acme/app/core -> fmt
/// ```
#[cfg(unix)]
const FAKE_GO: &str = r#"#!/bin/sh
case "$3" in
  .) echo '{"ImportPath":"acme/app","Imports":["acme/app/core","fmt"]}' ;;
  acme/app/core) echo '{"ImportPath":"acme/app/core","Imports":["fmt"]}' ;;
  fmt) echo '{"ImportPath":"fmt","Goroot":true,"Standard":true}' ;;
  *) echo "cannot find package \"$3\"" >&2; exit 1 ;;
esac
"#;

/// Writes an executable fake `go` into `dir` and returns its path.
#[cfg(unix)]
pub fn install_fake_go(dir: &TempDir) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.path().join("fake-go");
    fs::write(&path, FAKE_GO).expect("write fake go");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake go");
    path
}
