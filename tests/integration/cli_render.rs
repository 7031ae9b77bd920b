//! End-to-end checks of the `querywire` binary.

use std::io::Write;

use assert_cmd::Command;
use tempfile::TempPath;

/// Isolated invocation; the config file lives as long as the returned path.
struct Cli {
    cmd: Command,
    _config: TempPath,
}

impl std::ops::Deref for Cli {
    type Target = Command;

    fn deref(&self) -> &Command {
        &self.cmd
    }
}

impl std::ops::DerefMut for Cli {
    fn deref_mut(&mut self) -> &mut Command {
        &mut self.cmd
    }
}

fn querywire() -> Cli {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "endpoint = \"http://api.example.com/v1\"\ntimeout_ms = 2000").unwrap();
    let config = config.into_temp_path();
    let mut cmd = Command::cargo_bin("querywire").unwrap();
    cmd.env("QUERYWIRE_CONFIG", &config)
        .env_remove("QUERYWIRE_ENDPOINT")
        .env_remove("RUST_LOG");
    Cli {
        cmd,
        _config: config,
    }
}

#[test]
fn renders_each_stage() {
    querywire()
        .args(["render", "--table", "OreOre"])
        .assert()
        .success()
        .stdout("SELECT * FROM [OreOre]\n");
    querywire()
        .args(["render", "--table", "OreOre", "--where", "ID == 123"])
        .assert()
        .success()
        .stdout("SELECT * FROM OreOre WHERE (ID == 123)\n");
    querywire()
        .args([
            "render", "--table", "OreOre", "--where", "ID == 123", "--select", "ID,Name",
        ])
        .assert()
        .success()
        .stdout("SELECT ID,Name FROM [OreOre] WHERE (ID == 123)\n");
}

#[test]
fn renders_json_output() {
    querywire()
        .args(["--format", "json", "render", "--table", "T", "--where", "a > 1"])
        .assert()
        .success()
        .stdout("{\"query\":\"SELECT * FROM T WHERE (a > 1)\"}\n");
}

#[test]
fn select_requires_where() {
    querywire()
        .args(["render", "--table", "OreOre", "--select", "ID"])
        .assert()
        .failure();
}

#[test]
fn literal_projection_is_rejected_with_code() {
    let output = querywire()
        .args(["render", "--table", "T", "--where", "a == 1", "--select", "a,1"])
        .assert()
        .failure()
        .get_output()
        .clone();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("[UnsupportedProjection] unsupported projection at position 1: literal"),
        "{stderr}"
    );
}

#[test]
fn bad_predicate_is_rejected_with_code() {
    let output = querywire()
        .args(["render", "--table", "T", "--where", "a = 1"])
        .assert()
        .failure()
        .get_output()
        .clone();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[InvalidPredicate]"), "{stderr}");
}

#[test]
fn fetch_rejects_projection_before_any_request() {
    let output = querywire()
        .args(["fetch", "--table", "T", "--where", "a == 1", "--select", "a,b * 2"])
        .assert()
        .failure()
        .get_output()
        .clone();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("[UnsupportedProjection] unsupported projection at position 1: arithmetic"),
        "{stderr}"
    );
}

#[test]
fn invalid_endpoint_override_is_a_config_error() {
    let output = querywire()
        .args(["--endpoint", "not a url", "render", "--table", "T"])
        .assert()
        .failure()
        .get_output()
        .clone();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[Config] invalid endpoint 'not a url'"), "{stderr}");
}
